use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::bottles::repo_types::SpiritType;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TastingNote {
    pub id: Uuid,
    pub bottle_id: Uuid,
    pub user_id: Uuid,
    pub nose: Option<String>,
    pub palate: Option<String>,
    pub finish: Option<String>,
    pub overall_notes: Option<String>,
    pub rating: Option<i32>,
    pub tasted_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TastingNote {
    /// Nose, palate and finish joined for descriptor matching.
    pub fn sensory_text(&self) -> String {
        [&self.nose, &self.palate, &self.finish]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Serialize)]
pub struct NoteStatistics {
    pub total_notes: i64,
    pub average_rating: Option<f64>,
    pub most_tasted_spirit: Option<SpiritType>,
    pub most_tasted_count: i64,
}

#[derive(Debug, Serialize)]
pub struct BottleNoteStats {
    pub bottle_id: Uuid,
    pub average_rating: Option<f64>,
    pub total_tasting_notes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensory_text_skips_missing_parts() {
        let now = OffsetDateTime::now_utc();
        let note = TastingNote {
            id: Uuid::nil(),
            bottle_id: Uuid::nil(),
            user_id: Uuid::nil(),
            nose: Some("Vanilla".into()),
            palate: None,
            finish: Some("long, smoky".into()),
            overall_notes: Some("ignored".into()),
            rating: Some(4),
            tasted_date: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(note.sensory_text(), "Vanilla long, smoky");
    }
}
