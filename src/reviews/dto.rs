use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::bottles::repo_types::SpiritType;
use crate::error::ApiError;
use crate::extract::{check_opt_range, Validate};

#[derive(Debug, Serialize, FromRow)]
pub struct TopNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nose: Option<String>,
    pub palate: Option<String>,
    pub finish: Option<String>,
    pub rating: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ReviewSummary {
    pub bottle_id: Uuid,
    pub average_rating: Option<f64>,
    pub total_ratings: i64,
    pub rating_distribution: BTreeMap<i32, i64>,
    pub top_tasting_notes: Vec<TopNote>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SpiritTaste {
    pub spirit_type: SpiritType,
    pub count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DescriptorCount {
    pub descriptor: &'static str,
    pub frequency: i64,
}

#[derive(Debug, Serialize)]
pub struct FlavorProfile {
    pub user_id: Uuid,
    pub average_rating: Option<f64>,
    pub most_tasted_spirits: Vec<SpiritTaste>,
    pub flavor_preferences: Vec<DescriptorCount>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<i64>,
}

impl Validate for RecommendationQuery {
    fn validate(&self) -> Result<(), ApiError> {
        check_opt_range("limit", self.limit, 1, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_serializes_with_string_keys() {
        let summary = ReviewSummary {
            bottle_id: Uuid::nil(),
            average_rating: None,
            total_ratings: 0,
            rating_distribution: crate::reviews::analysis::rating_distribution(&[(4, 2)]),
            top_tasting_notes: vec![],
        };
        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["rating_distribution"]["4"], 2);
        assert_eq!(v["rating_distribution"]["1"], 0);
    }
}
