use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{TastingNoteCreate, TastingNoteUpdate};
use super::repo_types::{BottleNoteStats, NoteStatistics, TastingNote};
use crate::bottles::repo::VISIBLE_BOTTLE;
use crate::bottles::repo_types::SpiritType;
use crate::db::PatchBuilder;
use crate::extract::Pagination;
use crate::search::repo::round2;

const NOTE_COLUMNS: &str = "id, bottle_id, user_id, nose, palate, finish, overall_notes, rating, \
     tasted_date, created_at, updated_at";

impl TastingNote {
    pub async fn create(
        db: &PgPool,
        bottle_id: Uuid,
        author: Uuid,
        input: &TastingNoteCreate,
    ) -> anyhow::Result<TastingNote> {
        let sql = format!(
            "INSERT INTO tasting_notes \
             (id, bottle_id, user_id, nose, palate, finish, overall_notes, rating, tasted_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {NOTE_COLUMNS}"
        );
        let note = sqlx::query_as::<_, TastingNote>(&sql)
            .bind(Uuid::new_v4())
            .bind(bottle_id)
            .bind(author)
            .bind(input.nose.as_deref())
            .bind(input.palate.as_deref())
            .bind(input.finish.as_deref())
            .bind(input.overall_notes.as_deref())
            .bind(input.rating)
            .bind(input.tasted_date)
            .fetch_one(db)
            .await
            .context("insert tasting note")?;
        Ok(note)
    }

    pub async fn find_authored(
        db: &PgPool,
        id: Uuid,
        author: Uuid,
    ) -> anyhow::Result<Option<TastingNote>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM tasting_notes WHERE id = $1 AND user_id = $2");
        let note = sqlx::query_as::<_, TastingNote>(&sql)
            .bind(id)
            .bind(author)
            .fetch_optional(db)
            .await
            .context("find tasting note")?;
        Ok(note)
    }

    /// The author's notes on one bottle, newest first.
    pub async fn list_for_bottle(
        db: &PgPool,
        bottle_id: Uuid,
        author: Uuid,
        page: Pagination,
    ) -> anyhow::Result<Vec<TastingNote>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM tasting_notes WHERE bottle_id = $1 AND user_id = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, TastingNote>(&sql)
            .bind(bottle_id)
            .bind(author)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(db)
            .await
            .context("list bottle tasting notes")?;
        Ok(rows)
    }

    /// Public listing of a user's notes on bottles that are still visible.
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        page: Pagination,
    ) -> anyhow::Result<Vec<TastingNote>> {
        let sql = format!(
            "SELECT tn.id, tn.bottle_id, tn.user_id, tn.nose, tn.palate, tn.finish, \
             tn.overall_notes, tn.rating, tn.tasted_date, tn.created_at, tn.updated_at \
             FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1 \
             ORDER BY tn.created_at DESC, tn.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, TastingNote>(&sql)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(db)
            .await
            .context("list user tasting notes")?;
        Ok(rows)
    }

    /// Every note by `author` on a still-visible bottle.
    pub async fn list_visible_by_author(
        db: &PgPool,
        author: Uuid,
    ) -> anyhow::Result<Vec<TastingNote>> {
        let sql = format!(
            "SELECT tn.id, tn.bottle_id, tn.user_id, tn.nose, tn.palate, tn.finish, \
             tn.overall_notes, tn.rating, tn.tasted_date, tn.created_at, tn.updated_at \
             FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1"
        );
        let rows = sqlx::query_as::<_, TastingNote>(&sql)
            .bind(author)
            .fetch_all(db)
            .await
            .context("list author tasting notes")?;
        Ok(rows)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        author: Uuid,
        patch: TastingNoteUpdate,
    ) -> anyhow::Result<Option<TastingNote>> {
        let mut p = PatchBuilder::new("tasting_notes");
        p.set_if("nose", patch.nose)
            .set_if("palate", patch.palate)
            .set_if("finish", patch.finish)
            .set_if("overall_notes", patch.overall_notes)
            .set_if("rating", patch.rating)
            .set_if("tasted_date", patch.tasted_date);
        let mut qb = p.where_id(id);
        qb.push(" AND user_id = ").push_bind(author);
        qb.push(" RETURNING ").push(NOTE_COLUMNS);
        let note = qb
            .build_query_as::<TastingNote>()
            .fetch_optional(db)
            .await
            .context("update tasting note")?;
        Ok(note)
    }

    pub async fn delete(db: &PgPool, id: Uuid, author: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM tasting_notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(author)
            .execute(db)
            .await
            .context("delete tasting note")?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn author_statistics(db: &PgPool, author: Uuid) -> anyhow::Result<NoteStatistics> {
        let (total_notes, average_rating): (i64, Option<f64>) = sqlx::query_as(&format!(
            "SELECT COUNT(tn.id), AVG(tn.rating)::float8 \
             FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1"
        ))
        .bind(author)
        .fetch_one(db)
        .await
        .context("tasting note totals")?;

        let top: Option<(SpiritType, i64)> = sqlx::query_as(&format!(
            "SELECT b.spirit_type, COUNT(*) AS n \
             FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1 \
             GROUP BY b.spirit_type ORDER BY n DESC, b.spirit_type LIMIT 1"
        ))
        .bind(author)
        .fetch_optional(db)
        .await
        .context("most tasted spirit")?;

        Ok(NoteStatistics {
            total_notes,
            average_rating: average_rating.map(round2),
            most_tasted_spirit: top.map(|(s, _)| s),
            most_tasted_count: top.map(|(_, n)| n).unwrap_or(0),
        })
    }

    pub async fn bottle_stats(db: &PgPool, bottle_id: Uuid) -> anyhow::Result<BottleNoteStats> {
        let (total, average_rating): (i64, Option<f64>) = sqlx::query_as(&format!(
            "SELECT COUNT(tn.id), AVG(tn.rating)::float8 \
             FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND tn.bottle_id = $1"
        ))
        .bind(bottle_id)
        .fetch_one(db)
        .await
        .context("bottle tasting stats")?;

        Ok(BottleNoteStats {
            bottle_id,
            average_rating: average_rating.map(round2),
            total_tasting_notes: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bottles::{dto::BottleCreate, repo_types::Bottle};

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn stats_follow_notes(db: PgPool) {
        let author = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ($1, 'taster', 't@example.com', 'x')")
            .bind(author)
            .execute(&db)
            .await
            .unwrap();
        let input: BottleCreate =
            serde_json::from_value(serde_json::json!({ "name": "Havana 7", "spirit_type": "rum" }))
                .unwrap();
        let bottle = Bottle::create(&db, author, &input).await.unwrap();

        for rating in [3, 4, 5] {
            let note = TastingNoteCreate {
                rating: Some(rating),
                ..Default::default()
            };
            TastingNote::create(&db, bottle.id, author, &note).await.unwrap();
        }

        let stats = TastingNote::bottle_stats(&db, bottle.id).await.unwrap();
        assert_eq!(stats.total_tasting_notes, 3);
        assert_eq!(stats.average_rating, Some(4.0));

        let mine = TastingNote::author_statistics(&db, author).await.unwrap();
        assert_eq!(mine.total_notes, 3);
        assert_eq!(mine.most_tasted_spirit, Some(SpiritType::Rum));
        assert_eq!(mine.most_tasted_count, 3);

        let none = TastingNote::list_by_user(&db, Uuid::new_v4(), Pagination::default())
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
