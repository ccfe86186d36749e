use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::analysis::{descriptor_frequencies, rating_distribution};
use super::dto::{FlavorProfile, ReviewSummary, SpiritTaste, TopNote};
use crate::bottles::repo::VISIBLE_BOTTLE;
use crate::bottles::repo_types::BottleSummary;
use crate::search::repo::round2;
use crate::tasting_notes::repo_types::TastingNote;

pub async fn review_summary(db: &PgPool, bottle_id: Uuid) -> anyhow::Result<ReviewSummary> {
    let (total_ratings, average_rating): (i64, Option<f64>) = sqlx::query_as(&format!(
        "SELECT COUNT(tn.id), AVG(tn.rating)::float8 \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.bottle_id = $1"
    ))
    .bind(bottle_id)
    .fetch_one(db)
    .await
    .context("review totals")?;

    let buckets: Vec<(i32, i64)> = sqlx::query_as(&format!(
        "SELECT tn.rating, COUNT(*) \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.bottle_id = $1 AND tn.rating IS NOT NULL \
         GROUP BY tn.rating"
    ))
    .bind(bottle_id)
    .fetch_all(db)
    .await
    .context("rating distribution")?;

    let top_tasting_notes = sqlx::query_as::<_, TopNote>(&format!(
        "SELECT tn.id, tn.user_id, tn.nose, tn.palate, tn.finish, tn.rating, tn.created_at \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.bottle_id = $1 AND tn.rating IS NOT NULL \
         ORDER BY tn.rating DESC, tn.created_at DESC, tn.id \
         LIMIT 3"
    ))
    .bind(bottle_id)
    .fetch_all(db)
    .await
    .context("top tasting notes")?;

    Ok(ReviewSummary {
        bottle_id,
        average_rating: average_rating.map(round2),
        total_ratings,
        rating_distribution: rating_distribution(&buckets),
        top_tasting_notes,
    })
}

pub async fn flavor_profile(db: &PgPool, user_id: Uuid) -> anyhow::Result<FlavorProfile> {
    let average_rating: Option<f64> = sqlx::query_scalar(&format!(
        "SELECT AVG(tn.rating)::float8 \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1 AND tn.rating IS NOT NULL"
    ))
    .bind(user_id)
    .fetch_one(db)
    .await
    .context("average rating given")?;

    let most_tasted_spirits = sqlx::query_as::<_, SpiritTaste>(&format!(
        "SELECT b.spirit_type, COUNT(tn.id) AS count, AVG(tn.rating)::float8 AS average_rating \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1 AND tn.rating IS NOT NULL \
         GROUP BY b.spirit_type \
         ORDER BY count DESC, b.spirit_type \
         LIMIT 5"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("most tasted spirits")?;

    let texts: Vec<String> = TastingNote::list_visible_by_author(db, user_id)
        .await?
        .iter()
        .map(TastingNote::sensory_text)
        .collect();

    Ok(FlavorProfile {
        user_id,
        average_rating: average_rating.map(round2),
        most_tasted_spirits,
        flavor_preferences: descriptor_frequencies(texts.iter().map(String::as_str)),
    })
}

/// Highly rated bottles when there is no tasting history, otherwise decently
/// rated bottles in the categories the user has already tasted.
pub async fn recommendations(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<BottleSummary>> {
    let tasted: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT DISTINCT b.spirit_type \
         FROM tasting_notes tn JOIN bottles b ON b.id = tn.bottle_id \
         WHERE {VISIBLE_BOTTLE} AND tn.user_id = $1"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("tasted categories")?;

    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT b.id, b.name, b.spirit_type, b.distillery, b.rating FROM bottles b WHERE ",
    );
    qb.push(VISIBLE_BOTTLE);
    if tasted.is_empty() {
        qb.push(" AND b.rating >= 4");
    } else {
        qb.push(" AND b.rating >= 3 AND b.spirit_type = ANY(")
            .push_bind(tasted)
            .push(")");
    }
    qb.push(" ORDER BY b.rating DESC, b.created_at DESC, b.id LIMIT ")
        .push_bind(limit);

    let rows = qb
        .build_query_as::<BottleSummary>()
        .fetch_all(db)
        .await
        .context("recommended bottles")?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bottles::{dto::BottleCreate, repo_types::Bottle};
    use crate::tasting_notes::dto::TastingNoteCreate;

    async fn user(db: &PgPool, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, 'x')")
            .bind(id)
            .bind(name)
            .bind(format!("{name}@example.com"))
            .execute(db)
            .await
            .unwrap();
        id
    }

    async fn bottle(db: &PgPool, owner: Uuid, spirit: &str, rating: i32) -> Bottle {
        let input: BottleCreate = serde_json::from_value(serde_json::json!({
            "name": format!("{spirit} {rating}"),
            "spirit_type": spirit,
            "rating": rating,
        }))
        .unwrap();
        Bottle::create(db, owner, &input).await.unwrap()
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn recommendations_follow_history(db: PgPool) {
        let owner = user(&db, "cellar").await;
        let gin3 = bottle(&db, owner, "gin", 3).await;
        bottle(&db, owner, "rum", 5).await;
        bottle(&db, owner, "rum", 3).await;

        let fresh = user(&db, "fresh").await;
        let recs = recommendations(&db, fresh, 10).await.unwrap();
        assert!(recs.iter().all(|b| b.rating.unwrap_or(0) >= 4));
        assert_eq!(recs.len(), 1);

        TastingNote::create(&db, gin3.id, fresh, &TastingNoteCreate::default())
            .await
            .unwrap();
        let recs = recommendations(&db, fresh, 10).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, gin3.id);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn summary_of_unreviewed_bottle(db: PgPool) {
        let owner = user(&db, "solo").await;
        let b = bottle(&db, owner, "vodka", 2).await;
        let s = review_summary(&db, b.id).await.unwrap();
        assert_eq!(s.total_ratings, 0);
        assert!(s.average_rating.is_none());
        assert_eq!(s.rating_distribution.values().sum::<i64>(), 0);
        assert!(s.top_tasting_notes.is_empty());
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn deleted_bottle_leaves_every_note_aggregate(db: PgPool) {
        let owner = user(&db, "taster").await;
        let gin = bottle(&db, owner, "gin", 4).await;
        let rum = bottle(&db, owner, "rum", 5).await;
        for rating in [4, 5] {
            let note = TastingNoteCreate {
                nose: Some("juniper, citrus".into()),
                rating: Some(rating),
                ..Default::default()
            };
            TastingNote::create(&db, gin.id, owner, &note).await.unwrap();
        }

        let before = flavor_profile(&db, owner).await.unwrap();
        assert_eq!(before.average_rating, Some(4.5));
        assert_eq!(before.most_tasted_spirits.len(), 1);
        assert_eq!(before.flavor_preferences[0].descriptor, "citrus");

        assert!(Bottle::soft_delete(&db, gin.id, owner).await.unwrap());

        let stats = TastingNote::author_statistics(&db, owner).await.unwrap();
        assert_eq!(stats.total_notes, 0);
        assert!(stats.average_rating.is_none());
        assert!(stats.most_tasted_spirit.is_none());
        assert_eq!(stats.most_tasted_count, 0);

        let after = flavor_profile(&db, owner).await.unwrap();
        assert!(after.average_rating.is_none());
        assert!(after.most_tasted_spirits.is_empty());
        assert!(after.flavor_preferences.is_empty());

        // no visible history left, so the rating >= 4 fallback applies
        let recs = recommendations(&db, owner, 10).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, rum.id);
    }
}
