use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::dto::{BottleCreate, BottleUpdate, OwnerListQuery};
use super::repo_types::Bottle;
use crate::db::PatchBuilder;
use crate::extract::Pagination;

/// Every bottle read goes through this predicate; bottles are aliased `b`.
pub(crate) const VISIBLE_BOTTLE: &str = "b.deleted_at IS NULL";

pub(crate) const BOTTLE_COLUMNS: &str = "b.id, b.user_id, b.name, b.spirit_type, b.distillery, \
     b.proof, b.age_statement, b.region, b.country, b.release_year, b.batch_number, \
     b.price_paid, b.price_current, b.acquisition_date, b.notes, b.rating, b.image_url, \
     b.ai_details, b.created_at, b.updated_at, b.deleted_at";

const RETURNING_COLUMNS: &str = " RETURNING id, user_id, name, spirit_type, distillery, proof, \
     age_statement, region, country, release_year, batch_number, price_paid, price_current, \
     acquisition_date, notes, rating, image_url, ai_details, created_at, updated_at, deleted_at";

/// `SELECT <bottle columns> FROM bottles b WHERE b.deleted_at IS NULL`; callers
/// append further conditions with ` AND ...`.
pub(crate) fn select_visible<'a>() -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOTTLE_COLUMNS} FROM bottles b WHERE "));
    qb.push(VISIBLE_BOTTLE);
    qb
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Pagination) {
    qb.push(" LIMIT ").push_bind(page.limit);
    qb.push(" OFFSET ").push_bind(page.skip);
}

fn money(v: Option<Decimal>) -> Option<Decimal> {
    v.map(|d| d.round_dp(2))
}

impl Bottle {
    pub async fn create(db: &PgPool, owner: Uuid, input: &BottleCreate) -> anyhow::Result<Bottle> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO bottles (id, user_id, name, spirit_type, distillery, proof, age_statement, \
             region, country, release_year, batch_number, price_paid, price_current, \
             acquisition_date, notes, rating, image_url) ",
        );
        qb.push_values(std::iter::once(input), |mut row, b| {
            row.push_bind(Uuid::new_v4())
                .push_bind(owner)
                .push_bind(b.name.trim().to_string())
                .push_bind(b.spirit_type)
                .push_bind(b.distillery.clone())
                .push_bind(b.proof)
                .push_bind(b.age_statement.clone())
                .push_bind(b.region.clone())
                .push_bind(b.country.clone())
                .push_bind(b.release_year)
                .push_bind(b.batch_number.clone())
                .push_bind(money(b.price_paid))
                .push_bind(money(b.price_current))
                .push_bind(b.acquisition_date)
                .push_bind(b.notes.clone())
                .push_bind(b.rating)
                .push_bind(b.image_url.clone());
        });
        qb.push(RETURNING_COLUMNS);

        let bottle = qb
            .build_query_as::<Bottle>()
            .fetch_one(db)
            .await
            .context("insert bottle")?;
        Ok(bottle)
    }

    /// A bottle the owner can see: exists, theirs, not soft-deleted.
    pub async fn find_owned(db: &PgPool, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Bottle>> {
        let mut qb = select_visible();
        qb.push(" AND b.id = ").push_bind(id);
        qb.push(" AND b.user_id = ").push_bind(owner);
        let bottle = qb
            .build_query_as::<Bottle>()
            .fetch_optional(db)
            .await
            .context("find owned bottle")?;
        Ok(bottle)
    }

    pub async fn list_owned(
        db: &PgPool,
        owner: Uuid,
        query: &OwnerListQuery,
        page: Pagination,
    ) -> anyhow::Result<Vec<Bottle>> {
        let mut qb = select_visible();
        qb.push(" AND b.user_id = ").push_bind(owner);
        if let Some(t) = query.spirit_type {
            qb.push(" AND b.spirit_type = ").push_bind(t);
        }
        if let Some(r) = query.min_rating {
            qb.push(" AND b.rating >= ").push_bind(r);
        }
        qb.push(" ORDER BY b.created_at DESC, b.id DESC");
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<Bottle>()
            .fetch_all(db)
            .await
            .context("list owned bottles")?;
        Ok(rows)
    }

    /// Merge-patch update. `None` when the bottle is missing, foreign or deleted.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        owner: Uuid,
        patch: BottleUpdate,
    ) -> anyhow::Result<Option<Bottle>> {
        let mut p = PatchBuilder::new("bottles");
        p.set_if("name", patch.name.flatten().map(|n| n.trim().to_string()))
            .set_if("spirit_type", patch.spirit_type.flatten())
            .set_if("distillery", patch.distillery)
            .set_if("proof", patch.proof)
            .set_if("age_statement", patch.age_statement)
            .set_if("region", patch.region)
            .set_if("country", patch.country)
            .set_if("release_year", patch.release_year)
            .set_if("batch_number", patch.batch_number)
            .set_if("price_paid", patch.price_paid.map(money))
            .set_if("price_current", patch.price_current.map(money))
            .set_if("acquisition_date", patch.acquisition_date)
            .set_if("notes", patch.notes)
            .set_if("rating", patch.rating)
            .set_if("image_url", patch.image_url);

        let mut qb = p.where_id(id);
        qb.push(" AND user_id = ").push_bind(owner);
        qb.push(" AND deleted_at IS NULL");
        qb.push(RETURNING_COLUMNS);

        let bottle = qb
            .build_query_as::<Bottle>()
            .fetch_optional(db)
            .await
            .context("update bottle")?;
        Ok(bottle)
    }

    /// Marks the bottle deleted. `false` if it was not visible to the owner.
    pub async fn soft_delete(db: &PgPool, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE bottles
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(db)
        .await
        .context("soft delete bottle")?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn set_ai_details(
        db: &PgPool,
        id: Uuid,
        details: serde_json::Value,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE bottles
               SET ai_details = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(details)
        .execute(db)
        .await
        .context("store bottle ai details")?;
        Ok(res.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bottles::repo_types::SpiritType;

    #[test]
    fn visible_select_always_filters_deleted() {
        let qb = select_visible();
        assert!(qb.sql().ends_with("FROM bottles b WHERE b.deleted_at IS NULL"));
    }

    #[test]
    fn page_is_appended_as_binds() {
        let mut qb = select_visible();
        qb.push(" AND b.spirit_type = ").push_bind(SpiritType::Rum);
        push_page(&mut qb, Pagination { skip: 5, limit: 5 });
        assert!(qb
            .sql()
            .ends_with("AND b.spirit_type = $1 LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn money_rounds_to_cents() {
        let v = money(Some(Decimal::new(129999, 3))); // 129.999
        assert_eq!(v, Some(Decimal::new(13000, 2)));
        assert_eq!(money(None), None);
    }

    async fn seed_owner(db: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ($1, 'keeper', 'k@example.com', 'x')")
            .bind(id)
            .execute(db)
            .await
            .unwrap();
        id
    }

    fn input(v: serde_json::Value) -> BottleCreate {
        serde_json::from_value(v).unwrap()
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn update_touches_only_supplied_fields(db: PgPool) {
        let owner = seed_owner(&db).await;
        let bottle = Bottle::create(
            &db,
            owner,
            &input(serde_json::json!({
                "name": "Springbank 10",
                "spirit_type": "whiskey",
                "distillery": "Springbank",
                "region": "Campbeltown",
                "price_paid": 74.5,
            })),
        )
        .await
        .unwrap();

        let patch: BottleUpdate =
            serde_json::from_value(serde_json::json!({ "region": null, "rating": 5 })).unwrap();
        let updated = Bottle::update(&db, bottle.id, owner, patch)
            .await
            .unwrap()
            .expect("owned bottle");

        assert_eq!(updated.name, "Springbank 10");
        assert_eq!(updated.distillery.as_deref(), Some("Springbank"));
        assert_eq!(updated.price_paid, Some(Decimal::new(7450, 2)));
        assert_eq!(updated.region, None);
        assert_eq!(updated.rating, Some(5));
        assert!(updated.updated_at >= bottle.updated_at);

        let stranger = Uuid::new_v4();
        let foreign = Bottle::update(&db, bottle.id, stranger, BottleUpdate::default())
            .await
            .unwrap();
        assert!(foreign.is_none());
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn owner_list_hides_soft_deleted(db: PgPool) {
        let owner = seed_owner(&db).await;
        let keep = Bottle::create(&db, owner, &input(serde_json::json!({ "name": "Keep", "spirit_type": "gin" })))
            .await
            .unwrap();
        let gone = Bottle::create(&db, owner, &input(serde_json::json!({ "name": "Gone", "spirit_type": "gin" })))
            .await
            .unwrap();
        assert!(Bottle::soft_delete(&db, gone.id, owner).await.unwrap());

        let listed = Bottle::list_owned(&db, owner, &OwnerListQuery::default(), Pagination::default())
            .await
            .unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![keep.id]);

        let patch: BottleUpdate = serde_json::from_value(serde_json::json!({ "rating": 2 })).unwrap();
        assert!(Bottle::update(&db, gone.id, owner, patch).await.unwrap().is_none());
    }
}
