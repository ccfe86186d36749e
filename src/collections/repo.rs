use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{CollectionCreate, CollectionUpdate};
use super::repo_types::{Collection, CollectionMember, MembershipError};
use crate::bottles::repo::{BOTTLE_COLUMNS, VISIBLE_BOTTLE};
use crate::db::PatchBuilder;
use crate::extract::Pagination;

const COLLECTION_COLUMNS: &str = "id, user_id, name, description, is_public, created_at, updated_at";

impl Collection {
    pub async fn create(
        db: &PgPool,
        owner: Uuid,
        input: &CollectionCreate,
    ) -> anyhow::Result<Collection> {
        let sql = format!(
            "INSERT INTO collections (id, user_id, name, description, is_public) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLLECTION_COLUMNS}"
        );
        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(input.name.trim())
            .bind(input.description.as_deref())
            .bind(input.is_public)
            .fetch_one(db)
            .await
            .context("insert collection")?;
        Ok(collection)
    }

    /// Public collections for anyone, private ones only for their owner.
    pub async fn find_readable(
        db: &PgPool,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> anyhow::Result<Option<Collection>> {
        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections \
             WHERE id = $1 AND (is_public OR user_id = $2)"
        );
        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(id)
            .bind(viewer)
            .fetch_optional(db)
            .await
            .context("find readable collection")?;
        Ok(collection)
    }

    pub async fn list_owned(
        db: &PgPool,
        owner: Uuid,
        page: Pagination,
    ) -> anyhow::Result<Vec<Collection>> {
        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Collection>(&sql)
            .bind(owner)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(db)
            .await
            .context("list owned collections")?;
        Ok(rows)
    }

    pub async fn list_public(db: &PgPool, page: Pagination) -> anyhow::Result<Vec<Collection>> {
        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE is_public \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, Collection>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(db)
            .await
            .context("list public collections")?;
        Ok(rows)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        owner: Uuid,
        patch: CollectionUpdate,
    ) -> anyhow::Result<Option<Collection>> {
        let mut p = PatchBuilder::new("collections");
        p.set_if("name", patch.name.flatten().map(|n| n.trim().to_string()))
            .set_if("description", patch.description)
            .set_if("is_public", patch.is_public.flatten());
        let mut qb = p.where_id(id);
        qb.push(" AND user_id = ").push_bind(owner);
        qb.push(" RETURNING ").push(COLLECTION_COLUMNS);
        let collection = qb
            .build_query_as::<Collection>()
            .fetch_optional(db)
            .await
            .context("update collection")?;
        Ok(collection)
    }

    /// Hard delete; membership rows cascade.
    pub async fn delete(db: &PgPool, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(db)
            .await
            .context("delete collection")?;
        Ok(res.rows_affected() == 1)
    }

    /// Visible member bottles in position order.
    pub async fn members(
        db: &PgPool,
        id: Uuid,
        page: Pagination,
    ) -> anyhow::Result<Vec<CollectionMember>> {
        let sql = format!(
            "SELECT cb.position, cb.added_at, {BOTTLE_COLUMNS} \
             FROM collection_bottles cb JOIN bottles b ON b.id = cb.bottle_id \
             WHERE {VISIBLE_BOTTLE} AND cb.collection_id = $1 \
             ORDER BY cb.position NULLS LAST, cb.added_at, b.id \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CollectionMember>(&sql)
            .bind(id)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(db)
            .await
            .context("list collection members")?;
        Ok(rows)
    }

    /// Appends a bottle owned by `owner` to the end of their collection.
    ///
    /// The collection row is locked for the duration so concurrent adds
    /// cannot hand out the same position.
    pub async fn add_bottle(
        db: &PgPool,
        id: Uuid,
        bottle_id: Uuid,
        owner: Uuid,
    ) -> anyhow::Result<Result<i32, MembershipError>> {
        let mut tx = db.begin().await.context("begin membership tx")?;

        let collection: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM collections WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await
        .context("lock collection")?;
        if collection.is_none() {
            return Ok(Err(MembershipError::CollectionNotFound));
        }

        let bottle: Option<Uuid> = sqlx::query_scalar(&format!(
            "SELECT b.id FROM bottles b WHERE {VISIBLE_BOTTLE} AND b.id = $1 AND b.user_id = $2"
        ))
        .bind(bottle_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await
        .context("find member bottle")?;
        if bottle.is_none() {
            return Ok(Err(MembershipError::BottleNotFound));
        }

        let position = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            INSERT INTO collection_bottles (collection_id, bottle_id, position)
            SELECT $1, $2, COALESCE(MAX(position), 0) + 1
              FROM collection_bottles
             WHERE collection_id = $1
            ON CONFLICT (collection_id, bottle_id) DO NOTHING
            RETURNING position
            "#,
        )
        .bind(id)
        .bind(bottle_id)
        .fetch_optional(&mut *tx)
        .await
        .context("insert membership")?
        .flatten();

        let Some(position) = position else {
            return Ok(Err(MembershipError::AlreadyMember));
        };

        sqlx::query("UPDATE collections SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("touch collection")?;

        tx.commit().await.context("commit membership")?;
        Ok(Ok(position))
    }

    pub async fn remove_bottle(
        db: &PgPool,
        id: Uuid,
        bottle_id: Uuid,
        owner: Uuid,
    ) -> anyhow::Result<Result<(), MembershipError>> {
        let res = sqlx::query(
            r#"
            DELETE FROM collection_bottles cb
             USING collections c
             WHERE c.id = cb.collection_id
               AND c.id = $1 AND c.user_id = $2
               AND cb.bottle_id = $3
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(bottle_id)
        .execute(db)
        .await
        .context("remove membership")?;

        if res.rows_affected() == 0 {
            return Ok(Err(MembershipError::NotMember));
        }
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bottles::{dto::BottleCreate, repo_types::Bottle};

    async fn seed(db: &PgPool) -> (Uuid, Collection, Bottle) {
        let owner = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ($1, 'owner', 'o@example.com', 'x')")
            .bind(owner)
            .execute(db)
            .await
            .unwrap();
        let collection = Collection::create(
            db,
            owner,
            &CollectionCreate {
                name: "Islay".into(),
                description: None,
                is_public: false,
            },
        )
        .await
        .unwrap();
        let input: BottleCreate =
            serde_json::from_value(serde_json::json!({ "name": "Laphroaig 10", "spirit_type": "whiskey" }))
                .unwrap();
        let bottle = Bottle::create(db, owner, &input).await.unwrap();
        (owner, collection, bottle)
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn duplicate_add_is_rejected_without_second_row(db: PgPool) {
        let (owner, c, b) = seed(&db).await;

        let first = Collection::add_bottle(&db, c.id, b.id, owner).await.unwrap();
        assert_eq!(first, Ok(1));
        let second = Collection::add_bottle(&db, c.id, b.id, owner).await.unwrap();
        assert_eq!(second, Err(MembershipError::AlreadyMember));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collection_bottles")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        assert_eq!(
            Collection::remove_bottle(&db, c.id, b.id, owner).await.unwrap(),
            Ok(())
        );
        assert_eq!(
            Collection::remove_bottle(&db, c.id, b.id, owner).await.unwrap(),
            Err(MembershipError::NotMember)
        );
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn private_collection_hidden_from_others(db: PgPool) {
        let (owner, c, _) = seed(&db).await;
        assert!(Collection::find_readable(&db, c.id, Some(owner))
            .await
            .unwrap()
            .is_some());
        assert!(Collection::find_readable(&db, c.id, None).await.unwrap().is_none());
        assert!(Collection::find_readable(&db, c.id, Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires DATABASE_URL"]
    async fn foreign_bottle_cannot_be_added(db: PgPool) {
        let (owner, c, b) = seed(&db).await;
        let stranger = Uuid::new_v4();
        assert_eq!(
            Collection::add_bottle(&db, c.id, b.id, stranger).await.unwrap(),
            Err(MembershipError::CollectionNotFound)
        );
        assert!(Bottle::soft_delete(&db, b.id, owner).await.unwrap());
        assert_eq!(
            Collection::add_bottle(&db, c.id, b.id, owner).await.unwrap(),
            Err(MembershipError::BottleNotFound)
        );
    }
}
