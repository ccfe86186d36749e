use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::UserUpdate;
use super::repo_types::{NewUser, User};
use crate::db::PatchBuilder;

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, display_name, bio, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, display_name, bio, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.display_name)
        .bind(new.bio)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    /// Applies a profile merge-patch. `None` when the user does not exist.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        patch: UserUpdate,
    ) -> anyhow::Result<Option<User>> {
        let mut p = PatchBuilder::new("users");
        p.set_if("display_name", patch.display_name)
            .set_if("bio", patch.bio);
        let mut qb = p.where_id(id);
        qb.push(
            " RETURNING id, username, email, password_hash, display_name, bio, created_at, updated_at",
        );
        let user = qb
            .build_query_as::<User>()
            .fetch_optional(db)
            .await
            .context("update user profile")?;
        Ok(user)
    }
}
