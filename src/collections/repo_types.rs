use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::bottles::repo_types::Bottle;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A bottle as it sits in a collection.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CollectionMember {
    pub position: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub bottle: Bottle,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("Collection not found")]
    CollectionNotFound,
    #[error("Bottle not found")]
    BottleNotFound,
    #[error("Bottle already in collection")]
    AlreadyMember,
    #[error("Bottle not in collection")]
    NotMember,
}
