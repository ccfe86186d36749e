use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CollectionCreate, CollectionUpdate};
use super::repo_types::{Collection, CollectionMember, MembershipError};
use crate::{
    auth::services::{AuthUser, MaybeAuthUser},
    error::{ApiError, ApiResult},
    extract::{Pagination, ValidJson, ValidQuery},
    state::AppState,
};

const NOT_FOUND: &str = "Collection not found";

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_own).post(create))
        .route("/collections/public", get(list_public))
        .route(
            "/collections/:collection_id",
            get(get_collection).put(update).delete(delete),
        )
        .route("/collections/:collection_id/bottles", get(list_members))
        .route(
            "/collections/:collection_id/bottles/:bottle_id",
            post(add_bottle).delete(remove_bottle),
        )
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::AlreadyMember => ApiError::Conflict(err.to_string()),
            other => ApiError::not_found(other.to_string()),
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidJson(payload): ValidJson<CollectionCreate>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = Collection::create(&state.db, owner, &payload).await?;
    info!(collection_id = %collection.id, %owner, "collection created");
    Ok((StatusCode::CREATED, Json(collection)))
}

#[instrument(skip(state))]
pub async fn list_own(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Collection>>> {
    Ok(Json(Collection::list_owned(&state.db, owner, page).await?))
}

#[instrument(skip(state))]
pub async fn list_public(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Collection>>> {
    Ok(Json(Collection::list_public(&state.db, page).await?))
}

#[instrument(skip(state))]
pub async fn get_collection(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<Json<Collection>> {
    let collection = Collection::find_readable(&state.db, collection_id, viewer)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(collection))
}

#[instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(collection_id): Path<Uuid>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<CollectionMember>>> {
    if Collection::find_readable(&state.db, collection_id, viewer)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(Json(Collection::members(&state.db, collection_id, page).await?))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(collection_id): Path<Uuid>,
    ValidJson(payload): ValidJson<CollectionUpdate>,
) -> ApiResult<Json<Collection>> {
    let collection = Collection::update(&state.db, collection_id, owner, payload)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(collection))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Collection::delete(&state.db, collection_id, owner).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!(%collection_id, %owner, "collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_bottle(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path((collection_id, bottle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    match Collection::add_bottle(&state.db, collection_id, bottle_id, owner).await? {
        Ok(position) => {
            info!(%collection_id, %bottle_id, position, "bottle added to collection");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            warn!(%collection_id, %bottle_id, reason = %e, "bottle not added");
            Err(e.into())
        }
    }
}

#[instrument(skip(state))]
pub async fn remove_bottle(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path((collection_id, bottle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    Collection::remove_bottle(&state.db, collection_id, bottle_id, owner).await??;
    info!(%collection_id, %bottle_id, "bottle removed from collection");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_errors_map_to_status() {
        assert_eq!(
            ApiError::from(MembershipError::AlreadyMember).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(MembershipError::NotMember).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MembershipError::BottleNotFound).status(),
            StatusCode::NOT_FOUND
        );
    }
}
