use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{BottleCreate, BottleUpdate, OwnerListQuery};
use super::repo_types::Bottle;
use super::services::create_bottle;
use crate::{
    auth::services::AuthUser,
    error::{ApiError, ApiResult},
    extract::{Pagination, ValidJson, ValidQuery},
    search::{
        dto::{FilterCriteria, FilterPage, OwnerStats, SearchQuery},
        filter::Scope,
        repo as search,
    },
    state::AppState,
};

const NOT_FOUND: &str = "Bottle not found";

pub fn bottle_routes() -> Router<AppState> {
    Router::new()
        .route("/bottles", get(list_bottles).post(create))
        .route("/bottles/stats", get(stats))
        .route("/bottles/filter", get(filter_owned))
        .route("/bottles/search", get(search_owned))
        .route(
            "/bottles/:bottle_id",
            get(get_bottle).put(update_bottle).delete(delete_bottle),
        )
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidJson(payload): ValidJson<BottleCreate>,
) -> ApiResult<(StatusCode, Json<Bottle>)> {
    let bottle = create_bottle(&state, owner, payload).await?;
    Ok((StatusCode::CREATED, Json(bottle)))
}

#[instrument(skip(state))]
pub async fn list_bottles(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidQuery(query): ValidQuery<OwnerListQuery>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Bottle>>> {
    let rows = Bottle::list_owned(&state.db, owner, &query, page).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> ApiResult<Json<OwnerStats>> {
    Ok(Json(search::owner_stats(&state.db, owner).await?))
}

#[instrument(skip(state))]
pub async fn filter_owned(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidQuery(criteria): ValidQuery<FilterCriteria>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<FilterPage>> {
    let page = search::filter(&state.db, Scope::Owner(owner), &criteria, page).await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn search_owned(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ValidQuery(query): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Bottle>>> {
    let rows = search::keyword(&state.db, Scope::Owner(owner), &query.q, page).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_bottle(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(bottle_id): Path<Uuid>,
) -> ApiResult<Json<Bottle>> {
    let bottle = Bottle::find_owned(&state.db, bottle_id, owner)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(bottle))
}

#[instrument(skip(state, payload))]
pub async fn update_bottle(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(bottle_id): Path<Uuid>,
    ValidJson(payload): ValidJson<BottleUpdate>,
) -> ApiResult<Json<Bottle>> {
    let bottle = Bottle::update(&state.db, bottle_id, owner, payload)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(bottle))
}

#[instrument(skip(state))]
pub async fn delete_bottle(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(bottle_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Bottle::soft_delete(&state.db, bottle_id, owner).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!(%bottle_id, %owner, "bottle deleted");
    Ok(StatusCode::NO_CONTENT)
}
