use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{FlavorProfile, RecommendationQuery, ReviewSummary};
use super::repo;
use crate::{
    auth::services::AuthUser,
    bottles::repo_types::BottleSummary,
    error::ApiResult,
    extract::ValidQuery,
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me/flavor-profile", get(flavor_profile))
        .route("/users/me/recommendations", get(recommendations))
        .route("/tasting-notes/bottle/:bottle_id/summary", get(summary))
}

#[instrument(skip(state))]
pub async fn flavor_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<FlavorProfile>> {
    Ok(Json(repo::flavor_profile(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidQuery(q): ValidQuery<RecommendationQuery>,
) -> ApiResult<Json<Vec<BottleSummary>>> {
    let rows = repo::recommendations(&state.db, user_id, q.limit.unwrap_or(10)).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Path(bottle_id): Path<Uuid>,
) -> ApiResult<Json<ReviewSummary>> {
    Ok(Json(repo::review_summary(&state.db, bottle_id).await?))
}
