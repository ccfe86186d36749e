use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::UserUpdate;
use super::repo_types::User;
use crate::{
    auth::services::AuthUser,
    error::{ApiError, ApiResult},
    extract::ValidJson,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/:user_id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<User>> {
    // A valid token for a user that no longer exists is treated as unauthenticated.
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(user_id): Path<Uuid>,
    ValidJson(payload): ValidJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    if current != user_id {
        warn!(%current, %user_id, "attempt to update another user's profile");
        return Err(ApiError::Forbidden(
            "Cannot update other users' profiles".into(),
        ));
    }

    let user = User::update_profile(&state.db, user_id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(%user_id, "profile updated");
    Ok(Json(user))
}
