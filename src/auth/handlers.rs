use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginForm, RegisterRequest},
        services::{hash_password, verify_password, JwtKeys},
    },
    error::{is_unique_violation, ApiError, ApiResult},
    extract::{ValidForm, ValidJson},
    state::AppState,
    users::repo_types::{NewUser, User},
};

const BAD_CREDENTIALS: &str = "Incorrect username or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    payload.normalize();

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("Username already registered".into()));
    }
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &hash,
            display_name: payload.display_name.as_deref(),
            bio: payload.bio.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        // lost a race with a concurrent registration
        if is_unique_violation(&e) {
            ApiError::Conflict("Username or email already registered".into())
        } else {
            ApiError::Internal(e)
        }
    })?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    ValidForm(form): ValidForm<LoginForm>,
) -> ApiResult<Json<AuthResponse>> {
    let username = form.username.trim();

    let Some(user) = User::find_by_username(&state.db, username).await? else {
        warn!(%username, "login unknown username");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(&form.password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse::bearer(token, user)))
}
