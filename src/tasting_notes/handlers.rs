use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{TastingNoteCreate, TastingNoteUpdate};
use super::repo_types::{BottleNoteStats, NoteStatistics, TastingNote};
use crate::{
    auth::services::AuthUser,
    bottles::repo_types::Bottle,
    error::{ApiError, ApiResult},
    extract::{Pagination, ValidJson, ValidQuery},
    state::AppState,
};

const NOT_FOUND: &str = "Tasting note not found";

pub fn tasting_note_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasting-notes/bottles/:bottle_id",
            get(list_for_bottle).post(create),
        )
        .route("/tasting-notes/user/statistics", get(my_statistics))
        .route("/tasting-notes/user/:user_id/notes", get(user_notes))
        .route("/tasting-notes/bottle/:bottle_id/stats", get(bottle_stats))
        .route(
            "/tasting-notes/:note_id",
            get(get_note).put(update).delete(delete),
        )
}

async fn require_owned_bottle(state: &AppState, bottle_id: Uuid, owner: Uuid) -> ApiResult<()> {
    Bottle::find_owned(&state.db, bottle_id, owner)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Bottle not found"))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(bottle_id): Path<Uuid>,
    ValidJson(payload): ValidJson<TastingNoteCreate>,
) -> ApiResult<(StatusCode, Json<TastingNote>)> {
    require_owned_bottle(&state, bottle_id, author).await?;
    let note = TastingNote::create(&state.db, bottle_id, author, &payload).await?;
    info!(note_id = %note.id, %bottle_id, "tasting note created");
    Ok((StatusCode::CREATED, Json(note)))
}

#[instrument(skip(state))]
pub async fn list_for_bottle(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(bottle_id): Path<Uuid>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<TastingNote>>> {
    require_owned_bottle(&state, bottle_id, author).await?;
    let notes = TastingNote::list_for_bottle(&state.db, bottle_id, author, page).await?;
    Ok(Json(notes))
}

#[instrument(skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(note_id): Path<Uuid>,
) -> ApiResult<Json<TastingNote>> {
    let note = TastingNote::find_authored(&state.db, note_id, author)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(note))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(note_id): Path<Uuid>,
    ValidJson(payload): ValidJson<TastingNoteUpdate>,
) -> ApiResult<Json<TastingNote>> {
    let note = TastingNote::update(&state.db, note_id, author, payload)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(note))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(note_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !TastingNote::delete(&state.db, note_id, author).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!(%note_id, "tasting note deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn my_statistics(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
) -> ApiResult<Json<NoteStatistics>> {
    Ok(Json(TastingNote::author_statistics(&state.db, author).await?))
}

#[instrument(skip(state))]
pub async fn bottle_stats(
    State(state): State<AppState>,
    Path(bottle_id): Path<Uuid>,
) -> ApiResult<Json<BottleNoteStats>> {
    Ok(Json(TastingNote::bottle_stats(&state.db, bottle_id).await?))
}

#[instrument(skip(state))]
pub async fn user_notes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<TastingNote>>> {
    let notes = TastingNote::list_by_user(&state.db, user_id, page).await?;
    if notes.is_empty() {
        return Err(ApiError::not_found("User not found or has no tasting notes"));
    }
    Ok(Json(notes))
}
