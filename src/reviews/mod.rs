pub mod analysis;
pub mod dto;
pub mod handlers;
mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::review_routes()
}
