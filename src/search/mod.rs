pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod stats;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::search_routes()
}
