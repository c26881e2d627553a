//! Account signup/login and dietary profile management.

mod dto;
pub mod handlers;
pub mod model;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
