use axum::Router;

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
