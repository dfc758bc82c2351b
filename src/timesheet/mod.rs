use axum::Router;

use crate::state::AppState;

pub mod calendar;
mod dto;
pub mod handlers;
pub mod images;
pub mod mail;
pub mod pdf;
pub mod rows;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
