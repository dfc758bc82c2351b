use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{auth::session::AuthSession, state::AppState};

use super::repo::{self, Notification};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_read))
        .route("/notifications/:id", delete(delete_notification))
}

#[instrument(skip(state, auth))]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let feed = repo::list_for(&state.store, &auth.employee_id)
        .await
        .map_err(internal)?;
    Ok(Json(feed))
}

#[instrument(skip(state, auth))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let found = repo::mark_read(&state.store, &auth.employee_id, id)
        .await
        .map_err(internal)?;
    if !found {
        return Err((StatusCode::NOT_FOUND, "Notification not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = repo::delete(&state.store, &auth.employee_id, id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err((StatusCode::NOT_FOUND, "Notification not found".into()));
    }
    info!(employee_id = %auth.employee_id, id, "notification deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
