use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        is_valid_email,
        password::hash_password,
        reset::{self, ResetStatus},
        session::AdminSession,
    },
    notifications::repo::{self as notifications_repo, NotificationKind},
    registration::repo as registration_repo,
    state::AppState,
};

use super::dto::{
    CompleteResetRequest, CreateUserRequest, ResetRequestView, SetPasswordRequest,
    UserListResponse, UserSummary,
};
use super::repo::{self, UserRecord};

// --- public routers ---

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:employee_id", delete(delete_user))
        .route("/admin/users/:employee_id/password", put(set_password))
        .route("/admin/reset-requests", get(list_reset_requests))
        .route(
            "/admin/reset-requests/:employee_id/complete",
            post(complete_reset),
        )
        .route("/admin/reset-requests/:employee_id", delete(dismiss_reset))
}

// --- handlers ---

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<UserListResponse>, (StatusCode, String)> {
    let users = repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;

    let users: Vec<UserSummary> = users
        .into_iter()
        .map(|(employee_id, user)| UserSummary {
            employee_id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        })
        .collect();
    let admin_users = users.iter().filter(|user| user.is_admin).count();

    Ok(Json(UserListResponse {
        total_users: users.len(),
        admin_users,
        regular_users: users.len() - admin_users,
        users,
    }))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), (StatusCode, String)> {
    let employee_id = payload.employee_id.trim().to_string();
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if employee_id.is_empty() || name.is_empty() || email.is_empty() || payload.password.is_empty()
    {
        return Err((StatusCode::BAD_REQUEST, "All fields are required".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "user creation with invalid email");
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid email address".into(),
        ));
    }

    let mut users = repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    if users.contains_key(&employee_id) {
        warn!(%employee_id, "user creation for existing employee id");
        return Err((StatusCode::CONFLICT, "Employee ID already exists".into()));
    }

    users.insert(
        employee_id.clone(),
        UserRecord {
            password_hash: hash_password(&payload.password),
            is_admin: payload.is_admin,
            name: name.clone(),
            email: email.clone(),
        },
    );
    repo::save(&state.store, &users).await.map_err(internal)?;

    info!(%employee_id, is_admin = payload.is_admin, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            employee_id,
            name,
            email,
            is_admin: payload.is_admin,
        }),
    ))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(employee_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if employee_id == admin.employee_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "You cannot delete your own account".into(),
        ));
    }

    let mut users = repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    if users.remove(&employee_id).is_none() {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }
    repo::save(&state.store, &users).await.map_err(internal)?;

    // Drop anything else tied to the account: a stale registration request
    // would otherwise block the ID from registering again, and live sessions
    // would keep authenticating a user that no longer exists.
    let mut requests = registration_repo::load(&state.store)
        .await
        .map_err(internal)?;
    if requests.remove(&employee_id).is_some() {
        registration_repo::save(&state.store, &requests)
            .await
            .map_err(internal)?;
    }
    state
        .sessions
        .lock()
        .await
        .retain(|_, session| session.employee_id != employee_id);
    state.reset_requests.lock().await.remove(&employee_id);

    info!(%employee_id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin, payload))]
pub async fn set_password(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(employee_id): Path<String>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.new_password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter a new password".into()));
    }

    let mut users = repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    match users.get_mut(&employee_id) {
        Some(user) => user.password_hash = hash_password(&payload.new_password),
        None => return Err((StatusCode::NOT_FOUND, "User not found".into())),
    }
    repo::save(&state.store, &users).await.map_err(internal)?;

    info!(%employee_id, "password set by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn list_reset_requests(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<ResetRequestView>>, (StatusCode, String)> {
    let mut requests = state.reset_requests.lock().await;
    reset::prune_expired(&mut requests, state.config.reset_request_ttl_hours);

    let mut views: Vec<ResetRequestView> = requests
        .iter()
        .filter(|(_, request)| request.status == ResetStatus::Pending)
        .map(|(employee_id, request)| ResetRequestView {
            employee_id: employee_id.clone(),
            requested_at: request.requested_at,
            status: request.status,
        })
        .collect();
    views.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));

    Ok(Json(views))
}

#[instrument(skip(state, _admin, payload))]
pub async fn complete_reset(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(employee_id): Path<String>,
    Json(payload): Json<CompleteResetRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.new_password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter a new password".into()));
    }

    let mut requests = state.reset_requests.lock().await;
    match requests.get(&employee_id) {
        Some(request) if request.status == ResetStatus::Pending => {}
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                "No pending reset request for this employee".into(),
            ))
        }
    }

    let mut users = repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    match users.get_mut(&employee_id) {
        Some(user) => user.password_hash = hash_password(&payload.new_password),
        None => return Err((StatusCode::NOT_FOUND, "User not found".into())),
    }
    repo::save(&state.store, &users).await.map_err(internal)?;

    if let Some(request) = requests.get_mut(&employee_id) {
        request.status = ResetStatus::Completed;
    }

    notifications_repo::add(
        &state.store,
        &employee_id,
        "Your password has been reset. Please log in with your new password.",
        NotificationKind::PasswordReset,
    )
    .await
    .map_err(internal)?;

    info!(%employee_id, "password reset completed by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn dismiss_reset(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(employee_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .reset_requests
        .lock()
        .await
        .remove(&employee_id)
        .is_none()
    {
        return Err((
            StatusCode::NOT_FOUND,
            "No reset request for this employee".into(),
        ));
    }

    notifications_repo::add(
        &state.store,
        &employee_id,
        "Your password reset request has been dismissed by the admin. Please submit a new request if needed.",
        NotificationKind::Info,
    )
    .await
    .map_err(internal)?;

    info!(%employee_id, "reset request dismissed by admin");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
