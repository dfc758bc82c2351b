use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    notifications::repo::{self as notifications_repo, NotificationKind},
    registration::repo::{self as registration_repo, RegistrationRequest, RequestStatus},
    state::AppState,
    users::repo as users_repo,
};

use super::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, PendingResponse, RegisterRequest,
    ResetRequestBody, SessionUser,
};
use super::is_valid_email;
use super::password::{hash_password, verify_password};
use super::reset::ResetRequest;
use super::session::{AuthSession, Session};

// --- public routers ---

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/reset-request", post(reset_request))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/password", post(change_password))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let employee_id = payload.employee_id.trim().to_string();

    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    let user = match users.get(&employee_id) {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        // Same message for a wrong password and an unknown ID.
        _ => {
            warn!(%employee_id, "login rejected");
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".into(),
            ));
        }
    };

    let token = Uuid::new_v4();
    state.sessions.lock().await.insert(
        token,
        Session {
            employee_id: employee_id.clone(),
            is_admin: user.is_admin,
            created_at: OffsetDateTime::now_utc(),
        },
    );

    info!(%employee_id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: SessionUser {
            employee_id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        },
    }))
}

#[instrument(skip(state, auth))]
pub async fn logout(State(state): State<AppState>, auth: AuthSession) -> StatusCode {
    state.sessions.lock().await.remove(&auth.token);
    info!(employee_id = %auth.employee_id, "user logged out");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<SessionUser>, (StatusCode, String)> {
    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    match users.get(&auth.employee_id) {
        Some(user) => Ok(Json(SessionUser {
            employee_id: auth.employee_id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        })),
        None => {
            warn!(employee_id = %auth.employee_id, "session user no longer exists");
            Err((StatusCode::UNAUTHORIZED, "invalid or expired session".into()))
        }
    }
}

#[instrument(skip(state, auth, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    let user = match users.get_mut(&auth.employee_id) {
        Some(user) => user,
        None => return Err((StatusCode::UNAUTHORIZED, "invalid or expired session".into())),
    };

    if !verify_password(&payload.current_password, &user.password_hash) {
        warn!(employee_id = %auth.employee_id, "password change with wrong current password");
        return Err((
            StatusCode::BAD_REQUEST,
            "Current password is incorrect".into(),
        ));
    }
    if payload.new_password.is_empty() || payload.confirm_password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter and confirm the new password".into(),
        ));
    }
    if payload.new_password != payload.confirm_password {
        return Err((StatusCode::BAD_REQUEST, "New passwords do not match".into()));
    }
    if payload.new_password == payload.current_password {
        return Err((
            StatusCode::BAD_REQUEST,
            "New password must be different from the current password".into(),
        ));
    }

    user.password_hash = hash_password(&payload.new_password);
    users_repo::save(&state.store, &users).await.map_err(internal)?;

    notifications_repo::add(
        &state.store,
        &auth.employee_id,
        "Your password has been successfully reset.",
        NotificationKind::PasswordReset,
    )
    .await
    .map_err(internal)?;

    info!(employee_id = %auth.employee_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PendingResponse>), (StatusCode, String)> {
    let employee_id = payload.employee_id.trim().to_string();
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if employee_id.is_empty()
        || name.is_empty()
        || email.is_empty()
        || payload.password.is_empty()
        || payload.confirm_password.is_empty()
    {
        return Err((StatusCode::BAD_REQUEST, "Please fill in all fields".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "registration with invalid email");
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid email address".into(),
        ));
    }
    if payload.password != payload.confirm_password {
        return Err((StatusCode::BAD_REQUEST, "Passwords do not match".into()));
    }

    let mut requests = registration_repo::load(&state.store).await.map_err(internal)?;
    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;

    if let Some(existing) = requests.get(&employee_id) {
        match existing.status {
            RequestStatus::Pending => {
                warn!(%employee_id, "duplicate pending registration");
                return Err((
                    StatusCode::CONFLICT,
                    "A registration request for this Employee ID is already pending".into(),
                ));
            }
            // A rejected or stale approved request does not block a fresh one.
            RequestStatus::Rejected | RequestStatus::Approved => {
                requests.remove(&employee_id);
            }
        }
    }
    if users.contains_key(&employee_id) {
        warn!(%employee_id, "registration for existing account");
        return Err((
            StatusCode::CONFLICT,
            "An account with this Employee ID already exists".into(),
        ));
    }

    requests.insert(
        employee_id.clone(),
        RegistrationRequest {
            name,
            email,
            password_hash: hash_password(&payload.password),
            timestamp: OffsetDateTime::now_utc(),
            status: RequestStatus::Pending,
        },
    );
    registration_repo::save(&state.store, &requests)
        .await
        .map_err(internal)?;

    info!(%employee_id, "registration request submitted");
    Ok((
        StatusCode::CREATED,
        Json(PendingResponse {
            employee_id,
            status: "pending".to_string(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn reset_request(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequestBody>,
) -> Result<(StatusCode, Json<PendingResponse>), (StatusCode, String)> {
    let employee_id = payload.employee_id.trim().to_string();

    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    if !users.contains_key(&employee_id) {
        warn!(%employee_id, "reset request for unknown employee");
        return Err((StatusCode::NOT_FOUND, "Employee ID not found".into()));
    }

    // Resubmitting replaces the previous request and restarts the clock.
    state
        .reset_requests
        .lock()
        .await
        .insert(employee_id.clone(), ResetRequest::pending_now());

    info!(%employee_id, "password reset requested");
    Ok((
        StatusCode::ACCEPTED,
        Json(PendingResponse {
            employee_id,
            status: "pending".to_string(),
        }),
    ))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::reset::ResetStatus;

    fn admin_login() -> LoginRequest {
        LoginRequest {
            employee_id: "100269".to_string(),
            password: "admin".to_string(),
        }
    }

    fn registration(employee_id: &str) -> RegisterRequest {
        RegisterRequest {
            employee_id: employee_id.to_string(),
            name: "Priya Nair".to_string(),
            email: "priya@example.com".to_string(),
            password: "secret".to_string(),
            confirm_password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn login_issues_a_usable_session_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let response = login(State(state.clone()), Json(admin_login()))
            .await
            .expect("login");
        assert!(response.0.user.is_admin);
        assert!(state
            .sessions
            .lock()
            .await
            .contains_key(&response.0.token));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_with_one_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                employee_id: "100269".to_string(),
                password: "nope".to_string(),
            }),
        )
        .await
        .expect_err("wrong password");
        let unknown_id = login(
            State(state),
            Json(LoginRequest {
                employee_id: "999999".to_string(),
                password: "admin".to_string(),
            }),
        )
        .await
        .expect_err("unknown id");

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_id.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.1, unknown_id.1);
    }

    #[tokio::test]
    async fn logout_invalidates_the_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let response = login(State(state.clone()), Json(admin_login()))
            .await
            .expect("login");
        let auth = AuthSession {
            token: response.0.token,
            employee_id: "100269".to_string(),
            is_admin: true,
        };

        logout(State(state.clone()), auth).await;
        assert!(!state.sessions.lock().await.contains_key(&response.0.token));
    }

    #[tokio::test]
    async fn change_password_invalidates_the_old_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let response = login(State(state.clone()), Json(admin_login()))
            .await
            .expect("login");
        let auth = AuthSession {
            token: response.0.token,
            employee_id: "100269".to_string(),
            is_admin: true,
        };

        change_password(
            State(state.clone()),
            auth,
            Json(ChangePasswordRequest {
                current_password: "admin".to_string(),
                new_password: "n3w-secret".to_string(),
                confirm_password: "n3w-secret".to_string(),
            }),
        )
        .await
        .expect("change password");

        assert!(login(State(state.clone()), Json(admin_login())).await.is_err());
        login(
            State(state.clone()),
            Json(LoginRequest {
                employee_id: "100269".to_string(),
                password: "n3w-secret".to_string(),
            }),
        )
        .await
        .expect("new password works");

        let feed = notifications_repo::list_for(&state.store, "100269")
            .await
            .expect("feed");
        assert_eq!(feed[0].kind, NotificationKind::PasswordReset);
    }

    #[tokio::test]
    async fn change_password_requires_the_current_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());
        let auth = AuthSession {
            token: Uuid::new_v4(),
            employee_id: "100269".to_string(),
            is_admin: true,
        };

        let err = change_password(
            State(state),
            auth,
            Json(ChangePasswordRequest {
                current_password: "wrong".to_string(),
                new_password: "n3w-secret".to_string(),
                confirm_password: "n3w-secret".to_string(),
            }),
        )
        .await
        .expect_err("wrong current password");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "Current password is incorrect");
    }

    #[tokio::test]
    async fn register_validates_its_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let mut incomplete = registration("100300");
        incomplete.name = "   ".to_string();
        let err = register(State(state.clone()), Json(incomplete))
            .await
            .expect_err("blank name");
        assert_eq!(err.1, "Please fill in all fields");

        let mut bad_email = registration("100300");
        bad_email.email = "not-an-email".to_string();
        let err = register(State(state.clone()), Json(bad_email))
            .await
            .expect_err("bad email");
        assert_eq!(err.1, "Please enter a valid email address");

        let mut mismatch = registration("100300");
        mismatch.confirm_password = "different".to_string();
        let err = register(State(state), Json(mismatch))
            .await
            .expect_err("mismatch");
        assert_eq!(err.1, "Passwords do not match");
    }

    #[tokio::test]
    async fn pending_blocks_resubmission_but_rejected_does_not() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let created = register(State(state.clone()), Json(registration("100300")))
            .await
            .expect("first registration");
        assert_eq!(created.0, StatusCode::CREATED);

        let err = register(State(state.clone()), Json(registration("100300")))
            .await
            .expect_err("still pending");
        assert_eq!(err.0, StatusCode::CONFLICT);

        let mut requests = registration_repo::load(&state.store).await.expect("load");
        requests
            .get_mut("100300")
            .expect("request")
            .status = RequestStatus::Rejected;
        registration_repo::save(&state.store, &requests)
            .await
            .expect("save");

        let retried = register(State(state.clone()), Json(registration("100300")))
            .await
            .expect("retry after rejection");
        assert_eq!(retried.0, StatusCode::CREATED);

        let requests = registration_repo::load(&state.store).await.expect("load");
        assert_eq!(
            requests.get("100300").expect("request").status,
            RequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn registering_an_existing_account_conflicts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let err = register(State(state), Json(registration("100269")))
            .await
            .expect_err("admin already exists");
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1, "An account with this Employee ID already exists");
    }

    #[tokio::test]
    async fn reset_request_needs_a_known_employee_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());

        let err = reset_request(
            State(state.clone()),
            Json(ResetRequestBody {
                employee_id: "999999".to_string(),
            }),
        )
        .await
        .expect_err("unknown id");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(err.1, "Employee ID not found");

        let accepted = reset_request(
            State(state.clone()),
            Json(ResetRequestBody {
                employee_id: "100269".to_string(),
            }),
        )
        .await
        .expect("known id");
        assert_eq!(accepted.0, StatusCode::ACCEPTED);

        let requests = state.reset_requests.lock().await;
        assert_eq!(
            requests.get("100269").expect("request").status,
            ResetStatus::Pending
        );
    }
}
