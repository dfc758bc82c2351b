use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::session::AdminSession,
    notifications::repo::{self as notifications_repo, NotificationKind},
    state::AppState,
    users::repo::{self as users_repo, UserRecord},
};

use super::dto::{ApprovedUser, RegistrationView};
use super::repo::{self, RequestStatus};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/registrations", get(list_requests))
        .route("/admin/registrations/:employee_id/approve", post(approve_request))
        .route("/admin/registrations/:employee_id/reject", post(reject_request))
}

/// Review queue. Stale entries are swept out before listing so the admin
/// only ever sees requests that still need a decision.
#[instrument(skip(state, _admin))]
pub async fn list_requests(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<RegistrationView>>, (StatusCode, String)> {
    let users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    let mut requests = repo::load(&state.store).await.map_err(internal)?;

    if repo::cleanup(&mut requests, &users) {
        repo::save(&state.store, &requests).await.map_err(internal)?;
    }

    let mut views: Vec<RegistrationView> = requests
        .iter()
        .filter(|(_, request)| request.status == RequestStatus::Pending)
        .map(|(employee_id, request)| RegistrationView {
            employee_id: employee_id.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            submitted_at: request.timestamp,
        })
        .collect();
    views.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

    Ok(Json(views))
}

#[instrument(skip(state, _admin))]
pub async fn approve_request(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(employee_id): Path<String>,
) -> Result<(StatusCode, Json<ApprovedUser>), (StatusCode, String)> {
    let mut requests = repo::load(&state.store).await.map_err(internal)?;
    let request = match requests.get(&employee_id) {
        Some(request) if request.status == RequestStatus::Pending => request.clone(),
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                "No pending registration request for this employee".into(),
            ))
        }
    };

    let mut users = users_repo::load(&state.store, &state.config.admin)
        .await
        .map_err(internal)?;
    if users.contains_key(&employee_id) {
        warn!(%employee_id, "approval raced with an existing account");
        return Err((
            StatusCode::CONFLICT,
            "An account with this Employee ID already exists".into(),
        ));
    }

    users.insert(
        employee_id.clone(),
        UserRecord {
            password_hash: request.password_hash,
            is_admin: false,
            name: request.name.clone(),
            email: request.email.clone(),
        },
    );
    users_repo::save(&state.store, &users).await.map_err(internal)?;

    if let Some(stored) = requests.get_mut(&employee_id) {
        stored.status = RequestStatus::Approved;
    }
    repo::save(&state.store, &requests).await.map_err(internal)?;

    notifications_repo::add(
        &state.store,
        &employee_id,
        "Your registration request has been approved. You can now log in.",
        NotificationKind::Success,
    )
    .await
    .map_err(internal)?;

    info!(%employee_id, "registration approved");
    Ok((
        StatusCode::CREATED,
        Json(ApprovedUser {
            employee_id,
            name: request.name,
            email: request.email,
            is_admin: false,
        }),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn reject_request(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(employee_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut requests = repo::load(&state.store).await.map_err(internal)?;
    match requests.get_mut(&employee_id) {
        Some(request) if request.status == RequestStatus::Pending => {
            request.status = RequestStatus::Rejected;
        }
        _ => {
            return Err((
                StatusCode::NOT_FOUND,
                "No pending registration request for this employee".into(),
            ))
        }
    }
    repo::save(&state.store, &requests).await.map_err(internal)?;

    info!(%employee_id, "registration rejected");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, verify_password};
    use crate::auth::session::AuthSession;
    use crate::registration::repo::RegistrationRequest;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn admin() -> AdminSession {
        AdminSession(AuthSession {
            token: Uuid::new_v4(),
            employee_id: "100269".to_string(),
            is_admin: true,
        })
    }

    async fn submit(state: &AppState, employee_id: &str) {
        let mut requests = repo::load(&state.store).await.expect("load");
        requests.insert(
            employee_id.to_string(),
            RegistrationRequest {
                name: "Priya Nair".to_string(),
                email: "priya@example.com".to_string(),
                password_hash: hash_password("secret"),
                timestamp: OffsetDateTime::now_utc(),
                status: RequestStatus::Pending,
            },
        );
        repo::save(&state.store, &requests).await.expect("save");
    }

    #[tokio::test]
    async fn approving_creates_the_account_and_notifies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());
        submit(&state, "100300").await;

        let approved = approve_request(State(state.clone()), admin(), Path("100300".to_string()))
            .await
            .expect("approve");
        assert_eq!(approved.0, StatusCode::CREATED);
        assert!(!approved.1 .0.is_admin);

        let users = users_repo::load(&state.store, &state.config.admin)
            .await
            .expect("users");
        let user = users.get("100300").expect("created user");
        assert!(verify_password("secret", &user.password_hash));

        let feed = notifications_repo::list_for(&state.store, "100300")
            .await
            .expect("feed");
        assert_eq!(feed[0].kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn rejecting_takes_the_request_out_of_the_queue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());
        submit(&state, "100300").await;

        reject_request(State(state.clone()), admin(), Path("100300".to_string()))
            .await
            .expect("reject");

        let requests = repo::load(&state.store).await.expect("load");
        assert_eq!(
            requests.get("100300").expect("request").status,
            RequestStatus::Rejected
        );

        // listing sweeps the rejected entry out entirely
        let queue = list_requests(State(state.clone()), admin())
            .await
            .expect("list");
        assert!(queue.0.is_empty());
        let requests = repo::load(&state.store).await.expect("reload");
        assert!(!requests.contains_key("100300"));

        // no notification goes out for a rejection
        let feed = notifications_repo::list_for(&state.store, "100300")
            .await
            .expect("feed");
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn listing_sweeps_out_requests_for_existing_accounts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());
        // the fake admin already has an account, so this request is stale
        submit(&state, "100269").await;
        submit(&state, "100300").await;

        let queue = list_requests(State(state.clone()), admin())
            .await
            .expect("list");
        assert_eq!(queue.0.len(), 1);
        assert_eq!(queue.0[0].employee_id, "100300");

        let requests = repo::load(&state.store).await.expect("load");
        assert!(!requests.contains_key("100269"));
    }

    #[tokio::test]
    async fn approving_twice_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::fake(dir.path());
        submit(&state, "100300").await;

        approve_request(State(state.clone()), admin(), Path("100300".to_string()))
            .await
            .expect("approve");
        let err = approve_request(State(state), admin(), Path("100300".to_string()))
            .await
            .expect_err("second approval");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
