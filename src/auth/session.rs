use std::collections::HashMap;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::AppState;

/// Server-side record behind one bearer token. Sessions live in process
/// memory only; restarting the server logs everyone out.
#[derive(Debug, Clone)]
pub struct Session {
    pub employee_id: String,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}

pub type SessionMap = HashMap<Uuid, Session>;

/// Extracts and resolves the bearer token from the Authorization header.
#[derive(Debug)]
pub struct AuthSession {
    pub token: Uuid,
    pub employee_id: String,
    pub is_admin: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".into()))?;

        let token: Uuid = token
            .trim()
            .parse()
            .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid session token".into()))?;

        let sessions = state.sessions.lock().await;
        let session = sessions
            .get(&token)
            .ok_or((StatusCode::UNAUTHORIZED, "invalid or expired session".into()))?;

        Ok(AuthSession {
            token,
            employee_id: session.employee_id.clone(),
            is_admin: session.is_admin,
        })
    }
}

/// Same as [`AuthSession`] but rejects callers without the admin flag.
#[derive(Debug)]
pub struct AdminSession(pub AuthSession);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state).await?;
        if !session.is_admin {
            return Err((StatusCode::FORBIDDEN, "admin access required".into()));
        }
        Ok(AdminSession(session))
    }
}
