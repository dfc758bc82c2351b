use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::reset::ResetStatus;

/// Row in the admin user list.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// All accounts plus the counters the admin panel shows.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub total_users: usize,
    pub admin_users: usize,
    pub regular_users: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

/// Open password reset request as the admin panel sees it.
#[derive(Debug, Serialize)]
pub struct ResetRequestView {
    pub employee_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    pub status: ResetStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompleteResetRequest {
    pub new_password: String,
}
