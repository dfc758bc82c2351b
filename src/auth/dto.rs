use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub employee_id: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: SessionUser,
}

/// Request body for self-registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Returned when a registration or reset request was queued for an admin.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub employee_id: String,
    pub status: String,
}

/// Request body for a logged-in password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Request body for the forgot-password flow.
#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    pub employee_id: String,
}
