use serde::Serialize;
use time::OffsetDateTime;

/// Pending request as the review queue shows it.
#[derive(Debug, Serialize)]
pub struct RegistrationView {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

/// Account created by approving a request.
#[derive(Debug, Serialize)]
pub struct ApprovedUser {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}
