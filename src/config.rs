use std::path::PathBuf;

use serde::Deserialize;

/// Account seeded into an empty user store so the first admin can log in.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding users.json, registration_requests.json and
    /// notifications.json.
    pub data_dir: PathBuf,
    pub company_name: String,
    pub work_location: String,
    pub manager_name: String,
    pub manager_email: String,
    pub mail_cc: Vec<String>,
    pub logo_path: Option<PathBuf>,
    pub holidays_file: Option<PathBuf>,
    pub admin: AdminSeed,
    pub reset_request_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mail_cc = std::env::var("MAIL_CC")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let admin = AdminSeed {
            employee_id: std::env::var("ADMIN_EMPLOYEE_ID").unwrap_or_else(|_| "100269".into()),
            name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".into()),
            email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into()),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
                tracing::warn!("ADMIN_PASSWORD not set, seeding default admin password");
                "admin".into()
            }),
        };

        Ok(Self {
            data_dir: std::env::var("TIMECARD_DATA_DIR")
                .unwrap_or_else(|_| "data".into())
                .into(),
            company_name: std::env::var("COMPANY_NAME").unwrap_or_else(|_| "Aideas".into()),
            work_location: std::env::var("WORK_LOCATION")
                .unwrap_or_else(|_| "ABB Southfield".into()),
            manager_name: std::env::var("MANAGER_NAME").unwrap_or_else(|_| "Nikhil M".into()),
            manager_email: std::env::var("MANAGER_EMAIL")
                .unwrap_or_else(|_| "manager@example.com".into()),
            mail_cc,
            logo_path: std::env::var("LOGO_PATH").ok().map(PathBuf::from),
            holidays_file: std::env::var("HOLIDAYS_FILE").ok().map(PathBuf::from),
            admin,
            reset_request_ttl_hours: std::env::var("RESET_REQUEST_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        })
    }
}
