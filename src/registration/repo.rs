use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{JsonStore, StoreError};
use crate::users::repo::UserMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// One self-registration awaiting review, stored in
/// registration_requests.json under the employee ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    /// SHA-256 digest, moved into users.json verbatim on approval.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: RequestStatus,
}

pub type RequestMap = BTreeMap<String, RegistrationRequest>;

const FILE: &str = "registration_requests";

pub async fn load(store: &JsonStore) -> Result<RequestMap, StoreError> {
    store.load_or_init(FILE, RequestMap::new).await
}

pub async fn save(store: &JsonStore, requests: &RequestMap) -> Result<(), StoreError> {
    store.save(FILE, requests).await
}

/// Removes requests that no longer need review: rejected ones and those
/// whose employee ID already has an account. Returns true when anything was
/// dropped so the caller knows to persist the map.
pub fn cleanup(requests: &mut RequestMap, users: &UserMap) -> bool {
    let before = requests.len();
    requests.retain(|employee_id, request| {
        !users.contains_key(employee_id) && request.status != RequestStatus::Rejected
    });
    requests.len() != before
}
