use std::collections::HashMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStatus {
    Pending,
    Completed,
}

/// A password reset waiting for an admin. Kept only in process memory, so a
/// restart silently drops the queue and the user has to ask again.
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub requested_at: OffsetDateTime,
    pub status: ResetStatus,
}

impl ResetRequest {
    pub fn pending_now() -> Self {
        Self {
            requested_at: OffsetDateTime::now_utc(),
            status: ResetStatus::Pending,
        }
    }
}

pub type ResetRequestMap = HashMap<String, ResetRequest>;

/// Drops requests older than the TTL, whatever their status. Runs when an
/// admin views the queue; there is no background timer.
pub fn prune_expired(requests: &mut ResetRequestMap, ttl_hours: i64) {
    let cutoff = OffsetDateTime::now_utc() - Duration::hours(ttl_hours);
    requests.retain(|_, request| request.requested_at > cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_keeps_fresh_requests_only() {
        let mut requests = ResetRequestMap::new();
        requests.insert("100270".to_string(), ResetRequest::pending_now());
        requests.insert(
            "100271".to_string(),
            ResetRequest {
                requested_at: OffsetDateTime::now_utc() - Duration::hours(25),
                status: ResetStatus::Pending,
            },
        );
        requests.insert(
            "100272".to_string(),
            ResetRequest {
                requested_at: OffsetDateTime::now_utc() - Duration::hours(25),
                status: ResetStatus::Completed,
            },
        );

        prune_expired(&mut requests, 24);

        assert_eq!(requests.len(), 1);
        assert!(requests.contains_key("100270"));
    }
}
