use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{JsonStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    PasswordReset,
}

/// One entry in a user's notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
}

pub type NotificationMap = BTreeMap<String, Vec<Notification>>;

const FILE: &str = "notifications";

pub async fn load(store: &JsonStore) -> Result<NotificationMap, StoreError> {
    store.load_or_init(FILE, NotificationMap::new).await
}

pub async fn save(store: &JsonStore, notifications: &NotificationMap) -> Result<(), StoreError> {
    store.save(FILE, notifications).await
}

/// Appends to the user's feed. Ids are one past the largest id present
/// rather than the list length, so deleting old entries can never make two
/// notifications share an id.
pub async fn add(
    store: &JsonStore,
    employee_id: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, StoreError> {
    let mut all = load(store).await?;
    let feed = all.entry(employee_id.to_string()).or_default();
    let id = feed.iter().map(|n| n.id + 1).max().unwrap_or(0);

    let notification = Notification {
        id,
        message: message.to_string(),
        kind,
        timestamp: OffsetDateTime::now_utc(),
        read: false,
    };
    feed.push(notification.clone());
    save(store, &all).await?;
    Ok(notification)
}

/// Newest first, the order the feed is shown in.
pub async fn list_for(store: &JsonStore, employee_id: &str) -> Result<Vec<Notification>, StoreError> {
    let mut feed = load(store).await?.remove(employee_id).unwrap_or_default();
    feed.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
    Ok(feed)
}

pub async fn mark_read(store: &JsonStore, employee_id: &str, id: u64) -> Result<bool, StoreError> {
    let mut all = load(store).await?;
    let mut found = false;
    if let Some(feed) = all.get_mut(employee_id) {
        for notification in feed.iter_mut().filter(|n| n.id == id) {
            notification.read = true;
            found = true;
        }
    }
    if found {
        save(store, &all).await?;
    }
    Ok(found)
}

pub async fn delete(store: &JsonStore, employee_id: &str, id: u64) -> Result<bool, StoreError> {
    let mut all = load(store).await?;
    let mut removed = false;
    if let Some(feed) = all.get_mut(employee_id) {
        let before = feed.len();
        feed.retain(|n| n.id != id);
        removed = feed.len() != before;
    }
    if removed {
        save(store, &all).await?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (JsonStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("store");
        (store, dir)
    }

    #[tokio::test]
    async fn ids_stay_unique_after_deletions() {
        let (store, _dir) = store().await;

        for n in 0..3 {
            let added = add(&store, "100300", &format!("message {n}"), NotificationKind::Info)
                .await
                .expect("add");
            assert_eq!(added.id, n);
        }

        assert!(delete(&store, "100300", 1).await.expect("delete"));

        // two entries remain (0 and 2); the next id must not reuse 2
        let added = add(&store, "100300", "after delete", NotificationKind::Success)
            .await
            .expect("add");
        assert_eq!(added.id, 3);
    }

    #[tokio::test]
    async fn feeds_are_isolated_per_user() {
        let (store, _dir) = store().await;

        add(&store, "100300", "for priya", NotificationKind::Info)
            .await
            .expect("add");
        add(&store, "100301", "for arun", NotificationKind::Info)
            .await
            .expect("add");

        let feed = list_for(&store, "100300").await.expect("list");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message, "for priya");
        assert!(list_for(&store, "unknown").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (store, _dir) = store().await;

        add(&store, "100300", "first", NotificationKind::Info)
            .await
            .expect("add");
        add(&store, "100300", "second", NotificationKind::Success)
            .await
            .expect("add");
        add(&store, "100300", "third", NotificationKind::PasswordReset)
            .await
            .expect("add");

        let feed = list_for(&store, "100300").await.expect("list");
        let messages: Vec<&str> = feed.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn mark_read_flips_only_the_target() {
        let (store, _dir) = store().await;

        add(&store, "100300", "one", NotificationKind::Info)
            .await
            .expect("add");
        add(&store, "100300", "two", NotificationKind::Info)
            .await
            .expect("add");

        assert!(mark_read(&store, "100300", 0).await.expect("mark"));
        assert!(!mark_read(&store, "100300", 99).await.expect("mark missing"));

        let all = load(&store).await.expect("load");
        let feed = all.get("100300").expect("feed");
        assert!(feed.iter().find(|n| n.id == 0).expect("id 0").read);
        assert!(!feed.iter().find(|n| n.id == 1).expect("id 1").read);
    }

    #[tokio::test]
    async fn stored_json_uses_the_type_field_in_snake_case() {
        let (store, dir) = store().await;
        add(&store, "100300", "reset done", NotificationKind::PasswordReset)
            .await
            .expect("add");

        let raw =
            std::fs::read_to_string(dir.path().join("notifications.json")).expect("read file");
        assert!(raw.contains("\"type\": \"password_reset\""));
        assert!(!raw.contains("\"kind\""));
    }
}
