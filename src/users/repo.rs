use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::hash_password;
use crate::config::AdminSeed;
use crate::store::{JsonStore, StoreError};

/// One record in users.json. The JSON field is called `password` because
/// that is what existing store files use; it always holds the SHA-256 hex
/// digest, never the raw password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

pub type UserMap = BTreeMap<String, UserRecord>;

const FILE: &str = "users";

/// Loads the user map, seeding the configured admin on first run so a fresh
/// deployment has a way in.
pub async fn load(store: &JsonStore, seed: &AdminSeed) -> Result<UserMap, StoreError> {
    store.load_or_init(FILE, || seeded(seed)).await
}

pub async fn save(store: &JsonStore, users: &UserMap) -> Result<(), StoreError> {
    store.save(FILE, users).await
}

fn seeded(seed: &AdminSeed) -> UserMap {
    info!(employee_id = %seed.employee_id, "seeding admin account into empty user store");
    let mut users = UserMap::new();
    users.insert(
        seed.employee_id.clone(),
        UserRecord {
            password_hash: hash_password(&seed.password),
            is_admin: true,
            name: seed.name.clone(),
            email: seed.email.clone(),
        },
    );
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;

    fn seed() -> AdminSeed {
        AdminSeed {
            employee_id: "100269".to_string(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn first_load_seeds_the_admin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("store");

        let users = load(&store, &seed()).await.expect("load");
        let admin = users.get("100269").expect("seeded admin");
        assert!(admin.is_admin);
        assert!(verify_password("admin", &admin.password_hash));
    }

    #[tokio::test]
    async fn seeding_happens_once_not_on_every_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("store");

        let mut users = load(&store, &seed()).await.expect("load");
        users.remove("100269");
        users.insert(
            "100300".to_string(),
            UserRecord {
                password_hash: hash_password("pw"),
                is_admin: false,
                name: "Priya Nair".to_string(),
                email: "priya@example.com".to_string(),
            },
        );
        save(&store, &users).await.expect("save");

        let reloaded = load(&store, &seed()).await.expect("reload");
        assert!(!reloaded.contains_key("100269"));
        assert!(reloaded.contains_key("100300"));
    }

    #[tokio::test]
    async fn store_file_uses_the_password_field_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("store");
        load(&store, &seed()).await.expect("load");

        let raw = std::fs::read_to_string(dir.path().join("users.json")).expect("read file");
        assert!(raw.contains("\"password\""));
        assert!(!raw.contains("password_hash"));
    }
}
