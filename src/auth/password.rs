use sha2::{Digest, Sha256};

/// Unsalted SHA-256 over the raw password, hex encoded. This is the format
/// existing users.json stores were written with, so it stays; it is a known
/// weakness (no salt, no work factor), which means the store file itself has
/// to be treated as sensitive.
pub fn hash_password(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    hash_password(plain) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_digest() {
        // echo -n admin | sha256sum
        assert_eq!(
            hash_password("admin"),
            "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
        );
    }

    #[test]
    fn verify_roundtrip() {
        let hash = hash_password("Secur3P@ssw0rd!");
        assert!(verify_password("Secur3P@ssw0rd!", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let hash = hash_password("anything");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
