//! Argon2 password hashes in PHC string form.

use anyhow::Context;
use argon2::Config;

/// Cost parameters; production uses the library defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub mem_cost_kib: u32,
    pub time_cost: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        let d = Config::default();
        Self {
            mem_cost_kib: d.mem_cost,
            time_cost: d.time_cost,
        }
    }
}

pub fn hash_password(password: &str, cost: HashCost) -> anyhow::Result<String> {
    let salt: [u8; 16] = rand::random();
    let config = Config {
        mem_cost: cost.mem_cost_kib,
        time_cost: cost.time_cost,
        ..Config::default()
    };
    argon2::hash_encoded(password.as_bytes(), &salt, &config).context("failed to hash password")
}

/// Malformed hashes never verify.
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: &str, cost: HashCost) -> anyhow::Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .context("password hashing task failed")?
}

/// [`verify_password`] on the blocking pool. A failed task never verifies.
pub async fn verify_password_blocking(encoded: &str, password: &str) -> bool {
    let (encoded, password) = (encoded.to_owned(), password.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&encoded, &password))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: HashCost = HashCost {
        mem_cost_kib: 64,
        time_cost: 1,
    };

    #[test]
    fn hash_verifies_only_the_same_password() {
        let h = hash_password("s3cret", CHEAP).unwrap();
        assert!(h.starts_with("$argon2"));
        assert!(verify_password(&h, "s3cret"));
        assert!(!verify_password(&h, "s3cret "));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same", CHEAP).unwrap();
        let b = hash_password("same", CHEAP).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        assert!(!verify_password("not-a-hash", "x"));
    }

    #[tokio::test]
    async fn blocking_pool_variants_agree() {
        let h = hash_password_blocking("pool", CHEAP).await.unwrap();
        assert!(verify_password_blocking(&h, "pool").await);
        assert!(!verify_password_blocking(&h, "other").await);
    }
}
