use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;

/// What the credential store knows about an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: i64,
    pub email: String,
    pub password_hash: String,
}

/// Lookup interface over wherever user accounts live.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` for unknown or deactivated accounts.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>>;
}

/// Postgres-backed store over the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT id, email, hashed_password FROM users
             WHERE email = $1 AND is_active = TRUE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, email, password_hash)| Credential {
            user_id,
            email,
            password_hash,
        }))
    }
}

/// Process-local store for tests and local tooling.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `password` at `cost` and stores the account, replacing any previous one.
    pub fn insert(&self, user_id: i64, email: &str, password: &str, cost: u32) -> anyhow::Result<()> {
        let password_hash = hash_password(password, cost)?;
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(
            email.to_string(),
            Credential {
                user_id,
                email: email.to_string(),
                password_hash,
            },
        );
        Ok(())
    }

    pub fn remove(&self, email: &str) -> Option<Credential> {
        self.users
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(email)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Credential>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(email).cloned())
    }
}

pub fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Slow salted comparison. A hash bcrypt cannot parse counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("bcrypt verify error: {}", e);
            false
        }
    }
}

/// Runs bcrypt on the blocking pool so a slow cost factor does not stall the runtime.
pub async fn verify_password_blocking(password: String, hash: String) -> anyhow::Result<bool> {
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2", COST).unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same", COST).unwrap();
        let b = hash_password("same", COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unparseable_hash_is_mismatch() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryCredentialStore::new();
        store.insert(7, "a@x.com", "pw", COST).unwrap();

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.user_id, 7);
        assert!(verify_password_blocking("pw".into(), found.password_hash).await.unwrap());

        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());

        store.remove("a@x.com");
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
    }
}
