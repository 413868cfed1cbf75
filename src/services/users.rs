use sqlx::PgPool;

use crate::{models::user::User, services::credentials::hash_password};

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Email and password are required")]
    MissingFields,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct UserService;

impl UserService {
    /// Creates an account with a bcrypt hash of `password`. Returns the new id.
    pub async fn register(
        pool: &PgPool,
        email: &str,
        password: &str,
        company_name: Option<&str>,
        bcrypt_cost: u32,
    ) -> Result<i64, RegisterError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(RegisterError::MissingFields);
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(anyhow::Error::from)?;
        if existing.is_some() {
            return Err(RegisterError::EmailTaken);
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, bcrypt_cost))
            .await
            .map_err(anyhow::Error::from)??;

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, hashed_password, company_name)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(email)
        .bind(hash)
        .bind(company_name)
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(id) => {
                tracing::info!("registered user_id={}", id);
                Ok(id)
            }
            // Lost a race with a concurrent registration for the same email.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(RegisterError::EmailTaken),
            Err(e) => Err(RegisterError::Internal(e.into())),
        }
    }

    pub async fn find_by_id(pool: &PgPool, user_id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, company_name, is_active, created_at
             FROM users WHERE id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }
}
