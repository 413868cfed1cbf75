use std::env;

use jsonwebtoken::Algorithm;

/// Upper bound for either token lifetime: ten years.
pub const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    /// Pinned signing algorithm. Only the HMAC family is accepted.
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub refresh_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub refresh_cookie_secure: bool,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let algorithm = parse_algorithm(
            &env::var("ALGORITHM").unwrap_or_else(|_| "HS256".into()),
        )?;

        let config = Self {
            database_url: required("DATABASE_URL")?,
            secret_key: required("SECRET_KEY")?,
            algorithm,
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "30".into())
                .parse()?,
            refresh_ttl_minutes: env::var("REFRESH_TTL_MIN")
                .unwrap_or_else(|_| "10080".into())
                .parse()?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                .parse()?,
            refresh_cookie_secure: env::var("REFRESH_COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the token lifecycle cannot work with. Also run by `AppState::new`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret_key.is_empty() {
            anyhow::bail!("SECRET_KEY must not be empty");
        }
        for (key, minutes) in [
            ("ACCESS_TOKEN_EXPIRE_MINUTES", self.access_token_expire_minutes),
            ("REFRESH_TTL_MIN", self.refresh_ttl_minutes),
        ] {
            if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
                anyhow::bail!("{} must be between 1 and {} minutes, got {}", key, MAX_TTL_MINUTES, minutes);
            }
        }
        Ok(())
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refresh_ttl_minutes)
    }
}

/// Parses `ALGORITHM`, rejecting anything outside HS256/HS384/HS512.
/// The token codec signs with a shared secret, so asymmetric algorithms make no sense here.
pub fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg: Algorithm = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown ALGORITHM: {}", raw))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => Err(anyhow::anyhow!("Unsupported ALGORITHM {:?}: only HS256, HS384 and HS512 are allowed", other)),
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
