// Library exports for the API binary and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::Config;
use services::{
    authenticator::Authenticator, clock::Clock, credentials::CredentialStore,
    session::SessionIssuer, token::TokenCodec,
};

/// Application state shared across all handlers. Everything in it is read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub codec: Arc<TokenCodec>,
    pub sessions: Arc<SessionIssuer>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    /// Wires the token lifecycle around one codec built from `config`.
    pub fn new(
        db: PgPool,
        config: Arc<Config>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let codec = Arc::new(TokenCodec::from_config(&config, clock)?);
        let sessions = Arc::new(SessionIssuer::new(
            codec.clone(),
            store.clone(),
            config.access_ttl(),
            config.refresh_ttl(),
            config.bcrypt_cost,
        )?);
        let authenticator = Arc::new(Authenticator::new(codec.clone(), store));

        Ok(Self {
            db,
            config,
            codec,
            sessions,
            authenticator,
        })
    }
}
