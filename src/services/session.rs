use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use crate::{
    error::AuthError,
    models::auth::{Subject, TokenKind, TokenPair},
    services::{
        credentials::{hash_password, verify_password_blocking, CredentialStore},
        metrics,
        token::{TokenCodec, TokenError},
    },
};

/// Mints token pairs at login and access tokens at refresh.
/// Holds no per-session state: nothing is written anywhere on issue.
pub struct SessionIssuer {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Verified against when the email is unknown, so both failure paths pay for one bcrypt run.
    dummy_hash: String,
}

impl SessionIssuer {
    pub fn new(
        codec: Arc<TokenCodec>,
        store: Arc<dyn CredentialStore>,
        access_ttl: Duration,
        refresh_ttl: Duration,
        bcrypt_cost: u32,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            codec,
            store,
            access_ttl,
            refresh_ttl,
            dummy_hash: hash_password("timing-equalizer", bcrypt_cost)?,
        })
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Checks the password and returns a fresh access + refresh pair.
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let credential = self.store.find_by_email(email).await?;

        let (hash, credential) = match credential {
            Some(c) => (c.password_hash.clone(), Some(c)),
            None => (self.dummy_hash.clone(), None),
        };
        let valid = verify_password_blocking(password.to_string(), hash).await?;

        let credential = match credential {
            Some(c) if valid => c,
            _ => {
                metrics::LOGINS_COUNTER.with_label_values(&["failure"]).inc();
                debug!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let subject = Subject {
            email: credential.email,
            user_id: credential.user_id,
        };
        let access_token = self.codec.encode(&subject, TokenKind::Access, self.access_ttl)?;
        let refresh_token = self.codec.encode(&subject, TokenKind::Refresh, self.refresh_ttl)?;

        metrics::LOGINS_COUNTER.with_label_values(&["success"]).inc();
        info!("login succeeded for user_id={}", subject.user_id);

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new access token. Stateless: the
    /// refresh token stays valid until its own expiry and is not rotated.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = match self.codec.decode_kind(refresh_token, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                metrics::REFRESH_COUNTER.with_label_values(&["expired"]).inc();
                return Err(AuthError::RefreshExpired);
            }
            Err(TokenError::BadSignature | TokenError::Malformed) => {
                metrics::REFRESH_COUNTER.with_label_values(&["invalid"]).inc();
                return Err(AuthError::InvalidRefresh);
            }
        };

        let access_token = self.issue_access(&Subject::from(&claims))?;
        metrics::REFRESH_COUNTER.with_label_values(&["success"]).inc();
        debug!("access token refreshed for user_id={}", claims.uid);
        Ok(access_token)
    }

    pub fn issue_access(&self, subject: &Subject) -> Result<String, AuthError> {
        Ok(self.codec.encode(subject, TokenKind::Access, self.access_ttl)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::services::{
        clock::{Clock, ManualClock},
        credentials::InMemoryCredentialStore,
    };

    const COST: u32 = 4;

    fn issuer() -> (SessionIssuer, Arc<TokenCodec>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let codec = Arc::new(TokenCodec::new(b"session-secret", Algorithm::HS256, clock.clone()).unwrap());
        let store = Arc::new(InMemoryCredentialStore::new());
        store.insert(1, "a@x.com", "pw", COST).unwrap();
        let issuer = SessionIssuer::new(
            codec.clone(),
            store,
            Duration::minutes(30),
            Duration::days(7),
            COST,
        )
        .unwrap();
        (issuer, codec, clock)
    }

    #[tokio::test]
    async fn test_login_issues_pair_for_same_subject() {
        let (issuer, codec, clock) = issuer();
        let pair = issuer.login("a@x.com", "pw").await.unwrap();

        let access = codec.decode(&pair.access_token).unwrap();
        let refresh = codec.decode(&pair.refresh_token).unwrap();
        assert_eq!(access.sub, "a@x.com");
        assert_eq!(refresh.sub, "a@x.com");
        assert_eq!(access.uid, refresh.uid);
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);

        let now = clock.now_utc();
        assert_eq!(access.exp, (now + Duration::minutes(30)).timestamp());
        assert_eq!(refresh.exp, (now + Duration::days(7)).timestamp());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_identical() {
        let (issuer, _, _) = issuer();
        let wrong = issuer.login("a@x.com", "nope").await.unwrap_err();
        let unknown = issuer.login("ghost@x.com", "pw").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.status(), unknown.status());
        assert_eq!(wrong.detail(), unknown.detail());
    }

    #[tokio::test]
    async fn test_refresh_mints_access_token() {
        let (issuer, codec, clock) = issuer();
        let pair = issuer.login("a@x.com", "pw").await.unwrap();
        let original = codec.decode(&pair.access_token).unwrap();

        clock.advance(Duration::minutes(10));
        let renewed = issuer.refresh(&pair.refresh_token).unwrap();
        let claims = codec.decode(&renewed).unwrap();

        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.sub, original.sub);
        assert_eq!(claims.uid, original.uid);
        assert!(claims.exp > original.exp);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (issuer, _, _) = issuer();
        let pair = issuer.login("a@x.com", "pw").await.unwrap();
        assert!(matches!(
            issuer.refresh(&pair.access_token),
            Err(AuthError::InvalidRefresh)
        ));
    }

    #[tokio::test]
    async fn test_refresh_expired_and_invalid() {
        let (issuer, _, clock) = issuer();
        let pair = issuer.login("a@x.com", "pw").await.unwrap();

        assert!(matches!(issuer.refresh("garbage"), Err(AuthError::InvalidRefresh)));

        clock.advance(Duration::days(8));
        assert!(matches!(
            issuer.refresh(&pair.refresh_token),
            Err(AuthError::RefreshExpired)
        ));
    }

    #[tokio::test]
    async fn test_refresh_is_reusable_until_expiry() {
        let (issuer, _, _) = issuer();
        let pair = issuer.login("a@x.com", "pw").await.unwrap();
        assert!(issuer.refresh(&pair.refresh_token).is_ok());
        assert!(issuer.refresh(&pair.refresh_token).is_ok());
    }
}
