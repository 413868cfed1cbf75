use std::sync::Arc;

use crate::{
    error::AuthError,
    models::auth::{AuthenticatedUser, Claims, TokenKind},
    services::{credentials::CredentialStore, token::TokenCodec},
};

/// Turns a presented access token into a live caller.
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    /// Decode, require an access token, then confirm the account still exists.
    /// Decode failures return before the store is consulted.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.codec.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(AuthError::Malformed);
        }
        self.resolve(&claims).await
    }

    async fn resolve(&self, claims: &Claims) -> Result<AuthenticatedUser, AuthError> {
        let credential = self
            .store
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        // Same email, different account: the one the token was minted for is gone.
        if credential.user_id != claims.uid {
            return Err(AuthError::UnknownSubject);
        }

        Ok(AuthenticatedUser {
            user_id: credential.user_id,
            email: credential.email,
        })
    }
}
