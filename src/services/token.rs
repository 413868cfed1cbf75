use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};

use crate::{
    config::Config,
    error::AuthError,
    models::auth::{Claims, Subject, TokenKind},
    services::clock::Clock,
};

/// Why a token string was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed => AuthError::Malformed,
            TokenError::BadSignature => AuthError::BadSignature,
            TokenError::Expired => AuthError::Expired,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Signs and verifies claim sets with one process-wide secret and exactly one
/// HMAC algorithm. Immutable after construction; share it behind an `Arc`.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("Token codec only supports HMAC algorithms, got {:?}", algorithm);
        }
        if secret.is_empty() {
            anyhow::bail!("Token codec secret must not be empty");
        }

        // `Validation::new` pins `algorithms` to this single entry. Expiry is
        // checked below against the injected clock, not the system time.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Self::new(config.secret_key.as_bytes(), config.algorithm, clock)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Stamps `iat = now` and `exp = now + ttl`, then signs.
    /// A zero or negative `ttl` yields a token that is already expired; a `ttl`
    /// past the representable date range is an error.
    pub fn encode(&self, subject: &Subject, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        let now = self.clock.now_utc();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow::anyhow!("Token lifetime {} overflows the date range", ttl))?;
        let claims = Claims {
            sub: subject.email.clone(),
            uid: subject.user_id,
            kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verifies signature and algorithm, parses the claims, then checks
    /// `now < exp`. The token kind is returned, not enforced; callers decide
    /// which kind they accept.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token.trim(), &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if self.clock.now_utc().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Decode and require a specific kind. A wrong kind is reported as `Malformed`:
    /// the token is authentic but not usable here.
    pub fn decode_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.kind != expected {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::services::clock::{ManualClock, SystemClock};

    const SECRET: &[u8] = b"test-secret-key-with-enough-entropy";

    fn subject() -> Subject {
        Subject {
            email: "a@x.com".to_string(),
            user_id: 42,
        }
    }

    fn manual_codec() -> (TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let codec = TokenCodec::new(SECRET, Algorithm::HS256, clock.clone()).unwrap();
        (codec, clock)
    }

    #[test]
    fn test_round_trip_preserves_claims() {
        let (codec, clock) = manual_codec();
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = codec.encode(&subject(), kind, Duration::minutes(15)).unwrap();
            let claims = codec.decode(&token).unwrap();
            assert_eq!(claims.sub, "a@x.com");
            assert_eq!(claims.uid, 42);
            assert_eq!(claims.kind, kind);
            assert_eq!(claims.exp, (clock.now_utc() + Duration::minutes(15)).timestamp());
        }
    }

    #[test]
    fn test_zero_and_negative_ttl_are_expired() {
        let (codec, _) = manual_codec();
        for ttl in [Duration::zero(), Duration::seconds(-1), Duration::days(-3)] {
            let token = codec.encode(&subject(), TokenKind::Access, ttl).unwrap();
            assert_eq!(codec.decode(&token), Err(TokenError::Expired));
        }
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let (codec, _) = manual_codec();
        for ttl in [Duration::days(365 * 1_000_000), Duration::days(-365 * 1_000_000)] {
            assert!(codec.encode(&subject(), TokenKind::Refresh, ttl).is_err());
        }
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let (codec, clock) = manual_codec();
        let token = codec.encode(&subject(), TokenKind::Access, Duration::seconds(60)).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(codec.decode(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampering_any_byte_is_rejected() {
        let (codec, _) = manual_codec();
        let token = codec.encode(&subject(), TokenKind::Access, Duration::minutes(5)).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let err = codec.decode(&tampered).unwrap_err();
            assert!(
                matches!(err, TokenError::BadSignature | TokenError::Malformed),
                "byte {i} tampered but got {err:?}"
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let (codec, _) = manual_codec();
        let other = TokenCodec::new(b"another-secret", Algorithm::HS256, Arc::new(SystemClock)).unwrap();
        let token = other.encode(&subject(), TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let (codec, _) = manual_codec();
        let hs512 = TokenCodec::new(SECRET, Algorithm::HS512, Arc::new(SystemClock)).unwrap();
        let token = hs512.encode(&subject(), TokenKind::Access, Duration::minutes(5)).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (codec, _) = manual_codec();
        for raw in ["", "not-a-token", "a.b", "a.b.c", "....", "eyJhbGciOiJub25lIn0.e30."] {
            assert_eq!(codec.decode(raw), Err(TokenError::Malformed), "input {raw:?}");
        }
    }

    #[test]
    fn test_expired_and_tampered_reports_bad_signature() {
        let (codec, clock) = manual_codec();
        let token = codec.encode(&subject(), TokenKind::Access, Duration::seconds(1)).unwrap();
        clock.advance(Duration::hours(1));

        let (head, sig) = token.rsplit_once('.').unwrap();
        let forged = format!("{head}.{}", sig.chars().rev().collect::<String>());
        let err = codec.decode(&forged).unwrap_err();
        assert_ne!(err, TokenError::Expired);
    }

    #[test]
    fn test_decode_kind_enforces_kind() {
        let (codec, _) = manual_codec();
        let refresh = codec.encode(&subject(), TokenKind::Refresh, Duration::minutes(5)).unwrap();
        let access = codec.encode(&subject(), TokenKind::Access, Duration::minutes(5)).unwrap();

        assert_eq!(codec.decode_kind(&refresh, TokenKind::Access), Err(TokenError::Malformed));
        assert_eq!(codec.decode_kind(&access, TokenKind::Refresh), Err(TokenError::Malformed));
        assert!(codec.decode_kind(&access, TokenKind::Access).is_ok());
        assert!(codec.decode_kind(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_rejects_asymmetric_algorithm() {
        assert!(TokenCodec::new(SECRET, Algorithm::RS256, Arc::new(SystemClock)).is_err());
        assert!(TokenCodec::new(b"", Algorithm::HS256, Arc::new(SystemClock)).is_err());
    }
}
