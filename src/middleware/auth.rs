use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{error::AuthError, models::auth::AuthenticatedUser, services::metrics, AppState};

pub const REFRESH_COOKIE: &str = "refresh_token";
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|part| {
            part.trim()
                .strip_prefix(&prefix)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
}

/// The token from `Authorization: Bearer <token>`. Any other scheme, or an
/// empty token, counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// How the caller of a protected route was let in.
enum Caller {
    Authorized(AuthenticatedUser),
    Refreshed {
        user: AuthenticatedUser,
        access_token: String,
    },
}

/// Only an expired or missing access token falls through to the refresh cookie.
/// A forged, malformed or wrong-kind access token is rejected outright.
async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<Caller, AuthError> {
    if let Some(token) = bearer_token(headers) {
        match state.authenticator.authenticate(token).await {
            Ok(user) => return Ok(Caller::Authorized(user)),
            Err(AuthError::Expired) => debug!("access token expired, trying refresh cookie"),
            Err(e) => return Err(e),
        }
    }

    let refresh_token = get_cookie(headers, REFRESH_COOKIE).ok_or(AuthError::TokenMissing)?;
    let access_token = state.sessions.refresh(&refresh_token)?;
    let user = state.authenticator.authenticate(&access_token).await?;

    Ok(Caller::Refreshed { user, access_token })
}

/// Gate for every protected route. Puts the caller's [`AuthenticatedUser`] in the
/// request extensions; when the access token had to be renewed from the refresh
/// cookie, the new one goes back in the `X-New-Access-Token` response header.
pub async fn auto_refresh(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let caller = match resolve_caller(&state, request.headers()).await {
        Ok(caller) => caller,
        Err(e) => {
            debug!("request denied: {}", e);
            return e.into_response();
        }
    };

    match caller {
        Caller::Authorized(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Caller::Refreshed { user, access_token } => {
            request.extensions_mut().insert(user);
            let mut response = next.run(request).await;
            match HeaderValue::from_str(&access_token) {
                Ok(value) => {
                    response.headers_mut().insert(NEW_ACCESS_TOKEN_HEADER, value);
                    metrics::SILENT_REFRESH_COUNTER.with_label_values(&["success"]).inc();
                }
                Err(e) => {
                    warn!("renewed access token is not a valid header value: {}", e);
                    metrics::SILENT_REFRESH_COUNTER.with_label_values(&["failure"]).inc();
                }
            }
            response
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::TokenMissing)
    }
}
