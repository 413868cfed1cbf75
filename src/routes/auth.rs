use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AuthError,
    middleware::auth::{get_cookie, REFRESH_COOKIE},
    models::{
        auth::{AuthenticatedUser, LoginRequest, RegisterRequest, TokenResponse},
        user::UserProfile,
    },
    services::users::{RegisterError, UserService},
    AppState,
};

/// `Set-Cookie` value carrying the refresh token. Never readable from page script.
fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { " Secure;" } else { "" };
    format!("{REFRESH_COOKIE}={token}; HttpOnly;{secure} SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let pair = state.sessions.login(&body.email, &body.password).await?;

    let cookie = refresh_cookie(
        &pair.refresh_token,
        state.sessions.refresh_ttl().num_seconds(),
        state.config.refresh_cookie_secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse::bearer(pair.access_token)),
    )
        .into_response())
}

pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AuthError> {
    let refresh = get_cookie(&headers, REFRESH_COOKIE).ok_or(AuthError::TokenMissing)?;
    let access_token = state.sessions.refresh(&refresh)?;
    Ok(Json(TokenResponse::bearer(access_token)))
}

pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, refresh_cookie("", 0, state.config.refresh_cookie_secure))],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    UserService::register(
        &state.db,
        &body.email,
        &body.password,
        body.company_name.as_deref(),
        state.config.bcrypt_cost,
    )
    .await
    .map(|_| {
        (
            StatusCode::CREATED,
            Json(json!({ "message": "User created successfully" })),
        )
    })
    .map_err(|e| match e {
        RegisterError::EmailTaken | RegisterError::MissingFields => {
            (StatusCode::BAD_REQUEST, Json(json!({ "detail": e.to_string() })))
        }
        RegisterError::Internal(err) => {
            tracing::error!("register failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal server error" })),
            )
        }
    })
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, (StatusCode, Json<Value>)> {
    let profile = UserService::find_by_id(&state.db, user.user_id)
        .await
        .map_err(|e| {
            tracing::error!("me lookup failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal server error" })),
            )
        })?
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({ "detail": "User not found" }))))?;

    Ok(Json(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let c = refresh_cookie("tok", 3600, true);
        assert_eq!(c, "refresh_token=tok; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=3600");

        let c = refresh_cookie("tok", 60, false);
        assert_eq!(c, "refresh_token=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=60");
    }
}
