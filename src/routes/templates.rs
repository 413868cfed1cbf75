use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    models::{
        auth::AuthenticatedUser,
        template::{CreateTemplateRequest, ReceiptTemplate, UpdateTemplateRequest},
    },
    services::templates::TemplateService,
    AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("receipt template query failed: {e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Template not found for this user." })),
    )
}

fn invalid(e: validator::ValidationErrors) -> ApiError {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": e.to_string() })))
}

pub async fn get_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ReceiptTemplate>, ApiError> {
    let template = TemplateService::find(&state.db, user.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(template))
}

pub async fn create_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ReceiptTemplate>), ApiError> {
    let body = body.normalized();
    body.validate().map_err(invalid)?;

    let template = TemplateService::create(&state.db, user.user_id, &body)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            (
                StatusCode::CONFLICT,
                Json(json!({ "detail": "User already has a template. Use PATCH to update it." })),
            )
        })?;

    tracing::info!("receipt template created for user_id={}", user.user_id);
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateTemplateRequest>,
) -> Result<Json<ReceiptTemplate>, ApiError> {
    let body = body.normalized();
    body.validate().map_err(invalid)?;

    let template = TemplateService::update(&state.db, user.user_id, &body)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    Ok(Json(template))
}

/// Always 204, whether or not a template existed.
pub async fn delete_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    if TemplateService::delete(&state.db, user.user_id).await.map_err(internal)? {
        tracing::info!("receipt template deleted for user_id={}", user.user_id);
    }
    Ok(StatusCode::NO_CONTENT)
}
