use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    models::{
        auth::AuthenticatedUser,
        receipt::{amount_to_cents, CreateReceiptRequest, ReceiptResponse, ReceiptStats},
    },
    services::{clock::Clock, metrics, receipts::ReceiptService},
    AppState,
};

fn internal(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("receipts query failed: {e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
}

pub async fn create_receipt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateReceiptRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>), (StatusCode, Json<Value>)> {
    let total_cents = amount_to_cents(body.total).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Total must be a non-negative amount" })),
        )
    })?;

    let transaction_date = body.transaction_date_or(state.codec.clock().now_utc());
    let receipt = ReceiptService::create(&state.db, user.user_id, transaction_date, total_cents)
        .await
        .map_err(internal)?;
    metrics::RECEIPTS_COUNTER.inc();

    Ok((StatusCode::CREATED, Json(receipt.into())))
}

pub async fn list_receipts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ReceiptResponse>>, (StatusCode, Json<Value>)> {
    let receipts = ReceiptService::list(&state.db, user.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(receipts.into_iter().map(Into::into).collect()))
}

pub async fn receipt_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ReceiptStats>, (StatusCode, Json<Value>)> {
    let now = state.codec.clock().now_utc();
    let stats = ReceiptService::stats(&state.db, user.user_id, now)
        .await
        .map_err(internal)?;
    Ok(Json(stats))
}
