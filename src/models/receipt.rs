use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// DB row struct for `receipts`. Amounts are stored in cents.
#[derive(Debug, Clone, FromRow)]
pub struct Receipt {
    pub receipt_id: Uuid,
    pub user_id: i64,
    pub transaction_date: DateTime<Utc>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    /// Defaults to the time the receipt is created.
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
    pub total: f64,
}

impl CreateReceiptRequest {
    pub fn transaction_date_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.transaction_date.unwrap_or(now)
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub receipt_id: Uuid,
    pub user_id: i64,
    pub transaction_date: DateTime<Utc>,
    pub total: f64,
}

impl From<Receipt> for ReceiptResponse {
    fn from(r: Receipt) -> Self {
        Self {
            receipt_id: r.receipt_id,
            user_id: r.user_id,
            transaction_date: r.transaction_date,
            total: cents_to_amount(r.total_cents),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentReceipt {
    pub total: f64,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptStats {
    pub user_id: i64,
    pub total: f64,
    pub total_today: f64,
    pub receipts_count: i64,
    pub recent_receipts: Vec<RecentReceipt>,
}

/// `None` for negative, non-finite or absurdly large amounts.
pub fn amount_to_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount < 0.0 || amount > 1e13 {
        return None;
    }
    Some((amount * 100.0).round() as i64)
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}
