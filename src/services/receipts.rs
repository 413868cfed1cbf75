use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::receipt::{cents_to_amount, Receipt, ReceiptStats, RecentReceipt};

/// All queries take the owner's id from the authenticated caller, never from the request body.
pub struct ReceiptService;

impl ReceiptService {
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        transaction_date: DateTime<Utc>,
        total_cents: i64,
    ) -> anyhow::Result<Receipt> {
        let receipt = sqlx::query_as::<_, Receipt>(
            "INSERT INTO receipts (receipt_id, user_id, transaction_date, total_cents)
             VALUES ($1, $2, $3, $4)
             RETURNING receipt_id, user_id, transaction_date, total_cents, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(transaction_date)
        .bind(total_cents)
        .fetch_one(pool)
        .await?;
        Ok(receipt)
    }

    pub async fn list(pool: &PgPool, user_id: i64) -> anyhow::Result<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, Receipt>(
            "SELECT receipt_id, user_id, transaction_date, total_cents, created_at
             FROM receipts WHERE user_id = $1
             ORDER BY transaction_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Totals, today's totals (UTC day containing `now`) and the ten most recent receipts.
    pub async fn stats(pool: &PgPool, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<ReceiptStats> {
        let (total_cents, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_cents), 0)::BIGINT, COUNT(*)::BIGINT
             FROM receipts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let (start, end) = utc_day_bounds(now);
        let today_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0)::BIGINT
             FROM receipts
             WHERE user_id = $1 AND transaction_date >= $2 AND transaction_date < $3",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        let recent: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT total_cents, transaction_date FROM receipts
             WHERE user_id = $1
             ORDER BY transaction_date DESC
             LIMIT 10",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(ReceiptStats {
            user_id,
            total: cents_to_amount(total_cents),
            total_today: cents_to_amount(today_cents),
            receipts_count: count,
            recent_receipts: recent
                .into_iter()
                .map(|(cents, transaction_date)| RecentReceipt {
                    total: cents_to_amount(cents),
                    transaction_date,
                })
                .collect(),
        })
    }
}

/// Half-open `[midnight, next midnight)` window in UTC.
pub fn utc_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_utc_day_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap();
        let (start, end) = utc_day_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap());
    }
}
