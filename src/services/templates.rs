use sqlx::PgPool;

use crate::models::template::{CreateTemplateRequest, ReceiptTemplate, UpdateTemplateRequest};

const COLUMNS: &str = "id, user_id, logo, gst_hst_number, business_name, contact_phone, \
                       contact_email, website_url, created_at, updated_at";

/// Each user owns at most one receipt template; every query is keyed by the caller's id.
pub struct TemplateService;

impl TemplateService {
    pub async fn find(pool: &PgPool, user_id: i64) -> anyhow::Result<Option<ReceiptTemplate>> {
        let template = sqlx::query_as::<_, ReceiptTemplate>(&format!(
            "SELECT {COLUMNS} FROM receipt_templates WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    /// `None` when the user already has a template.
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        req: &CreateTemplateRequest,
    ) -> anyhow::Result<Option<ReceiptTemplate>> {
        let template = sqlx::query_as::<_, ReceiptTemplate>(&format!(
            "INSERT INTO receipt_templates
                 (user_id, logo, gst_hst_number, business_name, contact_phone, contact_email, website_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(&req.logo)
        .bind(&req.gst_hst_number)
        .bind(&req.business_name)
        .bind(&req.contact_phone)
        .bind(&req.contact_email)
        .bind(&req.website_url)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    /// Absent fields keep their stored value. `None` when the user has no template.
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        req: &UpdateTemplateRequest,
    ) -> anyhow::Result<Option<ReceiptTemplate>> {
        let template = sqlx::query_as::<_, ReceiptTemplate>(&format!(
            "UPDATE receipt_templates SET
                 logo           = COALESCE($2, logo),
                 gst_hst_number = COALESCE($3, gst_hst_number),
                 business_name  = COALESCE($4, business_name),
                 contact_phone  = COALESCE($5, contact_phone),
                 contact_email  = COALESCE($6, contact_email),
                 website_url    = COALESCE($7, website_url),
                 updated_at     = NOW()
             WHERE user_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(&req.logo)
        .bind(&req.gst_hst_number)
        .bind(&req.business_name)
        .bind(&req.contact_phone)
        .bind(&req.contact_email)
        .bind(&req.website_url)
        .fetch_optional(pool)
        .await?;
        Ok(template)
    }

    /// Returns whether a template was removed.
    pub async fn delete(pool: &PgPool, user_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM receipt_templates WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
