use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    /// Nine-digit business number, optionally followed by a program account such as `RT0001`.
    static ref GST_HST_NUMBER: Regex = Regex::new(r"^\d{9}(RT\d{4})?$").unwrap();
}

/// DB row struct for `receipt_templates`. At most one per user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReceiptTemplate {
    pub id: i64,
    pub user_id: i64,
    pub logo: Option<String>,
    pub gst_hst_number: String,
    pub business_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(url)]
    pub logo: Option<String>,
    #[validate(regex(path = *GST_HST_NUMBER))]
    pub gst_hst_number: String,
    #[validate(length(min = 1, max = 180))]
    pub business_name: String,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
    #[validate(email, length(max = 254))]
    pub contact_email: Option<String>,
    #[validate(url, length(max = 255))]
    pub website_url: Option<String>,
}

/// Partial update: only fields that are present are written.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(url)]
    pub logo: Option<String>,
    #[validate(regex(path = *GST_HST_NUMBER))]
    pub gst_hst_number: Option<String>,
    #[validate(length(min = 1, max = 180))]
    pub business_name: Option<String>,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
    #[validate(email, length(max = 254))]
    pub contact_email: Option<String>,
    #[validate(url, length(max = 255))]
    pub website_url: Option<String>,
}

impl CreateTemplateRequest {
    /// Trims the phone number before validation, the way it is stored.
    pub fn normalized(mut self) -> Self {
        self.contact_phone = self.contact_phone.map(|p| p.trim().to_string());
        self
    }
}

impl UpdateTemplateRequest {
    pub fn normalized(mut self) -> Self {
        self.contact_phone = self.contact_phone.map(|p| p.trim().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> CreateTemplateRequest {
        CreateTemplateRequest {
            logo: Some("https://acme.test/logo.png".into()),
            gst_hst_number: "123456789RT0001".into(),
            business_name: "Acme Coffee".into(),
            contact_phone: Some("  +1 555 0100 ".into()),
            contact_email: Some("billing@acme.test".into()),
            website_url: None,
        }
    }

    #[test]
    fn test_create_request_accepts_valid_template() {
        let req = create().normalized();
        assert!(req.validate().is_ok());
        assert_eq!(req.contact_phone.as_deref(), Some("+1 555 0100"));

        let mut req = create();
        req.gst_hst_number = "123456789".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_gst_hst_number_format() {
        for bad in ["", "12345678", "1234567890", "123456789RT1", "123456789rt0001", "ABCDEFGHI"] {
            let mut req = create();
            req.gst_hst_number = bad.into();
            let errors = req.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("gst_hst_number"), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_create_request_field_rules() {
        let mut req = create();
        req.business_name = String::new();
        assert!(req.validate().is_err());

        let mut req = create();
        req.business_name = "x".repeat(181);
        assert!(req.validate().is_err());

        let mut req = create();
        req.contact_email = Some("not-an-email".into());
        assert!(req.validate().is_err());

        let mut req = create();
        req.website_url = Some("not a url".into());
        assert!(req.validate().is_err());

        let mut req = create();
        req.contact_phone = Some("9".repeat(31));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_validates_only_present_fields() {
        assert!(UpdateTemplateRequest::default().validate().is_ok());

        let req: UpdateTemplateRequest = serde_json::from_str(r#"{"business_name": "Renamed"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.gst_hst_number.is_none());

        let req: UpdateTemplateRequest = serde_json::from_str(r#"{"gst_hst_number": "12"}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
