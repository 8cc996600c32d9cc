use chrono::{Duration, Utc};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plan identifier that maps to the short (30-day) promotion window. Every
/// other plan id gets the 60-day window.
pub const ONE_MONTH_PLAN: &str = "1-month";

/// A book document. Books are created elsewhere; this service only mutates
/// the payment reference and the promotion fields. Field names stay camelCase
/// to line up with the pre-existing documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub is_promoted: bool,
    #[serde(default)]
    pub promotion_plan: Option<String>,
    #[serde(default)]
    pub promotion_start_date: Option<DateTime>,
    #[serde(default)]
    pub promotion_end_date: Option<DateTime>,
    #[serde(default)]
    pub promotion_end_notification_sent: bool,
}

impl Book {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference: None,
            is_promoted: false,
            promotion_plan: None,
            promotion_start_date: None,
            promotion_end_date: None,
            promotion_end_notification_sent: false,
        }
    }
}

/// Ledger entry appended once per successfully verified payment. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub book_id: String,
    pub plan_id: String,
    /// Base currency units (naira), converted from the gateway's minor units.
    pub amount: f64,
    pub reference: String,
    pub status: String,
    pub created_at: DateTime,
}

/// Status written on every payment record this service creates.
pub const PAYMENT_STATUS_SUCCESS: &str = "success";

/// The promotion fields written onto a book by a verified payment.
#[derive(Debug, Clone)]
pub struct BookPromotion {
    pub plan_id: String,
    pub start_date: DateTime,
    pub end_date: DateTime,
}

impl BookPromotion {
    /// Starts a promotion now. `"1-month"` runs 30 days; any other plan id
    /// runs 60.
    pub fn for_plan(plan_id: &str) -> Self {
        let days = if plan_id == ONE_MONTH_PLAN { 30 } else { 60 };
        let start = Utc::now();

        Self {
            plan_id: plan_id.to_string(),
            start_date: DateTime::from_chrono(start),
            end_date: DateTime::from_chrono(start + Duration::days(days)),
        }
    }
}
