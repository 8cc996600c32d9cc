//! Request and response schemas for the two payment operations.
//!
//! Input fields are all `Option` on purpose: presence is part of the
//! operation's validation, not the deserializer's, so a missing field
//! produces the API's 400 envelope instead of a deserialize rejection.

use serde::{Deserialize, Serialize};

use crate::services::paystack::TransactionRequest;

#[derive(Debug, Deserialize)]
pub struct InitializeTransactionRequest {
    pub email: Option<String>,
    pub amount: Option<f64>,
    #[serde(rename = "planId")]
    pub plan_id: Option<String>,
    #[serde(rename = "bookId")]
    pub book_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub callback_url: Option<String>,
}

impl InitializeTransactionRequest {
    /// Required-fields check: every field present and non-blank, amount
    /// positive. Collapses to a single yes/no because the API reports all
    /// misses with one message.
    pub fn validated(self) -> Option<TransactionRequest> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let amount = self.amount.filter(|amount| *amount > 0.0)?;

        Some(TransactionRequest {
            email: present(self.email)?,
            amount,
            plan_id: present(self.plan_id)?,
            book_id: present(self.book_id)?,
            user_id: present(self.user_id)?,
            callback_url: present(self.callback_url)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InitializeTransactionResponse {
    pub status: bool,
    pub authorization_url: String,
    pub reference: String,
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: bool,
    pub message: String,
}
