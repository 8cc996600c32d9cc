//! Paystack payment gateway client.
//!
//! Implements transaction initialization and verification against the
//! Paystack API. Amounts cross the wire in kobo (minor units); callers work
//! in naira.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

use crate::config::PaystackConfig;

/// Paystack client for creating and verifying transactions.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    config: PaystackConfig,
}

#[derive(Debug, Error)]
pub enum PaystackError {
    /// Paystack answered with a well-formed envelope and `status: false`.
    #[error("{message}")]
    Api { message: String },
    /// The response body did not match the envelope shape.
    #[error("unexpected paystack response: {0}")]
    Decode(String),
    /// Network-level failure: connect, timeout, TLS.
    #[error("paystack request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<PaystackError> for AppError {
    fn from(err: PaystackError) -> Self {
        match err {
            // The gateway rejected the request; its message goes to the caller.
            PaystackError::Api { message } => AppError::Upstream(anyhow::anyhow!(message)),
            // Everything else is our problem, not the caller's.
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// A transaction to initialize, in display currency units.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub email: String,
    /// Naira. Converted to kobo on the wire.
    pub amount: f64,
    pub plan_id: String,
    pub book_id: String,
    pub user_id: String,
    pub callback_url: String,
}

/// Wire body for `POST /transaction/initialize`.
#[derive(Debug, Serialize)]
struct InitializeTransactionBody<'a> {
    email: &'a str,
    /// Kobo.
    amount: u64,
    currency: &'a str,
    metadata: TransactionMetadata<'a>,
    callback_url: &'a str,
}

/// Echoed back verbatim by the verify endpoint.
#[derive(Debug, Serialize)]
struct TransactionMetadata<'a> {
    #[serde(rename = "planId")]
    plan_id: &'a str,
    #[serde(rename = "bookId")]
    book_id: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

impl<'a> From<&'a TransactionRequest> for InitializeTransactionBody<'a> {
    fn from(request: &'a TransactionRequest) -> Self {
        Self {
            email: &request.email,
            amount: (request.amount * 100.0).round() as u64,
            currency: "NGN",
            metadata: TransactionMetadata {
                plan_id: &request.plan_id,
                book_id: &request.book_id,
                user_id: &request.user_id,
            },
            callback_url: &request.callback_url,
        }
    }
}

/// `data` of a successful initialize response.
#[derive(Debug, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub reference: String,
}

/// `data` of a verify response.
#[derive(Debug, Deserialize)]
pub struct VerifiedTransaction {
    /// Gateway-side transaction state: `success`, `pending`, `failed`, ...
    pub status: String,
    /// Kobo.
    pub amount: u64,
    /// Kept raw: Paystack sends an object, an empty string, or nothing.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl VerifiedTransaction {
    /// Absent, `null`, and empty-string metadata all count as missing.
    pub fn has_metadata(&self) -> bool {
        match &self.metadata {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Trimmed string value of a metadata field. Non-strings and blank
    /// strings yield `None`.
    pub fn metadata_field(&self, name: &str) -> Option<&str> {
        self.metadata
            .get(name)?
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Every Paystack response wraps its payload in this envelope. `message`
/// and `data` decode to `None` when absent or `null`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create Paystack HTTP client")?;

        Ok(Self { client, config })
    }

    /// Create a transaction. Returns the authorization URL the payer is sent
    /// to and the reference that identifies the transaction from here on.
    pub async fn initialize_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<InitializedTransaction, PaystackError> {
        let url = format!("{}/transaction/initialize", self.config.api_base_url);
        let body = InitializeTransactionBody::from(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = %status, body = %text, "Paystack initialize response");

        let transaction: InitializedTransaction =
            decode_envelope(&text, "Failed to initialize transaction")?;
        tracing::info!(
            reference = %transaction.reference,
            "Paystack transaction initialized"
        );
        Ok(transaction)
    }

    /// Look up the state of a transaction by reference.
    pub async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaystackError> {
        let url = format!(
            "{}/transaction/verify/{}",
            self.config.api_base_url, reference
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = %status, body = %text, "Paystack verify response");

        let transaction: VerifiedTransaction = decode_envelope(&text, "Payment verification failed")?;
        tracing::debug!(
            reference = %reference,
            transaction_status = %transaction.status,
            "Paystack transaction verified"
        );
        Ok(transaction)
    }
}

/// Unwrap the `{status, message, data}` envelope. `status: false` becomes
/// [`PaystackError::Api`] with the gateway's message when it sent one; a body
/// that does not fit the envelope becomes [`PaystackError::Decode`].
fn decode_envelope<T: DeserializeOwned>(
    body: &str,
    failure_message: &str,
) -> Result<T, PaystackError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|err| PaystackError::Decode(err.to_string()))?;

    if !envelope.status {
        return Err(PaystackError::Api {
            message: envelope
                .message
                .unwrap_or_else(|| failure_message.to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| PaystackError::Decode("envelope has no data field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> TransactionRequest {
        TransactionRequest {
            email: "reader@example.com".into(),
            amount: 5000.0,
            plan_id: "1-month".into(),
            book_id: "B1".into(),
            user_id: "U1".into(),
            callback_url: "https://books.example.com/payment/done".into(),
        }
    }

    #[test]
    fn initialize_body_converts_naira_to_kobo() {
        let request = request();
        let body = serde_json::to_value(InitializeTransactionBody::from(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "email": "reader@example.com",
                "amount": 500_000,
                "currency": "NGN",
                "metadata": { "planId": "1-month", "bookId": "B1", "userId": "U1" },
                "callback_url": "https://books.example.com/payment/done"
            })
        );
    }

    #[test]
    fn fractional_naira_amounts_round_to_whole_kobo() {
        let mut request = request();
        request.amount = 49.999;
        let body = serde_json::to_value(InitializeTransactionBody::from(&request)).unwrap();
        assert_eq!(body["amount"], 5000);
    }

    #[test]
    fn successful_envelope_yields_the_data() {
        let transaction: InitializedTransaction = decode_envelope(
            &json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/abc",
                    "access_code": "abc",
                    "reference": "ref-1"
                }
            })
            .to_string(),
            "fallback",
        )
        .unwrap();

        assert_eq!(transaction.reference, "ref-1");
        assert_eq!(
            transaction.authorization_url,
            "https://checkout.paystack.com/abc"
        );
    }

    #[test]
    fn failed_envelope_surfaces_the_gateway_message() {
        let result: Result<InitializedTransaction, _> = decode_envelope(
            &json!({ "status": false, "message": "Invalid key" }).to_string(),
            "fallback",
        );

        match result {
            Err(PaystackError::Api { message }) => assert_eq!(message, "Invalid key"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn failed_envelope_without_message_uses_the_fallback() {
        let result: Result<InitializedTransaction, _> =
            decode_envelope(&json!({ "status": false }).to_string(), "fallback");

        match result {
            Err(PaystackError::Api { message }) => assert_eq!(message, "fallback"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bodies_are_decode_errors() {
        let result: Result<InitializedTransaction, _> =
            decode_envelope("<html>Bad Gateway</html>", "fallback");
        assert!(matches!(result, Err(PaystackError::Decode(_))));

        let result: Result<InitializedTransaction, _> =
            decode_envelope(&json!({ "status": true }).to_string(), "fallback");
        assert!(matches!(result, Err(PaystackError::Decode(_))));
    }

    #[test]
    fn null_message_and_data_decode_as_absent() {
        let result: Result<VerifiedTransaction, _> = decode_envelope(
            &json!({ "status": true, "message": null, "data": null }).to_string(),
            "fallback",
        );
        assert!(matches!(result, Err(PaystackError::Decode(_))));

        let result: Result<VerifiedTransaction, _> = decode_envelope(
            &json!({ "status": false, "message": null }).to_string(),
            "fallback",
        );
        match result {
            Err(PaystackError::Api { message }) => assert_eq!(message, "fallback"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn metadata_presence_follows_the_gateway_quirks() {
        let with_object: VerifiedTransaction = serde_json::from_value(json!({
            "status": "success",
            "amount": 500_000,
            "metadata": { "planId": "1-month", "bookId": " B1 ", "userId": "U1" }
        }))
        .unwrap();
        assert!(with_object.has_metadata());
        assert_eq!(with_object.metadata_field("bookId"), Some("B1"));
        assert_eq!(with_object.metadata_field("missing"), None);

        // Paystack sends "" when no metadata was attached.
        let with_empty_string: VerifiedTransaction = serde_json::from_value(json!({
            "status": "success",
            "amount": 500_000,
            "metadata": ""
        }))
        .unwrap();
        assert!(!with_empty_string.has_metadata());

        let without: VerifiedTransaction = serde_json::from_value(json!({
            "status": "abandoned",
            "amount": 500_000
        }))
        .unwrap();
        assert!(!without.has_metadata());
    }

    #[test]
    fn non_string_and_blank_metadata_fields_yield_none() {
        let transaction: VerifiedTransaction = serde_json::from_value(json!({
            "status": "success",
            "amount": 1000,
            "metadata": { "planId": 3, "bookId": "   ", "userId": "U1" }
        }))
        .unwrap();

        assert_eq!(transaction.metadata_field("planId"), None);
        assert_eq!(transaction.metadata_field("bookId"), None);
        assert_eq!(transaction.metadata_field("userId"), Some("U1"));
    }
}
