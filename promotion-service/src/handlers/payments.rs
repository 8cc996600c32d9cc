//! Paystack promotion payment handlers.
//!
//! Implements transaction initialization and payment verification for book
//! promotions.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mongodb::bson::DateTime;
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{
    InitializeTransactionRequest, InitializeTransactionResponse, VerifyPaymentRequest,
    VerifyPaymentResponse,
};
use crate::models::{BookPromotion, PaymentRecord, PAYMENT_STATUS_SUCCESS};
use crate::services::StoreError;
use crate::AppState;

const VERIFIED_MESSAGE: &str = "Payment verified and book promoted successfully";

/// Create a Paystack transaction for a promotion purchase.
///
/// Validates the payload, asks Paystack for a checkout URL, and stores the
/// returned reference on the book so the later verify call can be tied back
/// to it.
pub async fn initialize_transaction(
    State(state): State<AppState>,
    payload: Result<Json<InitializeTransactionRequest>, JsonRejection>,
) -> Result<Json<InitializeTransactionResponse>, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| AppError::Validation(anyhow::anyhow!(rejection.body_text())))?;

    let request = payload
        .validated()
        .ok_or_else(|| AppError::Validation(anyhow::anyhow!("Missing required fields")))?;

    tracing::info!(
        book_id = %request.book_id,
        plan_id = %request.plan_id,
        amount = request.amount,
        "Initializing promotion transaction"
    );

    let transaction = state.paystack.initialize_transaction(&request).await?;

    state
        .store
        .set_book_reference(&request.book_id, &transaction.reference)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                book_id = %request.book_id,
                "Failed to store payment reference"
            );
            AppError::Database(e.into())
        })?;

    tracing::info!(
        book_id = %request.book_id,
        reference = %transaction.reference,
        "Promotion transaction initialized"
    );

    Ok(Json(InitializeTransactionResponse {
        status: true,
        authorization_url: transaction.authorization_url,
        reference: transaction.reference,
        callback_url: request.callback_url,
    }))
}

/// Verify a Paystack transaction and promote the paid-for book.
///
/// A reference that already has a payment record is answered with the prior
/// result and nothing is written again, so callback retries and page reloads
/// cannot double-promote.
pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| AppError::Validation(anyhow::anyhow!(rejection.body_text())))?;

    let reference = payload
        .reference
        .filter(|reference| !reference.trim().is_empty())
        .ok_or_else(|| AppError::Validation(anyhow::anyhow!("Missing payment reference")))?;

    let prior = state
        .store
        .find_payment_by_reference(&reference)
        .await
        .map_err(|e| AppError::Database(e.into()))?;
    if prior.is_some() {
        tracing::info!(reference = %reference, "Payment already verified, skipping");
        return Ok(Json(VerifyPaymentResponse {
            status: true,
            message: VERIFIED_MESSAGE.to_string(),
        }));
    }

    let transaction = state.paystack.verify_transaction(&reference).await?;

    if transaction.status != PAYMENT_STATUS_SUCCESS {
        tracing::warn!(
            reference = %reference,
            transaction_status = %transaction.status,
            "Transaction is not successful"
        );
        return Err(AppError::Upstream(anyhow::anyhow!("Payment not successful")));
    }

    if !transaction.has_metadata() {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Payment metadata is missing"
        )));
    }

    let book_id = transaction.metadata_field("bookId").ok_or_else(|| {
        AppError::Validation(anyhow::anyhow!(
            "Invalid or missing bookId in payment metadata"
        ))
    })?;
    let plan_id = transaction.metadata_field("planId").ok_or_else(|| {
        AppError::Validation(anyhow::anyhow!(
            "Invalid or missing planId in payment metadata"
        ))
    })?;
    let user_id = transaction.metadata_field("userId").ok_or_else(|| {
        AppError::Validation(anyhow::anyhow!(
            "Invalid or missing userId in payment metadata"
        ))
    })?;

    state
        .store
        .get_book(book_id)
        .await
        .map_err(|e| AppError::Database(e.into()))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "Book with ID {book_id} not found in database"
            ))
        })?;

    let promotion = BookPromotion::for_plan(plan_id);
    let payment = PaymentRecord {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        book_id: book_id.to_string(),
        plan_id: plan_id.to_string(),
        amount: transaction.amount as f64 / 100.0,
        reference: reference.clone(),
        status: PAYMENT_STATUS_SUCCESS.to_string(),
        created_at: DateTime::now(),
    };

    state
        .store
        .record_verified_payment(book_id, &promotion, &payment)
        .await
        .map_err(|e| match e {
            StoreError::BookNotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Book with ID {id} not found in database"))
            }
            other => {
                tracing::error!(error = %other, reference = %reference, "Failed to record payment");
                AppError::Database(other.into())
            }
        })?;

    tracing::info!(
        book_id = %book_id,
        plan_id = %promotion.plan_id,
        reference = %reference,
        "Payment verified and promotion applied"
    );

    Ok(Json(VerifyPaymentResponse {
        status: true,
        message: VERIFIED_MESSAGE.to_string(),
    }))
}
