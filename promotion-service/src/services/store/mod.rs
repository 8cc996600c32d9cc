//! Persistence port for books and payment records.
//!
//! Handlers talk to [`PromotionStore`]; the MongoDB adapter backs production
//! and the in-memory adapter backs tests.

mod memory;
mod mongo;

pub use memory::InMemoryPromotionStore;
pub use mongo::MongoPromotionStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Book, BookPromotion, PaymentRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("book with id {0} not found")]
    BookNotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.into())
    }
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn get_book(&self, book_id: &str) -> Result<Option<Book>, StoreError>;

    /// Attach a gateway reference to an existing book. Returns
    /// [`StoreError::BookNotFound`] when no book matches; never creates one.
    async fn set_book_reference(&self, book_id: &str, reference: &str) -> Result<(), StoreError>;

    async fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Apply a promotion to a book and record the payment that bought it.
    /// Both writes land together or not at all.
    async fn record_verified_payment(
        &self,
        book_id: &str,
        promotion: &BookPromotion,
        payment: &PaymentRecord,
    ) -> Result<(), StoreError>;
}
