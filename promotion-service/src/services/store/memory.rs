use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PromotionStore, StoreError};
use crate::models::{Book, BookPromotion, PaymentRecord};

#[derive(Default)]
struct MemoryState {
    books: HashMap<String, Book>,
    payments: Vec<PaymentRecord>,
}

/// In-memory store for tests and local runs without a database.
#[derive(Default, Clone)]
pub struct InMemoryPromotionStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_book(&self, book: Book) {
        let mut state = self.state.write().await;
        state.books.insert(book.id.clone(), book);
    }

    pub async fn book(&self, book_id: &str) -> Option<Book> {
        self.state.read().await.books.get(book_id).cloned()
    }

    pub async fn payments(&self) -> Vec<PaymentRecord> {
        self.state.read().await.payments.clone()
    }
}

#[async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn get_book(&self, book_id: &str) -> Result<Option<Book>, StoreError> {
        Ok(self.state.read().await.books.get(book_id).cloned())
    }

    async fn set_book_reference(&self, book_id: &str, reference: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let book = state
            .books
            .get_mut(book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.to_string()))?;
        book.reference = Some(reference.to_string());
        Ok(())
    }

    async fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .find(|payment| payment.reference == reference)
            .cloned())
    }

    async fn record_verified_payment(
        &self,
        book_id: &str,
        promotion: &BookPromotion,
        payment: &PaymentRecord,
    ) -> Result<(), StoreError> {
        // Single write lock keeps the book update and the payment insert together.
        let mut state = self.state.write().await;
        let book = state
            .books
            .get_mut(book_id)
            .ok_or_else(|| StoreError::BookNotFound(book_id.to_string()))?;

        book.is_promoted = true;
        book.promotion_plan = Some(promotion.plan_id.clone());
        book.promotion_start_date = Some(promotion.start_date);
        book.promotion_end_date = Some(promotion.end_date);
        book.promotion_end_notification_sent = false;

        state.payments.push(payment.clone());
        Ok(())
    }
}
