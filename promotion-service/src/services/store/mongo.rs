use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, ClientSession, Collection, IndexModel};

use super::{PromotionStore, StoreError};
use crate::models::{Book, BookPromotion, PaymentRecord};

#[derive(Clone)]
pub struct MongoPromotionStore {
    client: Client,
    books: Collection<Book>,
    payments: Collection<PaymentRecord>,
}

impl MongoPromotionStore {
    pub fn new(client: &Client, database_name: &str) -> Self {
        let db = client.database(database_name);
        Self {
            client: client.clone(),
            books: db.collection("novels"),
            payments: db.collection("payments"),
        }
    }

    /// Initialize database indexes.
    pub async fn init_indexes(&self) -> Result<(), StoreError> {
        // Unique index on reference backs the one-payment-per-reference check
        let reference_index = IndexModel::builder()
            .keys(doc! { "reference": 1 })
            .options(
                IndexOptions::builder()
                    .name("payment_reference_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.payments.create_index(reference_index, None).await?;

        tracing::info!("Promotion service indexes initialized");
        Ok(())
    }

    async fn apply_promotion(
        &self,
        session: &mut ClientSession,
        book_id: &str,
        promotion: &BookPromotion,
        payment: &PaymentRecord,
    ) -> Result<(), StoreError> {
        let update = doc! {
            "$set": {
                "isPromoted": true,
                "promotionPlan": &promotion.plan_id,
                "promotionStartDate": promotion.start_date,
                "promotionEndDate": promotion.end_date,
                "promotionEndNotificationSent": false,
            }
        };
        let updated = self
            .books
            .update_one_with_session(doc! { "_id": book_id }, update, None, session)
            .await?;
        if updated.matched_count == 0 {
            return Err(StoreError::BookNotFound(book_id.to_string()));
        }

        self.payments
            .insert_one_with_session(payment, None, session)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PromotionStore for MongoPromotionStore {
    async fn get_book(&self, book_id: &str) -> Result<Option<Book>, StoreError> {
        let book = self.books.find_one(doc! { "_id": book_id }, None).await?;
        Ok(book)
    }

    async fn set_book_reference(&self, book_id: &str, reference: &str) -> Result<(), StoreError> {
        let updated = self
            .books
            .update_one(
                doc! { "_id": book_id },
                doc! { "$set": { "reference": reference } },
                None,
            )
            .await?;
        if updated.matched_count == 0 {
            return Err(StoreError::BookNotFound(book_id.to_string()));
        }
        Ok(())
    }

    async fn find_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let payment = self
            .payments
            .find_one(doc! { "reference": reference }, None)
            .await?;
        Ok(payment)
    }

    async fn record_verified_payment(
        &self,
        book_id: &str,
        promotion: &BookPromotion,
        payment: &PaymentRecord,
    ) -> Result<(), StoreError> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        match self
            .apply_promotion(&mut session, book_id, promotion, payment)
            .await
        {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                session.abort_transaction().await.ok();
                Err(err)
            }
        }
    }
}
