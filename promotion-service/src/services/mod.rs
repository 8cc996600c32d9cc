pub mod paystack;
pub mod store;

pub use paystack::{PaystackClient, PaystackError, TransactionRequest};
pub use store::{InMemoryPromotionStore, MongoPromotionStore, PromotionStore, StoreError};
