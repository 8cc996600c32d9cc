//! service-core: shared infrastructure for the promotion platform services.
pub mod error;
pub mod middleware;
pub mod observability;
