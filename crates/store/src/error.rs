//! Error types for store operations

use keypoint_core::AppError;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`crate::StoreClient`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store has no product with this id
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The store could not be reached or answered with garbage
    #[error("Store request failed: {0}")]
    FetchFailed(String),

    /// A purchase did not complete
    #[error("Purchase failed: {0}")]
    PurchaseFailed(String),

    /// The store did not answer in time
    #[error("Store request timed out")]
    Timeout,

    /// The gate session has ended
    #[error("Gate session is closed")]
    SessionClosed,
}

impl StoreError {
    /// Returns true if asking again might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::FetchFailed(_) | StoreError::Timeout)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::entitlement_fetch(err.to_string())
    }
}
