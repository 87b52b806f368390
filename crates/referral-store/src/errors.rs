//! Errors raised by the SQLite-backed persistence adapter.

use referral_core::CoreError;
use thiserror::Error;

/// Failure modes specific to the persistence layer. Every variant converts
/// into [`CoreError::UpstreamFailure`] except [`StoreError::ReferralNotFound`],
/// which converts into [`CoreError::NotFound`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("migration error: {message}")]
    Migration { message: String },

    #[error("referral not found: {0}")]
    ReferralNotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ReferralNotFound(id) => {
                CoreError::not_found(format!("no referral with id `{id}`"))
            }
            other => CoreError::upstream("the document store is unavailable").with_source(other),
        }
    }
}
