use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;

/// Errors that abort a sync operation as a whole
///
/// Per-asset failures inside a full pass are not errors; they are reported
/// through `SyncSummary::failed_symbols`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested asset does not exist
    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    /// Upstream returned nothing and there is no stored price to fall back on
    #[error("No price available for {0}")]
    NoPriceAvailable(String),

    /// The store failed outside the per-asset loop
    #[error("Repository error: {0}")]
    Repository(#[from] DatabaseError),

    /// A blocking store task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// Returns true if the error means the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::AssetNotFound(_) | SyncError::NoPriceAvailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(SyncError::AssetNotFound(Uuid::new_v4()).is_not_found());
        assert!(SyncError::NoPriceAvailable("AAPL".to_string()).is_not_found());
        assert!(!SyncError::TaskFailed("panic".to_string()).is_not_found());
    }
}
