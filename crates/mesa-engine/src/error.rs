//! # Engine Error Types
//!
//! Error types for lifecycle operations and scheduler jobs.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (mesa-core)      DbError (mesa-db)                          │
//! │       │                          │                                      │
//! │       └──────────┬───────────────┘                                      │
//! │                  ▼                                                      │
//! │           EngineError (this module)                                     │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │           Caller (API layer, mesad, tests)                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain rejections (wrong state, not found, already paid) arrive as
//! `Domain(CoreError)` so callers can match on stable kinds; infrastructure
//! failures stay separate as `Database(DbError)`.

use thiserror::Error;

use mesa_core::CoreError;
use mesa_db::DbError;

/// Errors from lifecycle operations and scheduler jobs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The database layer failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl EngineError {
    /// True when the error is a domain rejection rather than an
    /// infrastructure failure.
    pub fn is_domain(&self) -> bool {
        matches!(self, EngineError::Domain(_))
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_passthrough() {
        let err = EngineError::from(CoreError::TableNotFound("tbl-1".to_string()));
        assert!(err.is_domain());
        assert_eq!(err.to_string(), "Table not found: tbl-1");
    }

    #[test]
    fn test_database_error_is_not_domain() {
        let err = EngineError::from(DbError::ConnectionFailed("pool timed out".to_string()));
        assert!(!err.is_domain());
    }
}
