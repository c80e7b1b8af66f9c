//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure path surfaces one of these kinds; no error is swallowed and
/// the engine never retries internally (retry policy belongs to the caller).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, out-of-range quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced item does not exist.
    #[error("item not found")]
    NotFound,

    /// A decrease was requested that the item's balance cannot cover.
    /// Carries the item's human-readable name.
    #[error("insufficient stock for product {name}")]
    InsufficientStock { name: String },

    /// The per-item lock could not be acquired in time. Transient; safe to
    /// retry.
    #[error("item is busy")]
    Busy,

    /// A conflicting state change was rejected (e.g. deleting an item the
    /// audit log still references).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected storage failure. Fatal to the current call; never leaves
    /// partial state behind.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(name: impl Into<String>) -> Self {
        Self::InsufficientStock { name: name.into() }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
