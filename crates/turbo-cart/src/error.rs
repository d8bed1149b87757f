//! Cart error types.

use thiserror::Error;

/// Errors that can occur in cart operations.
///
/// Absent products are never errors: lookups return `Option` and coupon
/// operations return `bool`.
#[derive(Error, Debug)]
pub enum CartError {
    /// Caller input rejected before touching the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Underlying store failure, propagated unmodified.
    #[error(transparent)]
    Store(#[from] turbo_kv::StoreError),

    /// Unreadable or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored value the cart must parse is corrupt.
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in cart calculation")]
    Overflow,
}

impl From<toml::de::Error> for CartError {
    fn from(e: toml::de::Error) -> Self {
        CartError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CartError {
    fn from(e: serde_json::Error) -> Self {
        CartError::Config(e.to_string())
    }
}

/// Result alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
