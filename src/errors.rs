//! # Error Types Module
//!
//! Structured errors for the storage and menu layers. Validation failures in the
//! admin wizard are not errors; see [`crate::wizard::Rejection`].

use thiserror::Error;

/// Errors produced by the record access layer and the domain services
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update or delete targeted a row that does not exist
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// A lookup that must match at most one row matched several
    #[error("Expected at most one row in {table}, found several")]
    MultipleRows { table: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors produced while resolving menu content
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Unknown menu level: {0}")]
    UnknownLevel(u8),

    #[error("Banner page '{0}' does not exist")]
    MissingBanner(String),

    /// Level 2 needs the category to list
    #[error("Product menu requested without a category")]
    MissingCategory,

    /// The requested page of a non-empty list had no items
    #[error("Page {0} is empty")]
    EmptyPage(usize),

    /// Level 3 needs the user the cart belongs to
    #[error("Cart menu requested without a user")]
    MissingUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for MenuError {
    fn from(err: sqlx::Error) -> Self {
        MenuError::Store(StoreError::Database(err))
    }
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience `Result` type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
