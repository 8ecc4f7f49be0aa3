//! Repository Errors
//!
//! Error types for persistence operations.

/// Errors that can occur while loading or storing aggregates
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Unique constraint violated (e.g. duplicate sale number)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Foreign key violated (unknown customer, branch or product)
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Stored row cannot be mapped back onto the domain
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// The session was already committed
    #[error("Transaction already finished")]
    TransactionClosed,

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let detail = match db_err.constraint() {
                Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                None => db_err.message().to_string(),
            };
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(detail);
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::InvalidReference(detail);
            }
        }
        RepositoryError::Database(err)
    }
}

impl RepositoryError {
    /// Check if this error was caused by the caller's data rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Conflict(_) | RepositoryError::InvalidReference(_)
        )
    }
}
