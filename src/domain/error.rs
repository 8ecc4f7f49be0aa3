//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Operation is not legal in the current state of the entity
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation received an argument outside its allowed range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DomainError {
    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidState(msg) | Self::InvalidArgument(msg) => msg,
        }
    }

    /// Check if this is a state machine violation
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_error() {
        let err = DomainError::invalid_state("Sale is already cancelled");

        assert!(err.is_invalid_state());
        assert_eq!(err.message(), "Sale is already cancelled");
        assert_eq!(err.to_string(), "Invalid state: Sale is already cancelled");
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = DomainError::invalid_argument("Discount must be between 0 and 100");

        assert!(!err.is_invalid_state());
        assert!(err.to_string().contains("between 0 and 100"));
    }
}
