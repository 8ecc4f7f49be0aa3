//! Field-level validation
//!
//! Both validation passes (command validators and aggregate invariant checks)
//! report problems as a list of [`ValidationFailure`] instead of failing fast,
//! so callers can surface every offending field at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Re-root this failure under a parent field, e.g. `items[2].quantity`
    pub fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{}.{}", parent, self.field),
            message: self.message,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulates failures for one object
#[derive(Debug, Default)]
pub struct Validator {
    failures: Vec<ValidationFailure>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure when `condition` does not hold
    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.failures.push(ValidationFailure::new(field, message));
        }
        self
    }

    /// Required text with an upper length bound (in characters)
    pub fn text(&mut self, value: &str, field: &str, max_len: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.failures
                .push(ValidationFailure::new(field, format!("{} must not be empty", field)));
        } else if value.chars().count() > max_len {
            self.failures.push(ValidationFailure::new(
                field,
                format!("{} must be at most {} characters", field, max_len),
            ));
        }
        self
    }

    /// Optional text with an upper length bound
    pub fn optional_text(&mut self, value: Option<&str>, field: &str, max_len: usize) -> &mut Self {
        if let Some(value) = value {
            if value.chars().count() > max_len {
                self.failures.push(ValidationFailure::new(
                    field,
                    format!("{} must be at most {} characters", field, max_len),
                ));
            }
        }
        self
    }

    /// Identifiers must not be the nil UUID
    pub fn id(&mut self, value: uuid::Uuid, field: &str) -> &mut Self {
        self.check(!value.is_nil(), field, format!("{} must not be empty", field))
    }

    /// Append failures produced by a nested object
    pub fn nested(&mut self, parent: &str, failures: Vec<ValidationFailure>) -> &mut Self {
        self.failures
            .extend(failures.into_iter().map(|f| f.nested(parent)));
        self
    }

    pub fn finish(&mut self) -> Vec<ValidationFailure> {
        std::mem::take(&mut self.failures)
    }
}
