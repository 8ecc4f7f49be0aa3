//! Sale status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleStatus {
    Pending,
    Closed,
    Paid,
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [Self::Pending, Self::Closed, Self::Paid, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "Pending",
            SaleStatus::Closed => "Closed",
            SaleStatus::Paid => "Paid",
            SaleStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sale status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SaleStatus {
    type Err = UnknownStatus;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
