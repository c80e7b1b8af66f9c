use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, ItemId, TransactionId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Stock received ("in" on the wire).
    #[serde(rename = "in")]
    Increase,
    /// Stock issued ("out" on the wire).
    #[serde(rename = "out")]
    Decrease,
}

impl Direction {
    /// Parse the wire form. The vocabulary is closed; anything else fails.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "in" => Ok(Self::Increase),
            "out" => Ok(Self::Decrease),
            _ => Err(DomainError::validation("unrecognized transaction type")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "in",
            Self::Decrease => "out",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one committed stock movement.
///
/// Created exclusively as the side effect of a successful engine commit;
/// never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub item_id: ItemId,
    /// Magnitude of the movement, always positive.
    pub quantity: i64,
    pub direction: Direction,
    /// Commit time, set by the log.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this record on a balance.
    pub fn signed_quantity(&self) -> i64 {
        match self.direction {
            Direction::Increase => self.quantity,
            Direction::Decrease => -self.quantity,
        }
    }
}
