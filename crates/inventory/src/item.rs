use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, ItemId};

/// Upper bound on item name length, in bytes.
pub const MAX_NAME_LEN: usize = 120;

/// Current state of one inventory item.
///
/// The balance is mutated exclusively through [`crate::ItemLedger::commit`]
/// while holding the item's lock; name and id are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) name: String,
    pub(crate) balance: i64,
    /// Tombstone flag: set when the item is removed from the registry so
    /// that late lock acquirers holding a stale slot see `NotFound`.
    pub(crate) removed: bool,
}

impl Item {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            name: self.name.clone(),
            balance: self.balance,
        }
    }
}

/// Point-in-time view of an item, safe to hand out across the lock boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub balance: i64,
}

/// Validate and normalize an item name.
pub(crate) fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
