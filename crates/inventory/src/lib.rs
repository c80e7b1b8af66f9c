//! Inventory item ledger.
//!
//! This crate owns the authoritative current balance per item and the
//! per-item exclusive locking that serializes balance mutations. Mutators of
//! different items never contend with each other.

pub mod item;
pub mod ledger;

pub use item::{Item, ItemSnapshot, MAX_NAME_LEN};
pub use ledger::{ItemLedger, LockedItem};
