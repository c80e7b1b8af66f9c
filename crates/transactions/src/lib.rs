//! Transaction log, query model, and the transaction engine.
//!
//! The engine is the sole entry point for balance-changing operations: it
//! locks an item, validates the movement against the balance it sees under
//! the lock, and commits the new balance together with an immutable audit
//! record. The log is append-only and served back through a filtered,
//! sorted, paginated read path.

pub mod engine;
pub mod log;
pub mod query;
pub mod record;

pub use engine::{Committed, Config, TransactionEngine};
pub use log::TransactionLog;
pub use query::{
    Page, PageMeta, Sort, SortDirection, SortField, TransactionFilter, TransactionView,
};
pub use record::{Direction, Transaction};
