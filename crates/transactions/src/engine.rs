//! Transaction engine: the sole entry point for balance-changing operations.
//!
//! `submit` locks the target item, validates the movement against the
//! balance it observes *under the lock*, and commits the new balance
//! together with the audit record as one atomic unit. Any failure leaves
//! both the ledger and the log exactly as they were.

use std::sync::Arc;
use std::time::Duration;

use stockbook_core::{DomainError, DomainResult, ItemId};
use stockbook_inventory::{ItemLedger, ItemSnapshot};

use crate::log::TransactionLog;
use crate::query::{Page, PageMeta, Sort, TransactionFilter, TransactionView};
use crate::record::{Direction, Transaction};

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long `submit` waits for an item's lock before reporting `Busy`.
    pub lock_timeout: Duration,
    /// Hard cap on query page sizes.
    pub max_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            max_page_size: 200,
        }
    }
}

/// Result of an accepted movement: the committed record plus the item state
/// it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub transaction: Transaction,
    pub item: ItemSnapshot,
}

/// Orchestrates balance mutation and audit logging.
pub struct TransactionEngine {
    ledger: Arc<ItemLedger>,
    log: Arc<TransactionLog>,
    config: Config,
}

impl TransactionEngine {
    pub fn new(ledger: Arc<ItemLedger>, log: Arc<TransactionLog>, config: Config) -> Self {
        Self {
            ledger,
            log,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply one stock movement to an item.
    ///
    /// Validation order (first failure wins): quantity positivity, item
    /// existence, then balance sufficiency for decreases. The sufficiency
    /// check runs strictly inside the critical section; a check against any
    /// earlier read could be stale by the time the lock is held.
    ///
    /// All-or-nothing: on any failure the item's balance and the log are
    /// untouched. A lock timeout reports `Busy` and is never retried here.
    pub fn submit(
        &self,
        item_id: ItemId,
        quantity: i64,
        direction: Direction,
    ) -> DomainResult<Committed> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }

        let locked = self.ledger.lock_and_load(&item_id, self.config.lock_timeout)?;

        let balance = locked.item().balance();
        let new_balance = match direction {
            Direction::Increase => balance
                .checked_add(quantity)
                .ok_or_else(|| DomainError::validation("balance overflow"))?,
            Direction::Decrease => {
                if balance < quantity {
                    return Err(DomainError::insufficient_stock(locked.item().name()));
                }
                balance - quantity
            }
        };

        // Append before the balance write: if the append fails the balance
        // is untouched, and the write itself cannot fail afterwards. Both
        // happen under the item's lock, so no observer sees one without the
        // other.
        let transaction = self.log.append(item_id, quantity, direction)?;
        let item = self.ledger.commit(locked, new_balance)?;

        tracing::info!(
            item = %item.id,
            transaction = %transaction.id,
            quantity,
            direction = %direction,
            balance = item.balance,
            "transaction committed"
        );

        Ok(Committed { transaction, item })
    }

    /// Filtered, sorted, paginated view over the log, each record joined
    /// with its item's current snapshot.
    ///
    /// Takes no item locks; records are only ever observed fully committed.
    pub fn query(
        &self,
        filter: &TransactionFilter,
        sort: Sort,
        page: Page,
    ) -> DomainResult<(Vec<TransactionView>, PageMeta)> {
        let mut records = self.log.collect(filter)?;
        records.sort_by(|a, b| sort.ordering(a, b));

        let meta = page.meta(records.len() as u64);
        let views = page
            .slice(records)
            .into_iter()
            .map(|transaction| {
                let item = self
                    .ledger
                    .get(&transaction.item_id)
                    .ok_or_else(|| DomainError::storage("transaction references a missing item"))?;
                Ok(TransactionView { transaction, item })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok((views, meta))
    }

    /// Remove an item from the ledger.
    ///
    /// Refused with a conflict while the audit log still references the
    /// item. Holding the item's lock for the check excludes a concurrent
    /// `submit` from slipping a record in between check and removal.
    pub fn remove_item(&self, item_id: ItemId) -> DomainResult<()> {
        let locked = self.ledger.lock_and_load(&item_id, self.config.lock_timeout)?;
        if self.log.references(&item_id) {
            return Err(DomainError::conflict("item has recorded transactions"));
        }
        self.ledger.remove(locked)
    }
}
