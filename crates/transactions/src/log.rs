//! Append-only transaction log.

use std::sync::RwLock;

use chrono::Utc;

use stockbook_core::{DomainError, DomainResult, ItemId, TransactionId};

use crate::query::TransactionFilter;
use crate::record::{Direction, Transaction};

/// In-memory append-only log of committed transactions.
///
/// Records are never overwritten or removed once pushed; readers only ever
/// observe fully-appended records. Ids are assigned under the write lock, so
/// they reflect commit order exactly.
#[derive(Debug, Default)]
pub struct TransactionLog {
    records: RwLock<Vec<Transaction>>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new record, assigning its id and commit timestamp.
    ///
    /// Only the engine calls this, from inside an item's critical section,
    /// so the record and its balance write land as one atomic unit.
    pub fn append(
        &self,
        item_id: ItemId,
        quantity: i64,
        direction: Direction,
    ) -> DomainResult<Transaction> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::storage("transaction log lock poisoned"))?;

        let record = Transaction {
            id: TransactionId::new(records.len() as u64 + 1),
            item_id,
            quantity,
            direction,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any record references the item. Used to restrict item
    /// deletion (referential integrity).
    pub fn references(&self, item_id: &ItemId) -> bool {
        self.records
            .read()
            .map(|records| records.iter().any(|r| r.item_id == *item_id))
            .unwrap_or(false)
    }

    /// Copy out the records matching `filter`, unsorted and unpaged.
    pub(crate) fn collect(&self, filter: &TransactionFilter) -> DomainResult<Vec<Transaction>> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::storage("transaction log lock poisoned"))?;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_ids_in_commit_order() {
        let log = TransactionLog::new();
        let item_id = ItemId::new();

        let first = log.append(item_id, 5, Direction::Increase).unwrap();
        let second = log.append(item_id, 3, Direction::Decrease).unwrap();

        assert_eq!(first.id, TransactionId::new(1));
        assert_eq!(second.id, TransactionId::new(2));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn references_tracks_only_recorded_items() {
        let log = TransactionLog::new();
        let recorded = ItemId::new();
        let other = ItemId::new();

        assert!(!log.references(&recorded));
        log.append(recorded, 1, Direction::Increase).unwrap();
        assert!(log.references(&recorded));
        assert!(!log.references(&other));
    }

    #[test]
    fn collect_honors_the_filter() {
        let log = TransactionLog::new();
        let apple = ItemId::new();
        let orange = ItemId::new();
        log.append(apple, 10, Direction::Increase).unwrap();
        log.append(orange, 20, Direction::Increase).unwrap();
        log.append(apple, 5, Direction::Decrease).unwrap();

        let filter = TransactionFilter::default().for_item(apple);
        let records = log.collect(&filter).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.item_id == apple));
    }
}
