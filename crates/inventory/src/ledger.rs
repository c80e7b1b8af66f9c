//! Authoritative current-balance store with per-item exclusive locking.
//!
//! Locking is per item, never global: the registry map is held only long
//! enough to resolve an item's slot, and the balance itself lives behind the
//! slot's own mutex. Mutations of different items proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use parking_lot::Mutex;
use parking_lot::lock_api::ArcMutexGuard;

use stockbook_core::{DomainError, DomainResult, ItemId};

use crate::item::{Item, ItemSnapshot, validate_name};

type ItemSlot = Arc<Mutex<Item>>;

/// Exclusive handle over one item, valid for the duration of a critical
/// section. Dropping the handle releases the lock, so release happens on
/// every exit path (success, validation failure, panic unwind).
pub struct LockedItem {
    guard: ArcMutexGuard<parking_lot::RawMutex, Item>,
}

impl LockedItem {
    /// The locked item's current state.
    pub fn item(&self) -> &Item {
        &self.guard
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        self.guard.snapshot()
    }
}

impl core::fmt::Debug for LockedItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockedItem")
            .field("item", &*self.guard)
            .finish()
    }
}

/// In-memory item ledger.
///
/// Holds the authoritative balance per item. [`ItemLedger::commit`] under a
/// [`LockedItem`] handle is the only way a balance changes.
#[derive(Debug, Default)]
pub struct ItemLedger {
    items: RwLock<HashMap<ItemId, ItemSlot>>,
}

impl ItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item with an initial balance.
    pub fn create(&self, name: &str, initial_balance: i64) -> DomainResult<ItemSnapshot> {
        let name = validate_name(name)?;
        if initial_balance < 0 {
            return Err(DomainError::validation("initial balance cannot be negative"));
        }

        let item = Item {
            id: ItemId::new(),
            name,
            balance: initial_balance,
            removed: false,
        };
        let snapshot = item.snapshot();

        let mut items = self
            .items
            .write()
            .map_err(|_| DomainError::storage("item registry lock poisoned"))?;
        items.insert(snapshot.id, Arc::new(Mutex::new(item)));

        tracing::debug!(item = %snapshot.id, name = %snapshot.name, "item created");
        Ok(snapshot)
    }

    /// Current snapshot of one item, or `None` if it does not exist.
    ///
    /// Takes the item's mutex only for the duration of the copy; readers do
    /// not hold the lock across any further work.
    pub fn get(&self, item_id: &ItemId) -> Option<ItemSnapshot> {
        let slot = {
            let items = self.items.read().ok()?;
            items.get(item_id).cloned()
        }?;
        let item = slot.lock();
        if item.removed {
            return None;
        }
        Some(item.snapshot())
    }

    /// Snapshots of all registered items, ordered by name for determinism.
    pub fn list(&self) -> Vec<ItemSnapshot> {
        let slots: Vec<ItemSlot> = match self.items.read() {
            Ok(items) => items.values().cloned().collect(),
            Err(_) => return vec![],
        };

        let mut snapshots: Vec<ItemSnapshot> = slots
            .iter()
            .filter_map(|slot| {
                let item = slot.lock();
                if item.removed {
                    None
                } else {
                    Some(item.snapshot())
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.to_string().cmp(&b.id.to_string())));
        snapshots
    }

    /// Acquire exclusive access to one item, waiting up to `timeout`.
    ///
    /// Blocks other mutators of the *same* item only. Fails with `NotFound`
    /// if the item does not exist and `Busy` if the lock cannot be acquired
    /// in time; a timed-out attempt has no side effects.
    pub fn lock_and_load(&self, item_id: &ItemId, timeout: Duration) -> DomainResult<LockedItem> {
        let slot = {
            let items = self
                .items
                .read()
                .map_err(|_| DomainError::storage("item registry lock poisoned"))?;
            items.get(item_id).cloned()
        }
        .ok_or(DomainError::NotFound)?;

        let guard = slot.try_lock_arc_for(timeout).ok_or_else(|| {
            tracing::warn!(item = %item_id, ?timeout, "item lock acquisition timed out");
            DomainError::Busy
        })?;

        // The slot may have been tombstoned between the map lookup and the
        // lock acquisition.
        if guard.removed {
            return Err(DomainError::NotFound);
        }

        Ok(LockedItem { guard })
    }

    /// Write the new balance and release the handle.
    ///
    /// This is the only way a balance changes. The non-negative invariant is
    /// re-checked here as a backstop; callers validate before committing.
    pub fn commit(&self, mut locked: LockedItem, new_balance: i64) -> DomainResult<ItemSnapshot> {
        if new_balance < 0 {
            return Err(DomainError::validation("balance cannot go negative"));
        }
        locked.guard.balance = new_balance;
        Ok(locked.guard.snapshot())
    }

    /// Remove a locked item from the registry.
    ///
    /// Requires the caller to hold the item's lock, so no mutation can be in
    /// flight. The slot is tombstoned before removal: a waiter that already
    /// resolved the slot will observe `NotFound` once it acquires the lock.
    pub fn remove(&self, mut locked: LockedItem) -> DomainResult<()> {
        let item_id = locked.guard.id;
        locked.guard.removed = true;

        let mut items = self
            .items
            .write()
            .map_err(|_| DomainError::storage("item registry lock poisoned"))?;
        items.remove(&item_id);

        tracing::debug!(item = %item_id, "item removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn create_and_get_round_trip() {
        let ledger = ItemLedger::new();
        let created = ledger.create("Apple", 50).unwrap();

        let fetched = ledger.get(&created.id).unwrap();
        assert_eq!(fetched.name, "Apple");
        assert_eq!(fetched.balance, 50);
    }

    #[test]
    fn negative_initial_balance_is_rejected() {
        let ledger = ItemLedger::new();
        let err = ledger.create("Apple", -1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lock_and_load_unknown_item_is_not_found() {
        let ledger = ItemLedger::new();
        let err = ledger.lock_and_load(&ItemId::new(), TIMEOUT).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn commit_is_visible_to_subsequent_readers() {
        let ledger = ItemLedger::new();
        let item = ledger.create("Apple", 10).unwrap();

        let locked = ledger.lock_and_load(&item.id, TIMEOUT).unwrap();
        let after = ledger.commit(locked, 25).unwrap();
        assert_eq!(after.balance, 25);
        assert_eq!(ledger.get(&item.id).unwrap().balance, 25);
    }

    #[test]
    fn commit_rejects_negative_balance_without_mutating() {
        let ledger = ItemLedger::new();
        let item = ledger.create("Apple", 10).unwrap();

        let locked = ledger.lock_and_load(&item.id, TIMEOUT).unwrap();
        let err = ledger.commit(locked, -5).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(ledger.get(&item.id).unwrap().balance, 10);
    }

    #[test]
    fn second_locker_times_out_while_lock_is_held() {
        let ledger = Arc::new(ItemLedger::new());
        let item = ledger.create("Apple", 10).unwrap();

        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let ledger = Arc::clone(&ledger);
            let item_id = item.id;
            thread::spawn(move || {
                let locked = ledger.lock_and_load(&item_id, TIMEOUT).unwrap();
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                drop(locked);
            })
        };

        held_rx.recv().unwrap();
        let err = ledger
            .lock_and_load(&item.id, Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err, DomainError::Busy);

        release_tx.send(()).unwrap();
        holder.join().unwrap();

        // Once released, the lock is available again.
        assert!(ledger.lock_and_load(&item.id, TIMEOUT).is_ok());
    }

    #[test]
    fn locking_one_item_does_not_block_another() {
        let ledger = ItemLedger::new();
        let apple = ledger.create("Apple", 10).unwrap();
        let orange = ledger.create("Orange", 10).unwrap();

        let _locked_apple = ledger.lock_and_load(&apple.id, TIMEOUT).unwrap();
        // Must succeed immediately even though Apple is held.
        let locked_orange = ledger
            .lock_and_load(&orange.id, Duration::from_millis(10))
            .unwrap();
        assert_eq!(locked_orange.item().name(), "Orange");
    }

    #[test]
    fn concurrent_commits_serialize_per_item() {
        let ledger = Arc::new(ItemLedger::new());
        let item = ledger.create("Apple", 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let item_id = item.id;
                thread::spawn(move || {
                    for _ in 0..100 {
                        let locked = ledger.lock_and_load(&item_id, TIMEOUT).unwrap();
                        let next = locked.item().balance() + 1;
                        ledger.commit(locked, next).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.get(&item.id).unwrap().balance, 800);
    }

    #[test]
    fn removed_item_is_gone_for_readers_and_lockers() {
        let ledger = ItemLedger::new();
        let item = ledger.create("Apple", 0).unwrap();

        let locked = ledger.lock_and_load(&item.id, TIMEOUT).unwrap();
        ledger.remove(locked).unwrap();

        assert!(ledger.get(&item.id).is_none());
        assert_eq!(
            ledger.lock_and_load(&item.id, TIMEOUT).unwrap_err(),
            DomainError::NotFound
        );
        assert!(ledger.list().is_empty());
    }
}
