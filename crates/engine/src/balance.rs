//! Balance store: mapping of (item, location) → non-negative quantity.

use std::collections::HashMap;
use std::sync::RwLock;

use stockbook_core::ItemId;

use crate::error::BalanceError;
use crate::movement::BalanceKey;

/// Storage seam for balances.
///
/// [`compare_and_apply_delta`](BalanceStore::compare_and_apply_delta) is the
/// only mutating primitive and is called exclusively from the executor's
/// locked section.
pub trait BalanceStore: Send + Sync {
    /// Current quantity for a key; 0 if the record does not exist yet.
    fn get(&self, key: BalanceKey) -> i64;

    /// Apply `delta` if the resulting quantity stays >= `min_allowed`.
    ///
    /// An absent record reads as 0 and is created on first write. Returns
    /// the new quantity.
    fn compare_and_apply_delta(
        &self,
        key: BalanceKey,
        delta: i64,
        min_allowed: i64,
    ) -> Result<i64, BalanceError>;

    /// Sum of one item's balances across all locations.
    fn total_for_item(&self, item_id: ItemId) -> i64;

    /// Copy of all non-zero balances, for audit and tests.
    fn snapshot(&self) -> Vec<(BalanceKey, i64)>;
}

/// In-memory balance store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    balances: RwLock<HashMap<BalanceKey, i64>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn get(&self, key: BalanceKey) -> i64 {
        self.balances
            .read()
            .map(|m| m.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn compare_and_apply_delta(
        &self,
        key: BalanceKey,
        delta: i64,
        min_allowed: i64,
    ) -> Result<i64, BalanceError> {
        let mut balances = self
            .balances
            .write()
            .map_err(|_| BalanceError::Storage("lock poisoned".to_string()))?;

        let current = balances.get(&key).copied().unwrap_or(0);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| BalanceError::Storage("quantity overflow".to_string()))?;

        if next < min_allowed {
            return Err(BalanceError::WouldGoNegative {
                available: current,
                delta,
                min_allowed,
            });
        }

        balances.insert(key, next);
        Ok(next)
    }

    fn total_for_item(&self, item_id: ItemId) -> i64 {
        self.balances
            .read()
            .map(|m| {
                m.iter()
                    .filter(|(key, _)| key.item_id == item_id)
                    .map(|(_, quantity)| *quantity)
                    .sum()
            })
            .unwrap_or(0)
    }

    fn snapshot(&self) -> Vec<(BalanceKey, i64)> {
        self.balances
            .read()
            .map(|m| {
                m.iter()
                    .filter(|(_, quantity)| **quantity != 0)
                    .map(|(key, quantity)| (*key, *quantity))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockbook_core::LocationId;

    fn key() -> BalanceKey {
        BalanceKey::new(ItemId::new(), LocationId::new())
    }

    #[test]
    fn absent_key_reads_as_zero() {
        let store = InMemoryBalanceStore::new();
        assert_eq!(store.get(key()), 0);
    }

    #[test]
    fn delta_creates_the_record_on_first_write() {
        let store = InMemoryBalanceStore::new();
        let k = key();

        assert_eq!(store.compare_and_apply_delta(k, 10, 0).unwrap(), 10);
        assert_eq!(store.get(k), 10);
    }

    #[test]
    fn rejected_delta_leaves_quantity_unchanged() {
        let store = InMemoryBalanceStore::new();
        let k = key();
        store.compare_and_apply_delta(k, 5, 0).unwrap();

        let err = store.compare_and_apply_delta(k, -6, 0).unwrap_err();
        assert_eq!(
            err,
            BalanceError::WouldGoNegative {
                available: 5,
                delta: -6,
                min_allowed: 0,
            }
        );
        assert_eq!(store.get(k), 5);
    }

    #[test]
    fn debit_to_exactly_zero_is_allowed() {
        let store = InMemoryBalanceStore::new();
        let k = key();
        store.compare_and_apply_delta(k, 5, 0).unwrap();

        assert_eq!(store.compare_and_apply_delta(k, -5, 0).unwrap(), 0);
    }

    #[test]
    fn total_for_item_sums_only_that_item() {
        let store = InMemoryBalanceStore::new();
        let item = ItemId::new();
        let other = ItemId::new();
        let a = LocationId::new();
        let b = LocationId::new();

        store
            .compare_and_apply_delta(BalanceKey::new(item, a), 3, 0)
            .unwrap();
        store
            .compare_and_apply_delta(BalanceKey::new(item, b), 4, 0)
            .unwrap();
        store
            .compare_and_apply_delta(BalanceKey::new(other, a), 100, 0)
            .unwrap();

        assert_eq!(store.total_for_item(item), 7);
        assert_eq!(store.total_for_item(other), 100);
    }

    #[test]
    fn snapshot_skips_zeroed_records() {
        let store = InMemoryBalanceStore::new();
        let k = key();
        store.compare_and_apply_delta(k, 5, 0).unwrap();
        store.compare_and_apply_delta(k, -5, 0).unwrap();

        assert!(store.snapshot().is_empty());
    }
}
