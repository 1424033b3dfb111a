//! Movement executor: validation + balance mutation + ledger append as one
//! atomic unit, serialized per balance key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use stockbook_catalog::Catalog;

use crate::balance::BalanceStore;
use crate::error::{BalanceError, StockError, StockResult};
use crate::ledger::MovementLedger;
use crate::movement::{BalanceKey, Movement, MovementKind, ProposedMovement};

/// Per-key lock table for balance keys.
///
/// Lock records are created on first use and kept for the lifetime of the
/// table. The table's own mutex is held only long enough to fetch or insert
/// the per-key handles, never across a balance operation.
#[derive(Debug, Default)]
struct LockTable {
    locks: Mutex<HashMap<BalanceKey, Arc<Mutex<()>>>>,
}

impl LockTable {
    /// Lock handles for `keys`, sorted into the fixed global acquisition
    /// order (location bytes, then item bytes) and deduplicated.
    ///
    /// Two concurrent transfers over overlapping keys always acquire in the
    /// same order, whatever order their requests named the locations in.
    fn handles_for(&self, keys: &[BalanceKey]) -> StockResult<Vec<Arc<Mutex<()>>>> {
        let mut sorted = keys.to_vec();
        sorted.sort_by_key(|key| key.lock_order());
        sorted.dedup();

        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StockError::Storage("lock table poisoned".to_string()))?;

        Ok(sorted
            .iter()
            .map(|key| Arc::clone(locks.entry(*key).or_default()))
            .collect())
    }
}

fn lock_all(handles: &[Arc<Mutex<()>>]) -> StockResult<Vec<MutexGuard<'_, ()>>> {
    handles
        .iter()
        .map(|handle| {
            handle
                .lock()
                .map_err(|_| StockError::Storage("balance lock poisoned".to_string()))
        })
        .collect()
}

/// The one component with side effects.
///
/// Orchestrates: structural validation → reference resolution → per-key lock
/// acquisition → locked sufficiency re-check → balance deltas → sequenced
/// ledger append → release.
pub struct MovementExecutor<C, B, L> {
    catalog: Arc<C>,
    balances: Arc<B>,
    ledger: Arc<L>,
    lock_table: LockTable,
}

impl<C, B, L> MovementExecutor<C, B, L>
where
    C: Catalog,
    B: BalanceStore,
    L: MovementLedger,
{
    pub fn new(catalog: Arc<C>, balances: Arc<B>, ledger: Arc<L>) -> Self {
        Self {
            catalog,
            balances,
            ledger,
            lock_table: LockTable::default(),
        }
    }

    /// Execute a proposed movement.
    ///
    /// Acquiring the balance-key locks is the only blocking point; the
    /// locked section itself is in-memory-fast and performs no IO. On any
    /// failure inside it, already-applied deltas are compensated before the
    /// error surfaces, so a rejected request leaves no trace.
    pub fn execute(&self, proposed: ProposedMovement) -> StockResult<Movement> {
        proposed.validate()?;
        self.resolve_references(&proposed)?;

        let keys = proposed.balance_keys();
        let handles = self.lock_table.handles_for(&keys)?;
        let _guards = lock_all(&handles)?;

        // Balances may have moved since any earlier read by the caller;
        // sufficiency is only decided here, under the key locks.
        if let MovementKind::Shipment { source } | MovementKind::Transfer { source, .. } =
            proposed.kind
        {
            let available = self.balances.get(BalanceKey::new(proposed.item_id, source));
            if available < proposed.quantity {
                tracing::warn!(
                    item = %proposed.item_id,
                    location = %source,
                    available,
                    requested = proposed.quantity,
                    "movement rejected: insufficient stock"
                );
                return Err(StockError::InsufficientStock {
                    location: source,
                    available,
                    requested: proposed.quantity,
                });
            }
        }

        self.apply_deltas(&proposed)?;

        let movement = match self.ledger.append(&proposed) {
            Ok(movement) => movement,
            Err(e) => {
                self.revert_deltas(&proposed);
                return Err(e);
            }
        };

        tracing::debug!(
            movement = %movement.id,
            sequence = movement.sequence,
            kind = %movement.kind.movement_type(),
            quantity = movement.quantity,
            "movement committed"
        );

        Ok(movement)
    }

    /// Referenced entities must exist before any lock is taken.
    fn resolve_references(&self, proposed: &ProposedMovement) -> StockResult<()> {
        if !self.catalog.contains_item(proposed.item_id) {
            return Err(StockError::UnknownItem {
                item_id: proposed.item_id,
            });
        }

        for location_id in [proposed.kind.source(), proposed.kind.destination()]
            .into_iter()
            .flatten()
        {
            if !self.catalog.contains_location(location_id) {
                return Err(StockError::UnknownLocation { location_id });
            }
        }

        Ok(())
    }

    /// Debit the source (if any), then credit the destination (if any). A
    /// credit failure after the debit landed compensates the debit before
    /// the error surfaces.
    fn apply_deltas(&self, proposed: &ProposedMovement) -> StockResult<()> {
        let item_id = proposed.item_id;
        let quantity = proposed.quantity;

        match proposed.kind {
            MovementKind::Receipt { destination } => {
                self.apply_delta(BalanceKey::new(item_id, destination), quantity)?;
            }
            MovementKind::Shipment { source } => {
                self.apply_delta(BalanceKey::new(item_id, source), -quantity)?;
            }
            MovementKind::Transfer {
                source,
                destination,
            } => {
                let source_key = BalanceKey::new(item_id, source);
                self.apply_delta(source_key, -quantity)?;
                if let Err(e) = self.apply_delta(BalanceKey::new(item_id, destination), quantity) {
                    let _ = self.balances.compare_and_apply_delta(source_key, quantity, 0);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn apply_delta(&self, key: BalanceKey, delta: i64) -> StockResult<i64> {
        self.balances
            .compare_and_apply_delta(key, delta, 0)
            .map_err(|e| match e {
                BalanceError::WouldGoNegative { available, .. } => StockError::InsufficientStock {
                    location: key.location_id,
                    available,
                    requested: delta.unsigned_abs() as i64,
                },
                BalanceError::Storage(msg) => StockError::Storage(msg),
            })
    }

    /// Undo the already-applied balance effect of `proposed`.
    fn revert_deltas(&self, proposed: &ProposedMovement) {
        let item_id = proposed.item_id;
        let quantity = proposed.quantity;

        if let Some(source) = proposed.kind.source() {
            let _ = self
                .balances
                .compare_and_apply_delta(BalanceKey::new(item_id, source), quantity, 0);
        }
        if let Some(destination) = proposed.kind.destination() {
            let _ = self.balances.compare_and_apply_delta(
                BalanceKey::new(item_id, destination),
                -quantity,
                0,
            );
        }
    }
}
