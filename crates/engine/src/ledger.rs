//! Append-only movement ledger.

use std::sync::Mutex;

use chrono::Utc;

use stockbook_core::{ItemId, MovementId};

use crate::error::StockError;
use crate::movement::{Movement, ProposedMovement};

/// Append-only, globally ordered history of committed movements.
///
/// `append` is the sole mutator and is only called by the executor after
/// validation and balance mutation. Entries are write-once; the trait has no
/// update or delete surface. Corrections are modeled as new compensating
/// movements submitted by callers.
pub trait MovementLedger: Send + Sync {
    /// Commit a movement: assign its global sequence number and commit
    /// timestamp, then append. Appends are serialized internally — the
    /// ledger is the single ordering authority, even for movements whose
    /// balance keys are disjoint.
    fn append(&self, proposed: &ProposedMovement) -> Result<Movement, StockError>;

    /// Movements referencing one item, newest first. Finite snapshot;
    /// callers may iterate it repeatedly.
    fn list_by_item(&self, item_id: ItemId) -> Vec<Movement>;

    /// Every movement, in commit order.
    fn list_all(&self) -> Vec<Movement>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory append-only ledger.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryMovementLedger {
    entries: Mutex<Vec<Movement>>,
}

impl InMemoryMovementLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementLedger for InMemoryMovementLedger {
    fn append(&self, proposed: &ProposedMovement) -> Result<Movement, StockError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StockError::Storage("ledger lock poisoned".to_string()))?;

        let sequence = entries.len() as u64 + 1;

        // A backwards clock step must not reorder the ledger: commit time
        // never moves before the previous entry's.
        let now = Utc::now();
        let committed_at = match entries.last() {
            Some(last) if last.committed_at > now => last.committed_at,
            _ => now,
        };

        let movement = Movement {
            id: MovementId::new(),
            item_id: proposed.item_id,
            kind: proposed.kind,
            quantity: proposed.quantity,
            sequence,
            committed_at,
            note: proposed.note.clone(),
        };
        entries.push(movement.clone());
        Ok(movement)
    }

    fn list_by_item(&self, item_id: ItemId) -> Vec<Movement> {
        let mut movements: Vec<Movement> = self
            .entries
            .lock()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|m| m.item_id == item_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        movements.reverse();
        movements
    }

    fn list_all(&self) -> Vec<Movement> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementKind;
    use stockbook_core::LocationId;

    fn receipt(item_id: ItemId, quantity: i64) -> ProposedMovement {
        ProposedMovement {
            item_id,
            kind: MovementKind::Receipt {
                destination: LocationId::new(),
            },
            quantity,
            note: None,
        }
    }

    #[test]
    fn append_assigns_strictly_increasing_sequence() {
        let ledger = InMemoryMovementLedger::new();
        let item_id = ItemId::new();

        let first = ledger.append(&receipt(item_id, 1)).unwrap();
        let second = ledger.append(&receipt(item_id, 2)).unwrap();
        let third = ledger.append(&receipt(item_id, 3)).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn commit_timestamps_never_decrease_in_ledger_order() {
        let ledger = InMemoryMovementLedger::new();
        let item_id = ItemId::new();

        for quantity in 1..=20 {
            ledger.append(&receipt(item_id, quantity)).unwrap();
        }

        let all = ledger.list_all();
        for pair in all.windows(2) {
            assert!(pair[0].committed_at <= pair[1].committed_at);
            assert!(pair[0].sequence < pair[1].sequence);
        }
    }

    #[test]
    fn list_by_item_is_newest_first_and_filtered() {
        let ledger = InMemoryMovementLedger::new();
        let item_id = ItemId::new();
        let other = ItemId::new();

        ledger.append(&receipt(item_id, 1)).unwrap();
        ledger.append(&receipt(other, 99)).unwrap();
        ledger.append(&receipt(item_id, 2)).unwrap();

        let movements = ledger.list_by_item(item_id);
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].quantity, 2);
        assert_eq!(movements[1].quantity, 1);
        assert!(movements.iter().all(|m| m.item_id == item_id));
    }

    #[test]
    fn note_is_preserved_on_the_committed_entry() {
        let ledger = InMemoryMovementLedger::new();
        let mut proposed = receipt(ItemId::new(), 4);
        proposed.note = Some("supplier delivery #42".to_string());

        let movement = ledger.append(&proposed).unwrap();
        assert_eq!(movement.note.as_deref(), Some("supplier delivery #42"));
    }
}
