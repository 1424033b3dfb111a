//! External interface of the stock core.
//!
//! The surrounding CRUD/presentation layer talks to the engine exclusively
//! through [`StockService`]: one mutating entry point and three queries. It
//! is storage-engine-shaped; no wire format is implied.

use std::sync::Arc;

use stockbook_catalog::{Catalog, InMemoryCatalog};
use stockbook_core::{ItemId, LocationId};

use crate::balance::{BalanceStore, InMemoryBalanceStore};
use crate::error::StockResult;
use crate::executor::MovementExecutor;
use crate::ledger::{InMemoryMovementLedger, MovementLedger};
use crate::movement::{BalanceKey, Movement, MovementKind, MovementType, ProposedMovement};

/// A movement submission as the surrounding layer sends it: a type tag plus
/// independently optional locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitMovement {
    pub item_id: ItemId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub source: Option<LocationId>,
    pub destination: Option<LocationId>,
    pub note: Option<String>,
}

/// Facade over catalog + balance store + ledger + executor.
pub struct StockService<C, B, L> {
    balances: Arc<B>,
    ledger: Arc<L>,
    executor: MovementExecutor<C, B, L>,
}

impl StockService<InMemoryCatalog, InMemoryBalanceStore, InMemoryMovementLedger> {
    /// Service wired with the in-memory stores.
    pub fn in_memory(catalog: Arc<InMemoryCatalog>) -> Self {
        Self::new(
            catalog,
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryMovementLedger::new()),
        )
    }
}

impl<C, B, L> StockService<C, B, L>
where
    C: Catalog,
    B: BalanceStore,
    L: MovementLedger,
{
    pub fn new(catalog: Arc<C>, balances: Arc<B>, ledger: Arc<L>) -> Self {
        Self {
            balances: Arc::clone(&balances),
            ledger: Arc::clone(&ledger),
            executor: MovementExecutor::new(catalog, balances, ledger),
        }
    }

    /// Sole entry point for quantity-affecting requests.
    pub fn submit_movement(&self, submission: SubmitMovement) -> StockResult<Movement> {
        let kind = MovementKind::from_parts(
            submission.movement_type,
            submission.source,
            submission.destination,
        )?;

        self.executor.execute(ProposedMovement {
            item_id: submission.item_id,
            kind,
            quantity: submission.quantity,
            note: submission.note,
        })
    }

    /// Current quantity of an item at a location (0 if never stocked there).
    pub fn balance(&self, item_id: ItemId, location_id: LocationId) -> i64 {
        self.balances.get(BalanceKey::new(item_id, location_id))
    }

    /// Sum of an item's balances across all locations.
    pub fn total_stock(&self, item_id: ItemId) -> i64 {
        self.balances.total_for_item(item_id)
    }

    /// Committed movements for an item, newest first, at most `limit`.
    pub fn recent_movements(&self, item_id: ItemId, limit: usize) -> Vec<Movement> {
        let mut movements = self.ledger.list_by_item(item_id);
        movements.truncate(limit);
        movements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use stockbook_catalog::NewItem;

    fn setup() -> (
        StockService<InMemoryCatalog, InMemoryBalanceStore, InMemoryMovementLedger>,
        ItemId,
        LocationId,
        LocationId,
    ) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let item = catalog
            .create_item(NewItem {
                sku: "LPT001".to_string(),
                name: "Laptop".to_string(),
                description: String::new(),
                category_id: None,
                price: None,
            })
            .unwrap();
        let warehouse = catalog.create_location("Main Warehouse").unwrap();
        let store = catalog.create_location("Retail Store").unwrap();

        (
            StockService::in_memory(catalog),
            item.id_typed(),
            warehouse.id_typed(),
            store.id_typed(),
        )
    }

    fn submit(
        item_id: ItemId,
        movement_type: MovementType,
        quantity: i64,
        source: Option<LocationId>,
        destination: Option<LocationId>,
    ) -> SubmitMovement {
        SubmitMovement {
            item_id,
            movement_type,
            quantity,
            source,
            destination,
            note: None,
        }
    }

    #[test]
    fn submission_with_wrong_location_arity_is_rejected() {
        let (service, item, warehouse, store) = setup();

        // Receipt with both locations set.
        let err = service
            .submit_movement(submit(
                item,
                MovementType::Receipt,
                1,
                Some(warehouse),
                Some(store),
            ))
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidLocationCombination { .. }));

        // Nothing reached the balance store or the ledger.
        assert_eq!(service.total_stock(item), 0);
        assert!(service.recent_movements(item, 10).is_empty());
    }

    #[test]
    fn recent_movements_respects_limit_and_order() {
        let (service, item, warehouse, _) = setup();

        for quantity in 1..=5 {
            service
                .submit_movement(submit(
                    item,
                    MovementType::Receipt,
                    quantity,
                    None,
                    Some(warehouse),
                ))
                .unwrap();
        }

        let recent = service.recent_movements(item, 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].quantity, 5);
        assert_eq!(recent[1].quantity, 4);
        assert_eq!(recent[2].quantity, 3);
    }

    #[test]
    fn balance_and_total_stock_track_movements() {
        let (service, item, warehouse, store) = setup();

        service
            .submit_movement(submit(item, MovementType::Receipt, 8, None, Some(warehouse)))
            .unwrap();
        service
            .submit_movement(submit(
                item,
                MovementType::Transfer,
                3,
                Some(warehouse),
                Some(store),
            ))
            .unwrap();

        assert_eq!(service.balance(item, warehouse), 5);
        assert_eq!(service.balance(item, store), 3);
        assert_eq!(service.total_stock(item), 8);
    }

    #[test]
    fn note_travels_to_the_ledger_entry() {
        let (service, item, warehouse, _) = setup();

        let movement = service
            .submit_movement(SubmitMovement {
                item_id: item,
                movement_type: MovementType::Receipt,
                quantity: 2,
                source: None,
                destination: Some(warehouse),
                note: Some("initial stocking".to_string()),
            })
            .unwrap();

        assert_eq!(movement.note.as_deref(), Some("initial stocking"));
        let recent = service.recent_movements(item, 1);
        assert_eq!(recent[0].note.as_deref(), Some("initial stocking"));
    }
}
