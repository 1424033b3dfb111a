//! Wire the in-memory stock service and run a small movement flow.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example quickstart
//! ```

use std::sync::Arc;

use stockbook_catalog::{InMemoryCatalog, NewItem};
use stockbook_engine::{MovementType, StockService, SubmitMovement};

fn main() -> anyhow::Result<()> {
    stockbook_observability::init();

    let catalog = Arc::new(InMemoryCatalog::new());
    let laptop = catalog.create_item(NewItem {
        sku: "LPT001".to_string(),
        name: "Laptop".to_string(),
        description: "14\" developer laptop".to_string(),
        category_id: None,
        price: Some(129_900),
    })?;
    let warehouse = catalog.create_location("Main Warehouse")?;
    let store = catalog.create_location("Retail Store")?;

    let service = StockService::in_memory(catalog);

    service.submit_movement(SubmitMovement {
        item_id: laptop.id_typed(),
        movement_type: MovementType::Receipt,
        quantity: 10,
        source: None,
        destination: Some(warehouse.id_typed()),
        note: Some("initial stocking".to_string()),
    })?;

    service.submit_movement(SubmitMovement {
        item_id: laptop.id_typed(),
        movement_type: MovementType::Transfer,
        quantity: 4,
        source: Some(warehouse.id_typed()),
        destination: Some(store.id_typed()),
        note: None,
    })?;

    service.submit_movement(SubmitMovement {
        item_id: laptop.id_typed(),
        movement_type: MovementType::Shipment,
        quantity: 1,
        source: Some(store.id_typed()),
        destination: None,
        note: Some("walk-in sale".to_string()),
    })?;

    tracing::info!(
        warehouse = service.balance(laptop.id_typed(), warehouse.id_typed()),
        store = service.balance(laptop.id_typed(), store.id_typed()),
        total = service.total_stock(laptop.id_typed()),
        "final balances"
    );

    for movement in service.recent_movements(laptop.id_typed(), 10) {
        tracing::info!(
            sequence = movement.sequence,
            kind = %movement.kind.movement_type(),
            quantity = movement.quantity,
            note = movement.note.as_deref().unwrap_or(""),
            "ledger entry"
        );
    }

    Ok(())
}
