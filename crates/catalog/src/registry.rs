use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use stockbook_core::{CategoryId, DomainError, DomainResult, ItemId, LocationId};

use crate::category::Category;
use crate::item::{Item, ItemDetails, NewItem};
use crate::location::Location;

/// Read-only view the stock engine consults to resolve references.
///
/// The engine never creates or edits catalog entries; it only needs to know
/// whether a referenced item/location exists.
pub trait Catalog: Send + Sync {
    fn item(&self, id: ItemId) -> Option<Item>;

    fn location(&self, id: LocationId) -> Option<Location>;

    fn contains_item(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    fn contains_location(&self, id: LocationId) -> bool {
        self.location(id).is_some()
    }
}

/// In-memory catalog registry.
///
/// Intended for tests/dev and as the reference implementation of the CRUD
/// collaborator. Uniqueness rules: SKU unique across items, name unique
/// across locations and across categories.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, Item>>,
    locations: RwLock<HashMap<LocationId, Location>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

fn poisoned() -> DomainError {
    DomainError::invariant("catalog lock poisoned")
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_item(&self, spec: NewItem) -> DomainResult<Item> {
        if let Some(category_id) = spec.category_id {
            let categories = self.categories.read().map_err(|_| poisoned())?;
            if !categories.contains_key(&category_id) {
                return Err(DomainError::validation(format!(
                    "unknown category: {category_id}"
                )));
            }
        }

        let mut items = self.items.write().map_err(|_| poisoned())?;
        if items.values().any(|i| i.sku() == spec.sku) {
            return Err(DomainError::conflict(format!(
                "SKU already in use: {}",
                spec.sku
            )));
        }

        let item = Item::new(ItemId::new(), spec, Utc::now())?;
        items.insert(item.id_typed(), item.clone());
        Ok(item)
    }

    /// Edit descriptive fields. The SKU is not part of [`ItemDetails`] and
    /// therefore cannot change here.
    pub fn update_item_details(&self, id: ItemId, details: ItemDetails) -> DomainResult<Item> {
        if let Some(category_id) = details.category_id {
            let categories = self.categories.read().map_err(|_| poisoned())?;
            if !categories.contains_key(&category_id) {
                return Err(DomainError::validation(format!(
                    "unknown category: {category_id}"
                )));
            }
        }

        let mut items = self.items.write().map_err(|_| poisoned())?;
        let item = items.get_mut(&id).ok_or(DomainError::NotFound)?;
        item.apply_details(details, Utc::now())?;
        Ok(item.clone())
    }

    pub fn create_location(&self, name: impl Into<String>) -> DomainResult<Location> {
        let name = name.into();
        let mut locations = self.locations.write().map_err(|_| poisoned())?;
        if locations.values().any(|l| l.name() == name) {
            return Err(DomainError::conflict(format!(
                "location name already in use: {name}"
            )));
        }

        let location = Location::new(LocationId::new(), name, Utc::now())?;
        locations.insert(location.id_typed(), location.clone());
        Ok(location)
    }

    pub fn create_category(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Category> {
        let name = name.into();
        let mut categories = self.categories.write().map_err(|_| poisoned())?;
        if categories.values().any(|c| c.name() == name) {
            return Err(DomainError::conflict(format!(
                "category name already in use: {name}"
            )));
        }

        let category = Category::new(CategoryId::new(), name, description.into(), Utc::now())?;
        categories.insert(category.id_typed(), category.clone());
        Ok(category)
    }

    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories.read().ok()?.get(&id).cloned()
    }

    pub fn list_items(&self) -> Vec<Item> {
        self.items
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn list_locations(&self) -> Vec<Location> {
        self.locations
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn list_categories(&self) -> Vec<Category> {
        self.categories
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Catalog for InMemoryCatalog {
    fn item(&self, id: ItemId) -> Option<Item> {
        self.items.read().ok()?.get(&id).cloned()
    }

    fn location(&self, id: LocationId) -> Option<Location> {
        self.locations.read().ok()?.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn widget() -> NewItem {
        NewItem {
            sku: "WIDGET001".to_string(),
            name: "Widget".to_string(),
            description: "A shiny new widget".to_string(),
            category_id: None,
            price: Some(19_99),
        }
    }

    #[test]
    fn create_item_registers_and_resolves() {
        let catalog = InMemoryCatalog::new();
        let item = catalog.create_item(widget()).unwrap();

        assert!(catalog.contains_item(item.id_typed()));
        assert_eq!(catalog.item(item.id_typed()).unwrap().sku(), "WIDGET001");
    }

    #[test]
    fn duplicate_sku_is_a_conflict() {
        let catalog = InMemoryCatalog::new();
        catalog.create_item(widget()).unwrap();

        let err = catalog.create_item(widget()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn item_with_unknown_category_is_rejected() {
        let catalog = InMemoryCatalog::new();
        let mut spec = widget();
        spec.category_id = Some(CategoryId::new());

        let err = catalog.create_item(spec).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn item_with_known_category_is_accepted() {
        let catalog = InMemoryCatalog::new();
        let category = catalog.create_category("Electronics", "").unwrap();

        let mut spec = widget();
        spec.category_id = Some(category.id_typed());
        let item = catalog.create_item(spec).unwrap();
        assert_eq!(item.category_id(), Some(category.id_typed()));
    }

    #[test]
    fn update_details_edits_descriptive_fields_only() {
        let catalog = InMemoryCatalog::new();
        let item = catalog.create_item(widget()).unwrap();

        let updated = catalog
            .update_item_details(
                item.id_typed(),
                ItemDetails {
                    name: "Widget Mk2".to_string(),
                    description: String::new(),
                    category_id: None,
                    price: None,
                },
            )
            .unwrap();

        assert_eq!(updated.sku(), "WIDGET001");
        assert_eq!(updated.name(), "Widget Mk2");
        assert_eq!(updated.price(), None);
    }

    #[test]
    fn update_details_for_missing_item_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let err = catalog
            .update_item_details(
                ItemId::new(),
                ItemDetails {
                    name: "x".to_string(),
                    description: String::new(),
                    category_id: None,
                    price: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn duplicate_location_name_is_a_conflict() {
        let catalog = InMemoryCatalog::new();
        catalog.create_location("Main Warehouse").unwrap();

        let err = catalog.create_location("Main Warehouse").unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn locations_resolve_through_the_trait() {
        let catalog = InMemoryCatalog::new();
        let location = catalog.create_location("Retail Store").unwrap();

        assert!(catalog.contains_location(location.id_typed()));
        assert!(!catalog.contains_location(LocationId::new()));
    }

    proptest! {
        /// Property: no sequence of detail updates can change an item's SKU.
        #[test]
        fn sku_survives_any_detail_updates(
            names in prop::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,30}", 1..8)
        ) {
            let catalog = InMemoryCatalog::new();
            let item = catalog.create_item(widget()).unwrap();

            for name in names {
                let _ = catalog.update_item_details(
                    item.id_typed(),
                    ItemDetails {
                        name,
                        description: String::new(),
                        category_id: None,
                        price: None,
                    },
                );
            }

            let fetched = catalog.item(item.id_typed()).unwrap();
            prop_assert_eq!(fetched.sku(), "WIDGET001");
        }
    }
}
