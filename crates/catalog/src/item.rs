use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{CategoryId, DomainError, Entity, ItemId};

/// Catalog entry for a stocked item.
///
/// The SKU is the external identity and is immutable once the item exists.
/// Descriptive fields (name, description, price, category) may be edited
/// through [`ItemDetails`], which deliberately has no SKU field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    sku: String,
    name: String,
    description: String,
    category_id: Option<CategoryId>,
    /// Price in smallest currency unit (e.g. cents).
    price: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub price: Option<u64>,
}

/// Editable descriptive fields of an item. No SKU on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub price: Option<u64>,
}

impl Item {
    pub(crate) fn new(id: ItemId, spec: NewItem, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if spec.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if spec.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            sku: spec.sku,
            name: spec.name,
            description: spec.description,
            category_id: spec.category_id,
            price: spec.price,
            created_at: now,
            updated_at: now,
        })
    }

    pub(crate) fn apply_details(
        &mut self,
        details: ItemDetails,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if details.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        self.name = details.name;
        self.description = details.description;
        self.category_id = details.category_id;
        self.price = details.price;
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn price(&self) -> Option<u64> {
        self.price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
