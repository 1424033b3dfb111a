use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{ItemId, LocationId, MovementId, ValueObject};

use crate::error::StockError;

/// Tag for the three movement kinds, used at the submission boundary where
/// locations arrive as independent optionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Receipt,
    Shipment,
    Transfer,
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            MovementType::Receipt => "receipt",
            MovementType::Shipment => "shipment",
            MovementType::Transfer => "transfer",
        })
    }
}

/// Movement kind with per-variant location requirements.
///
/// A receipt credits a destination, a shipment debits a source, a transfer
/// does both. Wrong location arity is unrepresentable in this type; the
/// optionals-based boundary funnels through [`MovementKind::from_parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MovementKind {
    Receipt {
        destination: LocationId,
    },
    Shipment {
        source: LocationId,
    },
    Transfer {
        source: LocationId,
        destination: LocationId,
    },
}

impl MovementKind {
    /// Build a kind from the submission boundary's optional locations.
    ///
    /// This is the single place the presence/absence rules live:
    /// - Receipt: destination required, source must be absent
    /// - Shipment: source required, destination must be absent
    /// - Transfer: both required, source != destination
    pub fn from_parts(
        movement_type: MovementType,
        source: Option<LocationId>,
        destination: Option<LocationId>,
    ) -> Result<Self, StockError> {
        match (movement_type, source, destination) {
            (MovementType::Receipt, None, Some(destination)) => Ok(Self::Receipt { destination }),
            (MovementType::Receipt, _, _) => Err(StockError::InvalidLocationCombination {
                movement_type,
                reason: "receipt requires a destination and no source",
            }),
            (MovementType::Shipment, Some(source), None) => Ok(Self::Shipment { source }),
            (MovementType::Shipment, _, _) => Err(StockError::InvalidLocationCombination {
                movement_type,
                reason: "shipment requires a source and no destination",
            }),
            (MovementType::Transfer, Some(source), Some(destination)) => {
                if source == destination {
                    return Err(StockError::SameSourceAndDestination { location: source });
                }
                Ok(Self::Transfer {
                    source,
                    destination,
                })
            }
            (MovementType::Transfer, _, _) => Err(StockError::InvalidLocationCombination {
                movement_type,
                reason: "transfer requires both a source and a destination",
            }),
        }
    }

    pub fn movement_type(&self) -> MovementType {
        match self {
            MovementKind::Receipt { .. } => MovementType::Receipt,
            MovementKind::Shipment { .. } => MovementType::Shipment,
            MovementKind::Transfer { .. } => MovementType::Transfer,
        }
    }

    /// Location debited by this movement, if any.
    pub fn source(&self) -> Option<LocationId> {
        match self {
            MovementKind::Receipt { .. } => None,
            MovementKind::Shipment { source } => Some(*source),
            MovementKind::Transfer { source, .. } => Some(*source),
        }
    }

    /// Location credited by this movement, if any.
    pub fn destination(&self) -> Option<LocationId> {
        match self {
            MovementKind::Receipt { destination } => Some(*destination),
            MovementKind::Shipment { .. } => None,
            MovementKind::Transfer { destination, .. } => Some(*destination),
        }
    }

    /// Re-check for values constructed directly rather than through
    /// [`from_parts`](Self::from_parts).
    pub fn validate(&self) -> Result<(), StockError> {
        if let MovementKind::Transfer {
            source,
            destination,
        } = self
        {
            if source == destination {
                return Err(StockError::SameSourceAndDestination { location: *source });
            }
        }
        Ok(())
    }
}

/// Key of one balance record: quantity of one item at one location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub item_id: ItemId,
    pub location_id: LocationId,
}

impl BalanceKey {
    pub fn new(item_id: ItemId, location_id: LocationId) -> Self {
        Self {
            item_id,
            location_id,
        }
    }

    /// Fixed global ordering for multi-key lock acquisition: location bytes
    /// first, then item bytes.
    pub fn lock_order(&self) -> ([u8; 16], [u8; 16]) {
        (
            *self.location_id.as_uuid().as_bytes(),
            *self.item_id.as_uuid().as_bytes(),
        )
    }
}

impl ValueObject for BalanceKey {}

/// A movement request that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedMovement {
    pub item_id: ItemId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub note: Option<String>,
}

impl ProposedMovement {
    /// Structural validation. Pure: no IO, no knowledge of current balances.
    pub fn validate(&self) -> Result<(), StockError> {
        if self.quantity <= 0 {
            return Err(StockError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        self.kind.validate()
    }

    /// Balance keys this movement touches when executed.
    pub fn balance_keys(&self) -> Vec<BalanceKey> {
        match self.kind {
            MovementKind::Receipt { destination } => {
                vec![BalanceKey::new(self.item_id, destination)]
            }
            MovementKind::Shipment { source } => vec![BalanceKey::new(self.item_id, source)],
            MovementKind::Transfer {
                source,
                destination,
            } => vec![
                BalanceKey::new(self.item_id, source),
                BalanceKey::new(self.item_id, destination),
            ],
        }
    }
}

/// A committed, immutable ledger entry.
///
/// Never updated or deleted after commit; corrections are new compensating
/// movements submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub kind: MovementKind,
    pub quantity: i64,
    /// Global ledger position, strictly increasing.
    pub sequence: u64,
    /// Commit time; non-decreasing in sequence order.
    pub committed_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Movement {
    /// Signed quantity effect of this movement on one location.
    pub fn signed_delta_for(&self, location_id: LocationId) -> i64 {
        let mut delta = 0;
        if self.kind.source() == Some(location_id) {
            delta -= self.quantity;
        }
        if self.kind.destination() == Some(location_id) {
            delta += self.quantity;
        }
        delta
    }

    /// Net effect on the item's total stock across all locations.
    pub fn net_total_delta(&self) -> i64 {
        match self.kind {
            MovementKind::Receipt { .. } => self.quantity,
            MovementKind::Shipment { .. } => -self.quantity,
            MovementKind::Transfer { .. } => 0,
        }
    }
}
