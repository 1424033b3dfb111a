//! Stock-mutation error taxonomy.

use thiserror::Error;

use stockbook_core::{ItemId, LocationId};

use crate::movement::MovementType;

/// Result type for stock-mutation operations.
pub type StockResult<T> = Result<T, StockError>;

/// A rejected movement request.
///
/// Every variant rejects one individual request; nothing here is fatal to
/// the process. Turning these into user-visible text is the presentation
/// layer's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Quantity was zero or negative.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Wrong presence/absence of source/destination for the movement type.
    #[error("invalid location combination for {movement_type}: {reason}")]
    InvalidLocationCombination {
        movement_type: MovementType,
        reason: &'static str,
    },

    /// Transfer with source == destination.
    #[error("transfer source and destination are the same location: {location}")]
    SameSourceAndDestination { location: LocationId },

    /// The debit would take the source balance negative. Only detectable
    /// inside the locked re-check, never before.
    #[error("insufficient stock at {location}: available {available}, requested {requested}")]
    InsufficientStock {
        location: LocationId,
        available: i64,
        requested: i64,
    },

    /// Referenced item does not exist.
    #[error("unknown item: {item_id}")]
    UnknownItem { item_id: ItemId },

    /// Referenced location does not exist.
    #[error("unknown location: {location_id}")]
    UnknownLocation { location_id: LocationId },

    /// Backing-store failure (e.g. poisoned lock), surfaced as a rejected
    /// request.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Error of the balance-store mutation primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BalanceError {
    /// Applying the delta would take the quantity below the allowed minimum.
    #[error("balance would go below {min_allowed}: available {available}, delta {delta}")]
    WouldGoNegative {
        available: i64,
        delta: i64,
        min_allowed: i64,
    },

    #[error("storage failure: {0}")]
    Storage(String),
}
