//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - two value
/// objects with the same attribute values are the same value. Contrast with
/// [`Entity`](crate::Entity), where identity persists across attribute
/// changes.
///
/// Example: a balance key `(item, location)` is a value object; the item it
/// points at is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
