//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Child entities (e.g. a listing's variants) are identified inside their
/// aggregate by a natural key rather than a surrogate id.
pub trait Entity {
    /// Identifier, unique within the owning aggregate.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
