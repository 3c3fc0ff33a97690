//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value: two axis choices with the
/// same payload are the same choice, wherever they came from. To "modify" one,
/// build a new one.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: no identity (`Numeric(150)` equals any other `Numeric(150)`)
/// - **Entity**: has identity (a listing variant stays the same variant while
///   its price or stock changes)
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct SkuCode(String);
///
/// impl ValueObject for SkuCode {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
