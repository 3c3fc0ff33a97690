//! Attribute schema for marketplace product types.
//!
//! A product type owns a set of attribute definitions (Enum, Lookup, Numeric and
//! Group). This crate holds them in an indexed, key-addressed catalog: groups
//! name their members by key and options name their parents by code, so there
//! are no live object graphs to keep consistent.

pub mod catalog;
pub mod definition;
pub mod error;

pub use catalog::AttributeCatalog;
pub use definition::{
    AttributeDefinition, AttributeKind, EnumOption, EnumSpec, GroupSpec, LookupOption, LookupSpec,
    NumericSpec,
};
pub use error::CatalogError;
