//! `forgemart-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the marketplace
//! crates (no storage, no HTTP, no schema knowledge).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, Expected};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, SellerId, SnapshotId, TenantId};
pub use value_object::ValueObject;
