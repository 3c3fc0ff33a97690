//! Domain events.
//!
//! Aggregates emit events from `handle` and evolve from them in `apply`; this
//! crate only defines the contract every event type satisfies.

pub mod event;

pub use event::Event;
