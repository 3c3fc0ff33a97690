//! Aggregate root traits and optimistic concurrency expectations.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state (+1 per applied event).
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation over some token the caller read earlier.
///
/// The token is usually an aggregate version, but listings use their current
/// variant-axes snapshot id: a caller presents back the id it saw, and a stale
/// view is rejected instead of silently merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expected<T> {
    /// Skip the check (first write, migrations, admin tooling).
    Any,
    /// Require the current token to equal this one exactly.
    Exact(T),
}

impl<T: PartialEq + core::fmt::Debug> Expected<T> {
    pub fn matches(&self, actual: Option<&T>) -> bool {
        match self {
            Expected::Any => true,
            Expected::Exact(expected) => actual == Some(expected),
        }
    }

    pub fn check(&self, actual: Option<&T>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

impl<T> Default for Expected<T> {
    fn default() -> Self {
        Expected::Any
    }
}

/// Aggregate execution semantics.
///
/// - **Decision logic**: `handle(&self, cmd)` validates and returns events.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// Aggregates perform no IO. Everything `apply` needs (computed snapshots,
/// generated variants) is carried on the event so replay never recomputes.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    ///
    /// This must not mutate state.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
