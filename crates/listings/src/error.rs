//! Variant engine error model.
//!
//! Two classes live here. Every variant except [`VariantError::InvalidState`]
//! maps one-to-one onto an input rule and is recoverable by the caller.
//! `InvalidState` means the engine's own bookkeeping disagrees with itself
//! (or persisted data no longer matches the schema); the enclosing transaction
//! must be aborted and retrying will not help.

use rust_decimal::Decimal;
use thiserror::Error;

use forgemart_core::{DomainError, SnapshotId};

use crate::listing::ListingStatus;

pub type VariantResult<T> = Result<T, VariantError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("attribute '{0}' has a null value")]
    NullValue(String),

    #[error("required attribute '{0}' is missing")]
    MissingRequired(String),

    #[error("attribute '{attribute}' expects {expected} input, got {found}")]
    WrongShape {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("attribute '{attribute}' belongs to group '{group}' and can only be set through it")]
    GroupMemberNotSettable { attribute: String, group: String },

    #[error("attribute '{0}' needs at least one value")]
    EmptyValues(String),

    #[error("attribute '{attribute}' has no option '{code}'")]
    UnknownOption { attribute: String, code: String },

    #[error("option '{code}' of '{attribute}' is not reachable from the chosen '{parent}' values")]
    UnreachableOption {
        attribute: String,
        code: String,
        parent: String,
    },

    #[error("value {value} is out of range for '{attribute}'")]
    OutOfRange { attribute: String, value: Decimal },

    #[error("attribute '{attribute}' lists '{value}' more than once")]
    NonUnique { attribute: String, value: String },

    #[error("group '{attribute}' rows need {expected} values, got {found}")]
    WrongArity {
        attribute: String,
        expected: usize,
        found: usize,
    },

    #[error("{count} variant axes exceed the cap of {cap}")]
    AxisCapExceeded { count: usize, cap: usize },

    /// `requested` is `None` when the combination count overflowed.
    #[error("{} SKUs exceed the cap of {cap}", requested.map_or_else(|| "too many".to_string(), |n| n.to_string()))]
    SkuCapExceeded { requested: Option<u64>, cap: u64 },

    #[error("snapshot '{expected}' is stale (current: {})", actual.as_ref().map_or("none", |s| s.as_str()))]
    SnapshotMismatch {
        expected: SnapshotId,
        actual: Option<SnapshotId>,
    },

    #[error("listing is still a draft; set attributes instead of appending")]
    AppendWhileDraft,

    #[error("cannot add new axis '{0}' after publication")]
    NewAxisAfterPublish(String),

    #[error("no new variant value to append")]
    NoNewValues,

    #[error("listing not found")]
    NotFound,

    #[error("listing already exists")]
    AlreadyExists,

    #[error("cannot {action} a {status} listing")]
    InvalidStatus {
        action: &'static str,
        status: ListingStatus,
    },

    #[error("listing has no variant '{0}'")]
    UnknownVariant(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl VariantError {
    /// Raise an invariant violation, logging it where it is detected.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(reason = %msg, "variant engine invariant violated");
        Self::InvalidState(msg)
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

impl From<VariantError> for DomainError {
    fn from(err: VariantError) -> Self {
        match err {
            VariantError::InvalidState(msg) => DomainError::invariant(msg),
            VariantError::NotFound => DomainError::not_found("listing"),
            VariantError::UnknownVariant(key) => DomainError::not_found(format!("variant '{key}'")),
            e @ (VariantError::SnapshotMismatch { .. }
            | VariantError::AlreadyExists
            | VariantError::InvalidStatus { .. }) => DomainError::conflict(e.to_string()),
            other => DomainError::validation(other.to_string()),
        }
    }
}
