use thiserror::Error;

/// Defects found while building an [`AttributeCatalog`](crate::AttributeCatalog).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate attribute key '{0}'")]
    DuplicateKey(String),

    #[error("attribute '{attribute}' declares option '{code}' more than once")]
    DuplicateOption { attribute: String, code: String },

    #[error("group '{group}' references unknown member '{member}'")]
    UnknownGroupMember { group: String, member: String },

    #[error("group member '{member}' of '{group}' must be a Numeric attribute pointing back at the group")]
    InvalidGroupMember { group: String, member: String },

    #[error("group '{0}' must declare at least one member")]
    EmptyGroup(String),

    #[error("group '{0}' must be a variant attribute")]
    GroupNotVariant(String),

    #[error("numeric attribute '{attribute}' claims membership of '{group}', which does not list it")]
    OrphanGroupMember { attribute: String, group: String },

    #[error("attribute '{attribute}' has unknown parent '{parent}'")]
    UnknownParent { attribute: String, parent: String },

    #[error("attribute '{attribute}' parent '{parent}' must be of the same kind")]
    ParentKindMismatch { attribute: String, parent: String },

    #[error("numeric attribute '{0}' has min greater than max")]
    EmptyRange(String),
}
