//! Attribute definitions as authored on a product type.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One attribute of a product type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Stable string id, unique within the product type.
    pub key: String,
    /// Default ordering; ties are broken by `key`.
    pub position: i32,
    #[serde(default)]
    pub is_required: bool,
    /// Whether the attribute is a variant axis (otherwise it holds one header value).
    #[serde(default)]
    pub is_variant: bool,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeKind {
    Enum(EnumSpec),
    Lookup(LookupSpec),
    Numeric(NumericSpec),
    Group(GroupSpec),
}

/// Ordered, schema-local options, optionally scoped to a parent attribute's option.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumSpec {
    #[serde(default)]
    pub parent: Option<String>,
    pub options: Vec<EnumOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumOption {
    pub code: String,
    pub position: i32,
    #[serde(default)]
    pub parent_code: Option<String>,
}

/// Options drawn from a shared vocabulary, optionally allow-listed for this
/// product type and linked to parent options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupSpec {
    pub vocabulary: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub options: Vec<LookupOption>,
    #[serde(default)]
    pub allow_list: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOption {
    pub code: String,
    /// Parent option codes this option hangs under; empty means unrestricted.
    #[serde(default)]
    pub parent_codes: Vec<String>,
}

/// Inclusive numeric range, optionally a member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSpec {
    #[serde(default)]
    pub min: Option<Decimal>,
    #[serde(default)]
    pub max: Option<Decimal>,
    #[serde(default)]
    pub group: Option<String>,
}

/// Ordered tuple of Numeric members, always a variant axis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    pub members: Vec<String>,
}

impl AttributeDefinition {
    fn with_kind(key: impl Into<String>, position: i32, kind: AttributeKind) -> Self {
        Self {
            key: key.into(),
            position,
            is_required: false,
            is_variant: false,
            kind,
        }
    }

    pub fn enumeration(key: impl Into<String>, position: i32, spec: EnumSpec) -> Self {
        Self::with_kind(key, position, AttributeKind::Enum(spec))
    }

    pub fn lookup(key: impl Into<String>, position: i32, spec: LookupSpec) -> Self {
        Self::with_kind(key, position, AttributeKind::Lookup(spec))
    }

    pub fn numeric(key: impl Into<String>, position: i32, spec: NumericSpec) -> Self {
        Self::with_kind(key, position, AttributeKind::Numeric(spec))
    }

    /// Groups are variant axes by definition.
    pub fn group(key: impl Into<String>, position: i32, members: Vec<String>) -> Self {
        let mut def = Self::with_kind(key, position, AttributeKind::Group(GroupSpec { members }));
        def.is_variant = true;
        def
    }

    pub fn variant(mut self) -> Self {
        self.is_variant = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            AttributeKind::Enum(_) => "enum",
            AttributeKind::Lookup(_) => "lookup",
            AttributeKind::Numeric(_) => "numeric",
            AttributeKind::Group(_) => "group",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, AttributeKind::Group(_))
    }

    /// The group this Numeric attribute belongs to, if any.
    pub fn member_of(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Numeric(spec) => spec.group.as_deref(),
            _ => None,
        }
    }

    /// Parent attribute key for Enum/Lookup attributes.
    pub fn parent(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Enum(spec) => spec.parent.as_deref(),
            AttributeKind::Lookup(spec) => spec.parent.as_deref(),
            _ => None,
        }
    }

    /// Canonical order: `(position, key)` ascending.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl EnumSpec {
    pub fn option(&self, code: &str) -> Option<&EnumOption> {
        self.options.iter().find(|o| o.code == code)
    }
}

impl EnumOption {
    pub fn new(code: impl Into<String>, position: i32) -> Self {
        Self {
            code: code.into(),
            position,
            parent_code: None,
        }
    }

    pub fn under(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }
}

impl LookupSpec {
    /// Looks up an option that is both in the vocabulary and allowed for this product type.
    pub fn option(&self, code: &str) -> Option<&LookupOption> {
        if !self.is_allowed(code) {
            return None;
        }
        self.options.iter().find(|o| o.code == code)
    }

    pub fn is_allowed(&self, code: &str) -> bool {
        self.allow_list
            .as_ref()
            .map_or(true, |allowed| allowed.contains(code))
    }
}

impl LookupOption {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            parent_codes: Vec::new(),
        }
    }

    pub fn under<I, S>(mut self, parent_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_codes = parent_codes.into_iter().map(Into::into).collect();
        self
    }
}

impl NumericSpec {
    pub fn range(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self {
            min,
            max,
            group: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn contains(&self, value: Decimal) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}
