//! Runtime axis model: choices, axes, and the selections they contribute to a variant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use forgemart_attributes::AttributeDefinition;
use forgemart_core::ValueObject;

use crate::canonical;

/// Normalized decimal string: trailing zeros dropped (`100.00` → `100`).
pub fn numeric_token(value: Decimal) -> String {
    value.normalize().to_string()
}

/// One member value of a group row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberValue {
    pub member_key: String,
    pub value: Decimal,
}

/// Payload of an axis choice. Exactly one kind per choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceValue {
    /// Enum option code; `position` is the option's schema position and drives ordering.
    Enum { code: String, position: i32 },
    Lookup(String),
    Numeric(Decimal),
    /// Member values in canonical member order.
    Group(Vec<GroupMemberValue>),
}

/// One offered value on an axis, keyed by a stable string unique within the axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisChoice {
    key: String,
    value: ChoiceValue,
}

impl ValueObject for AxisChoice {}

impl AxisChoice {
    pub fn enumeration(code: impl Into<String>, position: i32) -> Self {
        let code = code.into();
        Self {
            key: code.clone(),
            value: ChoiceValue::Enum { code, position },
        }
    }

    pub fn lookup(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            key: code.clone(),
            value: ChoiceValue::Lookup(code),
        }
    }

    pub fn numeric(value: Decimal) -> Self {
        let value = value.normalize();
        Self {
            key: numeric_token(value),
            value: ChoiceValue::Numeric(value),
        }
    }

    /// Group row; `members` must already be in canonical member order.
    pub fn group(members: Vec<GroupMemberValue>) -> Self {
        let members: Vec<_> = members
            .into_iter()
            .map(|m| GroupMemberValue {
                member_key: m.member_key,
                value: m.value.normalize(),
            })
            .collect();
        let key = members
            .iter()
            .map(|m| format!("{}={}", m.member_key, numeric_token(m.value)))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            key,
            value: ChoiceValue::Group(members),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &ChoiceValue {
        &self.value
    }

    /// Option code for Enum/Lookup choices.
    pub fn option_code(&self) -> Option<&str> {
        match &self.value {
            ChoiceValue::Enum { code, .. } | ChoiceValue::Lookup(code) => Some(code),
            _ => None,
        }
    }

    /// The selections this choice contributes to a variant on axis `axis_key`:
    /// one for single axes, one per member for groups.
    pub fn pick(&self, axis_key: &str) -> AxisPick {
        let single = |value| {
            vec![AxisSelection {
                definition_key: axis_key.to_string(),
                group_key: None,
                value,
            }]
        };
        match &self.value {
            ChoiceValue::Enum { code, .. } => single(NormalizedAxisChoice::Enum(code.clone())),
            ChoiceValue::Lookup(code) => single(NormalizedAxisChoice::Lookup(code.clone())),
            ChoiceValue::Numeric(value) => single(NormalizedAxisChoice::Numeric(*value)),
            ChoiceValue::Group(members) => members
                .iter()
                .map(|m| AxisSelection {
                    definition_key: m.member_key.clone(),
                    group_key: Some(axis_key.to_string()),
                    value: NormalizedAxisChoice::Numeric(m.value),
                })
                .collect(),
        }
    }
}

/// One attribute dimension of a listing with its offered choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantAxis {
    definition: AttributeDefinition,
    choices: Vec<AxisChoice>,
}

impl VariantAxis {
    /// Build an axis; choices are deduplicated by key and put in canonical order.
    pub fn new(definition: AttributeDefinition, choices: Vec<AxisChoice>) -> Self {
        Self {
            definition,
            choices: canonical::canonical_choices(choices),
        }
    }

    pub fn definition(&self) -> &AttributeDefinition {
        &self.definition
    }

    pub fn key(&self) -> &str {
        &self.definition.key
    }

    pub fn choices(&self) -> &[AxisChoice] {
        &self.choices
    }

    pub fn cardinality(&self) -> usize {
        self.choices.len()
    }

    pub fn is_group(&self) -> bool {
        self.definition.is_group()
    }

    pub fn contains_key(&self, choice_key: &str) -> bool {
        self.choices.iter().any(|c| c.key == choice_key)
    }

    /// A new axis with `additional` merged in and the whole list re-sorted.
    pub fn extended(&self, additional: impl IntoIterator<Item = AxisChoice>) -> Self {
        let mut choices = self.choices.clone();
        choices.extend(additional);
        Self::new(self.definition.clone(), choices)
    }
}

/// Atomic (non-group) value assigned to a produced variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NormalizedAxisChoice {
    Enum(String),
    Lookup(String),
    Numeric(Decimal),
}

impl NormalizedAxisChoice {
    /// Display/sanitization token: option code or normalized decimal string.
    pub fn token(&self) -> String {
        match self {
            NormalizedAxisChoice::Enum(code) | NormalizedAxisChoice::Lookup(code) => code.clone(),
            NormalizedAxisChoice::Numeric(value) => numeric_token(*value),
        }
    }
}

/// One attribute value on one variant. Group members carry their group's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSelection {
    pub definition_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    pub value: NormalizedAxisChoice,
}

/// Selections one axis contributes to one combination.
pub type AxisPick = Vec<AxisSelection>;
