//! Raw attribute input as supplied by the command layer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attribute key → input. `None` is an explicit null and is rejected.
pub type AttributeInputs = BTreeMap<String, Option<AttributeInput>>;

/// Shape-tagged input for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeInput {
    /// Enum/Lookup header option code.
    Code(String),
    /// Numeric header value.
    Number(Decimal),
    /// Enum/Lookup axis option codes.
    Options(Vec<String>),
    /// Numeric axis values.
    Numbers(Vec<Decimal>),
    /// Group axis rows, one value per member in canonical member order.
    Rows(Vec<Vec<Decimal>>),
}

impl AttributeInput {
    pub fn shape(&self) -> &'static str {
        match self {
            AttributeInput::Code(_) => "option code",
            AttributeInput::Number(_) => "number",
            AttributeInput::Options(_) => "option list",
            AttributeInput::Numbers(_) => "number list",
            AttributeInput::Rows(_) => "row list",
        }
    }

    pub fn options<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeInput::Options(codes.into_iter().map(Into::into).collect())
    }

    pub fn code(code: impl Into<String>) -> Self {
        AttributeInput::Code(code.into())
    }

    pub fn number(value: Decimal) -> Self {
        AttributeInput::Number(value)
    }
}

/// Validated value of a non-variant attribute. Not part of axis expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HeaderValue {
    Enum(String),
    Lookup(String),
    Numeric(Decimal),
}

impl HeaderValue {
    /// Option code for Enum/Lookup values.
    pub fn code(&self) -> Option<&str> {
        match self {
            HeaderValue::Enum(code) | HeaderValue::Lookup(code) => Some(code),
            HeaderValue::Numeric(_) => None,
        }
    }
}
