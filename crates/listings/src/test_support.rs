//! Shared fixtures for unit tests.

use std::sync::Arc;

use rust_decimal::Decimal;

use forgemart_attributes::{
    AttributeCatalog, AttributeDefinition, EnumOption, EnumSpec, LookupOption, LookupSpec,
    NumericSpec,
};
use forgemart_core::AggregateId;

use crate::input::{AttributeInput, AttributeInputs};
use crate::listing::ListingId;

pub fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

/// Apparel-ish product type exercising every attribute kind:
///
/// - `color` (required enum axis), `size` (enum axis)
/// - `dims` group of `width` 1..=500 and `length` 1..=1000
/// - `weight` numeric axis 0.1..=100
/// - `shoe_size` enum axis whose options hang off the `category` header
/// - `finish` lookup axis whose options hang off the `fabric` header
/// - `thread_count` numeric header 100..=1000
pub fn catalog() -> Arc<AttributeCatalog> {
    let definitions = vec![
        AttributeDefinition::enumeration(
            "color",
            1,
            EnumSpec {
                parent: None,
                options: vec![
                    EnumOption::new("red", 1),
                    EnumOption::new("blue", 2),
                    EnumOption::new("green", 3),
                ],
            },
        )
        .variant()
        .required(),
        AttributeDefinition::enumeration(
            "size",
            2,
            EnumSpec {
                parent: None,
                options: vec![
                    EnumOption::new("S", 1),
                    EnumOption::new("M", 2),
                    EnumOption::new("L", 3),
                    EnumOption::new("XL", 4),
                ],
            },
        )
        .variant(),
        AttributeDefinition::group("dims", 3, vec!["width".into(), "length".into()]),
        AttributeDefinition::numeric(
            "width",
            1,
            NumericSpec::range(Some(dec(1)), Some(dec(500))).in_group("dims"),
        ),
        AttributeDefinition::numeric(
            "length",
            2,
            NumericSpec::range(Some(dec(1)), Some(dec(1000))).in_group("dims"),
        ),
        AttributeDefinition::numeric(
            "weight",
            4,
            NumericSpec::range(Some(Decimal::new(1, 1)), Some(dec(100))),
        )
        .variant(),
        AttributeDefinition::enumeration(
            "shoe_size",
            5,
            EnumSpec {
                parent: Some("category".into()),
                options: vec![
                    EnumOption::new("42", 1).under("shoes"),
                    EnumOption::new("43", 2).under("shoes"),
                ],
            },
        )
        .variant(),
        AttributeDefinition::lookup(
            "finish",
            6,
            LookupSpec {
                vocabulary: "finishes".into(),
                parent: Some("fabric".into()),
                options: vec![
                    LookupOption::new("matte").under(["cotton"]),
                    LookupOption::new("gloss").under(["wool", "silk"]),
                    LookupOption::new("raw"),
                ],
                allow_list: None,
            },
        )
        .variant(),
        AttributeDefinition::enumeration(
            "category",
            10,
            EnumSpec {
                parent: None,
                options: vec![EnumOption::new("tops", 1), EnumOption::new("shoes", 2)],
            },
        ),
        AttributeDefinition::lookup(
            "fabric",
            11,
            LookupSpec {
                vocabulary: "fabrics".into(),
                parent: None,
                options: vec![
                    LookupOption::new("cotton"),
                    LookupOption::new("wool"),
                    LookupOption::new("silk"),
                ],
                allow_list: Some(["cotton".to_string(), "wool".to_string()].into()),
            },
        ),
        AttributeDefinition::numeric(
            "thread_count",
            12,
            NumericSpec::range(Some(dec(100)), Some(dec(1000))),
        ),
    ];
    Arc::new(AttributeCatalog::new("apparel", definitions).expect("fixture catalog is valid"))
}

pub fn inputs(pairs: Vec<(&str, Option<AttributeInput>)>) -> AttributeInputs {
    pairs
        .into_iter()
        .map(|(key, input)| (key.to_string(), input))
        .collect()
}

/// Group rows from integer member values.
pub fn rows(values: &[&[i64]]) -> AttributeInput {
    AttributeInput::Rows(
        values
            .iter()
            .map(|row| row.iter().map(|v| dec(*v)).collect())
            .collect(),
    )
}

pub fn listing_id(n: u128) -> ListingId {
    let id: AggregateId = format!("{n:032x}").parse().expect("32 hex digits parse as a uuid");
    ListingId::new(id)
}
