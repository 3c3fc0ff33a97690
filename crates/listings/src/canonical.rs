//! Canonical ordering of axes and choices.
//!
//! Variant keys, SKU codes and the cross-product iteration order are all derived
//! from these comparators, so output never depends on input map iteration order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::axis::{AxisChoice, ChoiceValue, VariantAxis};

/// Axes ascend by `(definition position, definition key)`.
pub fn compare_axes(a: &VariantAxis, b: &VariantAxis) -> Ordering {
    a.definition().canonical_cmp(b.definition())
}

/// Kind-specific choice order: enum by option position, lookup by code
/// (ordinal), numeric by value, group member-wise by value. Key breaks ties.
pub fn compare_choices(a: &AxisChoice, b: &AxisChoice) -> Ordering {
    let by_value = match (a.value(), b.value()) {
        (
            ChoiceValue::Enum { position: pa, code: ca },
            ChoiceValue::Enum { position: pb, code: cb },
        ) => pa.cmp(pb).then_with(|| ca.cmp(cb)),
        (ChoiceValue::Lookup(ca), ChoiceValue::Lookup(cb)) => ca.as_bytes().cmp(cb.as_bytes()),
        (ChoiceValue::Numeric(va), ChoiceValue::Numeric(vb)) => va.cmp(vb),
        (ChoiceValue::Group(ma), ChoiceValue::Group(mb)) => ma
            .iter()
            .zip(mb.iter())
            .map(|(x, y)| x.value.cmp(&y.value))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| ma.len().cmp(&mb.len())),
        _ => Ordering::Equal,
    };
    by_value.then_with(|| a.key().cmp(b.key()))
}

pub fn sort_axes(axes: &mut [VariantAxis]) {
    axes.sort_by(compare_axes);
}

/// Deduplicate by key (first occurrence wins) and sort canonically.
pub fn canonical_choices(choices: Vec<AxisChoice>) -> Vec<AxisChoice> {
    let mut seen = BTreeSet::new();
    let mut unique: Vec<AxisChoice> = choices
        .into_iter()
        .filter(|c| seen.insert(c.key().to_string()))
        .collect();
    unique.sort_by(compare_choices);
    unique
}
