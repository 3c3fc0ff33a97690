//! Consistency check between a listing's current snapshot and its variants.
//!
//! Runs before every variant-mutating event is emitted. Any failure here is
//! an engine defect, never a user error.

use std::collections::BTreeSet;

use crate::error::{VariantError, VariantResult};
use crate::snapshot::VariantAxesSnapshot;
use crate::variant::{ListingVariant, VariantKey, VariantSet};

pub fn validate_listing_variants(
    snapshot: &VariantAxesSnapshot,
    variants: &VariantSet,
) -> VariantResult<()> {
    let expected = snapshot.sku_count().ok_or_else(|| {
        VariantError::invalid_state("snapshot combination count overflows")
    })?;
    if variants.len() as u64 != expected {
        return Err(VariantError::invalid_state(format!(
            "listing has {} variants, snapshot '{}' expands to {expected}",
            variants.len(),
            snapshot.snapshot_id
        )));
    }

    if snapshot.axes.is_empty() {
        let only_default = variants
            .iter()
            .all(|v| v.variant_key.as_str() == VariantKey::DEFAULT);
        if !only_default {
            return Err(VariantError::invalid_state(
                "a listing without axes must hold only the default variant",
            ));
        }
    }

    let mut keys = BTreeSet::new();
    let mut skus = BTreeSet::new();
    for variant in variants.iter() {
        if !keys.insert(&variant.variant_key) {
            return Err(VariantError::invalid_state(format!(
                "duplicate variant key '{}'",
                variant.variant_key
            )));
        }
        if !skus.insert(&variant.sku_code) {
            return Err(VariantError::invalid_state(format!(
                "duplicate SKU code '{}'",
                variant.sku_code
            )));
        }
        validate_selection(snapshot, variant)?;
    }
    Ok(())
}

fn validate_selection(snapshot: &VariantAxesSnapshot, variant: &ListingVariant) -> VariantResult<()> {
    let pointer = &variant.selection_snapshot;
    if pointer.snapshot_id != snapshot.snapshot_id {
        return Err(VariantError::invalid_state(format!(
            "variant '{}' points at snapshot '{}', current is '{}'",
            variant.variant_key, pointer.snapshot_id, snapshot.snapshot_id
        )));
    }
    if pointer.selections.len() != snapshot.axes.len() {
        return Err(VariantError::invalid_state(format!(
            "variant '{}' has {} selections for {} axes",
            variant.variant_key,
            pointer.selections.len(),
            snapshot.axes.len()
        )));
    }

    for (axis, selection) in snapshot.axes.iter().zip(&pointer.selections) {
        if selection.definition_key != axis.definition_key {
            return Err(VariantError::invalid_state(format!(
                "variant '{}' selection '{}' is out of axis order (expected '{}')",
                variant.variant_key, selection.definition_key, axis.definition_key
            )));
        }
        if axis.choice(&selection.choice_key).is_none() {
            return Err(VariantError::invalid_state(format!(
                "variant '{}' references missing choice '{}' on axis '{}'",
                variant.variant_key, selection.choice_key, axis.definition_key
            )));
        }
        let assigned = axis.resolve(&variant.attributes)?;
        if assigned.key != selection.choice_key {
            return Err(VariantError::invalid_state(format!(
                "variant '{}' attributes resolve to '{}' but point at '{}'",
                variant.variant_key, assigned.key, selection.choice_key
            )));
        }
    }
    Ok(())
}
