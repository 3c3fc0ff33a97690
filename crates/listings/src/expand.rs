//! Cartesian expansion of canonically ordered axes.

use crate::axis::{AxisSelection, VariantAxis};
use crate::error::{VariantError, VariantResult};

/// Number of combinations the axes expand to: the product of their
/// cardinalities, `1` for no axes, `None` on overflow.
pub fn estimate_sku_count(axes: &[VariantAxis]) -> Option<u64> {
    axes.iter().try_fold(1u64, |acc, axis| {
        let cardinality = u64::try_from(axis.cardinality()).ok()?;
        acc.checked_mul(cardinality)
    })
}

/// Checks the combination count against `sku_cap` without expanding anything.
pub fn ensure_within_sku_cap(axes: &[VariantAxis], sku_cap: u64) -> VariantResult<u64> {
    match estimate_sku_count(axes) {
        Some(count) if count <= sku_cap => Ok(count),
        requested => {
            tracing::warn!(?requested, sku_cap, "variant combinations exceed SKU cap");
            Err(VariantError::SkuCapExceeded {
                requested,
                cap: sku_cap,
            })
        }
    }
}

/// Every combination of one choice per axis, flattened into selections.
///
/// Axes are folded left to right starting from a single empty combination, so
/// zero axes yield exactly one (empty) combination and the first axis varies
/// slowest. Callers must bound the work with [`ensure_within_sku_cap`] first.
pub fn cartesian(axes: &[VariantAxis]) -> Vec<Vec<AxisSelection>> {
    axes.iter().fold(vec![Vec::new()], |acc, axis| {
        let picks: Vec<_> = axis.choices().iter().map(|c| c.pick(axis.key())).collect();
        let mut next = Vec::with_capacity(acc.len() * picks.len());
        for prefix in &acc {
            for pick in &picks {
                let mut combination = Vec::with_capacity(prefix.len() + pick.len());
                combination.extend_from_slice(prefix);
                combination.extend_from_slice(pick);
                next.push(combination);
            }
        }
        next
    })
}
