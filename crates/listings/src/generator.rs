//! Full variant generation for a set of canonical axes.

use chrono::{DateTime, Utc};

use crate::axis::VariantAxis;
use crate::error::{VariantError, VariantResult};
use crate::expand;
use crate::snapshot::VariantAxesSnapshot;
use crate::variant::{ListingVariant, SkuPrefix, VariantMaterializer};

/// Everything generation needs besides the axes themselves.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub sku_cap: u64,
    /// Version of the snapshot being replaced, if any.
    pub previous_version: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// Price assigned to every new variant.
    pub default_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariants {
    pub snapshot: VariantAxesSnapshot,
    pub variants: Vec<ListingVariant>,
}

/// Snapshot `axes` and produce one variant per combination.
///
/// `axes` must already be normalized and in canonical order. The SKU cap is
/// enforced before anything is allocated; zero axes produce the single default
/// variant.
#[tracing::instrument(skip_all, fields(axes = axes.len(), sku_cap = ctx.sku_cap))]
pub fn generate_variants(
    prefix: &SkuPrefix,
    axes: &[VariantAxis],
    ctx: &GenerationContext,
) -> VariantResult<GeneratedVariants> {
    let expected = expand::ensure_within_sku_cap(axes, ctx.sku_cap)?;

    let snapshot = VariantAxesSnapshot::capture(axes, ctx.previous_version, ctx.created_at);
    let mut materializer = VariantMaterializer::new(prefix, &snapshot, ctx.default_price);
    let variants = expand::cartesian(axes)
        .into_iter()
        .map(|selections| materializer.materialize(selections))
        .collect::<VariantResult<Vec<_>>>()?;

    if variants.len() as u64 != expected {
        return Err(VariantError::invalid_state(format!(
            "generated {} variants, expected {expected}",
            variants.len()
        )));
    }

    tracing::debug!(
        snapshot_id = %snapshot.snapshot_id,
        variants = variants.len(),
        "variants generated"
    );
    Ok(GeneratedVariants { snapshot, variants })
}
