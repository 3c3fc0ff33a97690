//! Preview the variants a set of attribute choices would generate.
//!
//! Usage: `variant-preview <request.json>` where the request is
//! `{ "catalog": …, "listingId": …, "inputs": …, "limits"?: …, "basePrice"?: … }`.
//! Prints the axes snapshot and the generated variants as JSON.

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use forgemart_attributes::AttributeCatalog;
use forgemart_listings::{
    AttributeInputs, GenerationContext, HeaderValue, ListingId, ListingVariant, NormalizeOptions,
    SkuPrefix, VariantAxesSnapshot, VariantLimits, generate_variants, normalize_attributes,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    catalog: AttributeCatalog,
    listing_id: ListingId,
    inputs: AttributeInputs,
    #[serde(default)]
    limits: Option<VariantLimits>,
    #[serde(default)]
    base_price: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewResponse<'a> {
    product_type: &'a str,
    sku_prefix: &'a str,
    headers: &'a std::collections::BTreeMap<String, HeaderValue>,
    snapshot: &'a VariantAxesSnapshot,
    variants: &'a [ListingVariant],
}

fn main() -> anyhow::Result<()> {
    forgemart_observability::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: variant-preview <request.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let request: PreviewRequest =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let limits = request.limits.unwrap_or_else(VariantLimits::from_env);
    tracing::info!(
        product_type = request.catalog.product_type(),
        variant_attributes = request.catalog.variant_definitions().count(),
        axes_cap = limits.variant_axes_cap,
        sku_cap = limits.sku_cap,
        "previewing variants"
    );

    let normalized = normalize_attributes(
        &request.catalog,
        &request.inputs,
        &NormalizeOptions::full_replace(&limits),
    )?;
    let prefix = SkuPrefix::for_listing(request.listing_id);
    let generated = generate_variants(
        &prefix,
        &normalized.axes,
        &GenerationContext {
            sku_cap: limits.sku_cap,
            previous_version: None,
            created_at: Utc::now(),
            default_price: request.base_price,
        },
    )?;

    let response = PreviewResponse {
        product_type: request.catalog.product_type(),
        sku_prefix: prefix.as_str(),
        headers: &normalized.headers,
        snapshot: &generated.snapshot,
        variants: &generated.variants,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
