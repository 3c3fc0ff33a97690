//! Capacity caps for variant generation.

use serde::{Deserialize, Serialize};

pub const VARIANT_AXES_CAP_ENV: &str = "FORGEMART_VARIANT_AXES_CAP";
pub const SKU_CAP_ENV: &str = "FORGEMART_SKU_CAP";

/// Upper bounds enforced before any expansion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantLimits {
    /// Maximum number of variant axes on one listing.
    pub variant_axes_cap: usize,
    /// Maximum number of variants on one listing.
    pub sku_cap: u64,
}

impl Default for VariantLimits {
    fn default() -> Self {
        Self {
            variant_axes_cap: 3,
            sku_cap: 100,
        }
    }
}

impl VariantLimits {
    pub fn new(variant_axes_cap: usize, sku_cap: u64) -> Self {
        Self {
            variant_axes_cap,
            sku_cap,
        }
    }

    /// Read caps from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            variant_axes_cap: parse_or(
                lookup(VARIANT_AXES_CAP_ENV),
                VARIANT_AXES_CAP_ENV,
                defaults.variant_axes_cap,
            ),
            sku_cap: parse_or(lookup(SKU_CAP_ENV), SKU_CAP_ENV, defaults.sku_cap),
        }
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(%name, %raw, %default, "invalid cap value; using default");
            default
        }),
    }
}
