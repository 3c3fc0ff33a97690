//! Listing variants: key and SKU derivation, materialization, and the owned
//! variant collection of a listing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use forgemart_core::{Entity, ValueObject};

use crate::axis::AxisSelection;
use crate::error::{VariantError, VariantResult};
use crate::listing::ListingId;
use crate::snapshot::{VariantAxesSnapshot, VariantSelectionSnapshot};

/// Canonical `"defKey:value|defKey:value"` identifier of one combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl ValueObject for VariantKey {}

impl VariantKey {
    pub const DEFAULT: &'static str = "default";

    /// Tokens follow selection order (axis order, then member order).
    pub fn from_selections(selections: &[AxisSelection]) -> Self {
        if selections.is_empty() {
            return Self(Self::DEFAULT.to_string());
        }
        let key = selections
            .iter()
            .map(|s| format!("{}:{}", s.definition_key, s.value.token()))
            .collect::<Vec<_>>()
            .join("|");
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Listing-scoped SKU prefix: the listing id in upper-case base 36.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkuPrefix(String);

impl SkuPrefix {
    pub fn for_listing(listing_id: ListingId) -> Self {
        Self(base36(listing_id.0.as_u128()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// Upper-cased alphanumerics (Unicode letters included); every other run of
/// characters becomes one dash.
pub fn sanitize_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "X".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkuCode(String);

impl ValueObject for SkuCode {}

impl SkuCode {
    /// `<PREFIX>-<TOKEN>-<TOKEN>…`, or `SKU-<PREFIX>-DEFAULT` without axes.
    pub fn derive(prefix: &SkuPrefix, selections: &[AxisSelection]) -> Self {
        if selections.is_empty() {
            return Self(format!("SKU-{}-DEFAULT", prefix.as_str()));
        }
        let mut code = prefix.as_str().to_string();
        for selection in selections {
            code.push('-');
            code.push_str(&sanitize_token(&selection.value.token()));
        }
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SkuCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out unique SKU codes, suffixing `-2`, `-3`, … when sanitization collides.
#[derive(Debug, Clone, Default)]
pub struct SkuCodeAllocator {
    taken: BTreeSet<String>,
}

impl SkuCodeAllocator {
    pub fn reserving<'a>(codes: impl IntoIterator<Item = &'a SkuCode>) -> Self {
        Self {
            taken: codes.into_iter().map(|c| c.0.clone()).collect(),
        }
    }

    pub fn allocate(&mut self, candidate: SkuCode) -> SkuCode {
        if self.taken.insert(candidate.0.clone()) {
            return candidate;
        }
        let mut n = 2u64;
        loop {
            let code = format!("{}-{n}", candidate.0);
            if self.taken.insert(code.clone()) {
                return SkuCode(code);
            }
            n += 1;
        }
    }
}

/// One purchasable combination of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingVariant {
    pub variant_key: VariantKey,
    pub sku_code: SkuCode,
    /// Price in smallest currency unit (e.g. cents).
    pub price: Option<u64>,
    pub stock_qty: i64,
    pub is_active: bool,
    pub selection_snapshot: VariantSelectionSnapshot,
    /// One record per assigned attribute value (per member for group axes).
    pub attributes: Vec<AxisSelection>,
}

impl Entity for ListingVariant {
    type Id = VariantKey;

    fn id(&self) -> &Self::Id {
        &self.variant_key
    }
}

/// Turns flattened cross-product combinations into concrete variants pointing
/// into one snapshot.
#[derive(Debug)]
pub struct VariantMaterializer<'a> {
    prefix: &'a SkuPrefix,
    snapshot: &'a VariantAxesSnapshot,
    default_price: Option<u64>,
    allocator: SkuCodeAllocator,
}

impl<'a> VariantMaterializer<'a> {
    pub fn new(
        prefix: &'a SkuPrefix,
        snapshot: &'a VariantAxesSnapshot,
        default_price: Option<u64>,
    ) -> Self {
        Self {
            prefix,
            snapshot,
            default_price,
            allocator: SkuCodeAllocator::default(),
        }
    }

    /// Keep existing SKU codes out of the allocation space.
    pub fn reserving<'b>(mut self, codes: impl IntoIterator<Item = &'b SkuCode>) -> Self {
        self.allocator = SkuCodeAllocator::reserving(codes);
        self
    }

    pub fn materialize(&mut self, selections: Vec<AxisSelection>) -> VariantResult<ListingVariant> {
        let variant_key = VariantKey::from_selections(&selections);
        let sku_code = self
            .allocator
            .allocate(SkuCode::derive(self.prefix, &selections));
        let selection_snapshot = self.snapshot.selection_snapshot(&selections)?;
        Ok(ListingVariant {
            variant_key,
            sku_code,
            price: self.default_price,
            stock_qty: 0,
            is_active: true,
            selection_snapshot,
            attributes: selections,
        })
    }
}

/// New selection pointer for an existing variant after its axes grew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepointedVariant {
    pub variant_key: VariantKey,
    pub selection_snapshot: VariantSelectionSnapshot,
}

/// The variants owned by one listing, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSet {
    variants: Vec<ListingVariant>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every variant and take `variants` in their place.
    pub fn replace(&mut self, variants: Vec<ListingVariant>) {
        self.variants = variants;
    }

    pub fn append(&mut self, variants: impl IntoIterator<Item = ListingVariant>) {
        self.variants.extend(variants);
    }

    /// Swap in new selection pointers; every key must already exist.
    pub fn repoint(&mut self, updates: &[RepointedVariant]) -> VariantResult<()> {
        for update in updates {
            let variant = self.get_mut(&update.variant_key).ok_or_else(|| {
                VariantError::invalid_state(format!(
                    "cannot repoint unknown variant '{}'",
                    update.variant_key
                ))
            })?;
            variant.selection_snapshot = update.selection_snapshot.clone();
        }
        Ok(())
    }

    pub fn get(&self, key: &VariantKey) -> Option<&ListingVariant> {
        self.variants.iter().find(|v| v.id() == key)
    }

    pub fn get_mut(&mut self, key: &VariantKey) -> Option<&mut ListingVariant> {
        self.variants.iter_mut().find(|v| v.id() == key)
    }

    pub fn contains(&self, key: &VariantKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingVariant> {
        self.variants.iter()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn keys(&self) -> BTreeSet<&VariantKey> {
        self.variants.iter().map(|v| &v.variant_key).collect()
    }

    pub fn sku_codes(&self) -> impl Iterator<Item = &SkuCode> {
        self.variants.iter().map(|v| &v.sku_code)
    }
}

impl From<Vec<ListingVariant>> for VariantSet {
    fn from(variants: Vec<ListingVariant>) -> Self {
        Self { variants }
    }
}
