//! Listings domain module (event-sourced).
//!
//! Turns a seller's attribute choices into the concrete purchasable variants of
//! a listing: choices are normalized against the product type's attribute
//! catalog, expanded into their cartesian product, frozen into a versioned
//! axes snapshot and materialized as variants with stable keys and SKU codes.
//! Published listings can only grow along their existing axes.
//!
//! Pure domain logic: no IO, no HTTP, no storage.

pub mod append;
pub mod axis;
pub mod canonical;
pub mod error;
pub mod expand;
pub mod generator;
pub mod input;
pub mod limits;
pub mod listing;
pub mod normalize;
pub mod snapshot;
pub mod validate;
pub mod variant;

#[cfg(test)]
mod test_support;

pub use append::{AppendBaseline, AppendOutcome, append_variant_values};
pub use axis::{AxisChoice, AxisSelection, ChoiceValue, GroupMemberValue, NormalizedAxisChoice, VariantAxis};
pub use error::{VariantError, VariantResult};
pub use expand::{cartesian, ensure_within_sku_cap, estimate_sku_count};
pub use generator::{GeneratedVariants, GenerationContext, generate_variants};
pub use input::{AttributeInput, AttributeInputs, HeaderValue};
pub use limits::VariantLimits;
pub use listing::{
    AppendVariantValues, ArchiveListing, CreateListing, Listing, ListingArchived,
    ListingAttributesSet, ListingCommand, ListingCreated, ListingEvent, ListingId,
    ListingPublished, ListingStatus, PublishListing, SetListingAttributes, UpdateVariantOffer,
    VariantAxesAppended, VariantOfferUpdated,
};
pub use normalize::{ChosenCodes, NormalizeOptions, NormalizedAttributes, normalize_attributes};
pub use snapshot::{
    AxisChoiceSnapshot, AxisSelectionRef, GroupMemberSnapshot, VariantAxesSnapshot,
    VariantAxisSnapshot, VariantSelectionSnapshot,
};
pub use validate::validate_listing_variants;
pub use variant::{
    ListingVariant, RepointedVariant, SkuCode, SkuPrefix, VariantKey, VariantMaterializer,
    VariantSet,
};
