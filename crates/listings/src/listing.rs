use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgemart_attributes::AttributeCatalog;
use forgemart_core::{Aggregate, AggregateId, AggregateRoot, Expected, SellerId, SnapshotId, TenantId};
use forgemart_events::Event;

use crate::append::{AppendBaseline, append_variant_values};
use crate::error::{VariantError, VariantResult};
use crate::generator::{GenerationContext, generate_variants};
use crate::input::{AttributeInputs, HeaderValue};
use crate::limits::VariantLimits;
use crate::normalize::{NormalizeOptions, normalize_attributes};
use crate::snapshot::VariantAxesSnapshot;
use crate::validate::validate_listing_variants;
use crate::variant::{ListingVariant, RepointedVariant, SkuPrefix, VariantKey, VariantSet};

/// Listing identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub AggregateId);

impl ListingId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ListingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Listing status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Published,
    Archived,
}

impl core::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Published => "published",
            ListingStatus::Archived => "archived",
        })
    }
}

/// Aggregate root: Listing.
///
/// Owns its header values, the current variant-axes snapshot and the variants
/// generated from it. Bound to the attribute catalog of its product type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    id: ListingId,
    tenant_id: Option<TenantId>,
    seller_id: Option<SellerId>,
    title: String,
    status: ListingStatus,
    base_price: Option<u64>, // Price in smallest currency unit (e.g., cents)
    headers: BTreeMap<String, HeaderValue>,
    axes_snapshot: Option<VariantAxesSnapshot>,
    variants: VariantSet,
    catalog: Arc<AttributeCatalog>,
    version: u64,
    created: bool,
}

impl Listing {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ListingId, catalog: Arc<AttributeCatalog>) -> Self {
        Self {
            id,
            tenant_id: None,
            seller_id: None,
            title: String::new(),
            status: ListingStatus::Draft,
            base_price: None,
            headers: BTreeMap::new(),
            axes_snapshot: None,
            variants: VariantSet::new(),
            catalog,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ListingId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn seller_id(&self) -> Option<SellerId> {
        self.seller_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> ListingStatus {
        self.status
    }

    pub fn base_price(&self) -> Option<u64> {
        self.base_price
    }

    pub fn headers(&self) -> &BTreeMap<String, HeaderValue> {
        &self.headers
    }

    pub fn axes_snapshot(&self) -> Option<&VariantAxesSnapshot> {
        self.axes_snapshot.as_ref()
    }

    pub fn current_snapshot_id(&self) -> Option<&SnapshotId> {
        self.axes_snapshot.as_ref().map(|s| &s.snapshot_id)
    }

    pub fn variants(&self) -> &VariantSet {
        &self.variants
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn sku_prefix(&self) -> SkuPrefix {
        SkuPrefix::for_listing(self.id)
    }

    /// Buyers can only purchase variants of a published listing.
    pub fn can_be_purchased(&self) -> bool {
        self.status == ListingStatus::Published
    }
}

impl AggregateRoot for Listing {
    type Id = ListingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateListing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateListing {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub seller_id: SellerId,
    pub title: String,
    pub base_price: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetListingAttributes (draft only, full replacement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetListingAttributes {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub inputs: AttributeInputs,
    pub limits: VariantLimits,
    pub expected_snapshot: Expected<SnapshotId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PublishListing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishListing {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AppendVariantValues (published only, additive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendVariantValues {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub inputs: AttributeInputs,
    pub limits: VariantLimits,
    /// Snapshot the caller based the delta on; must still be current.
    pub snapshot_id: SnapshotId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateVariantOffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVariantOffer {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub variant_key: VariantKey,
    pub price: Option<u64>,
    pub stock_qty: i64,
    pub is_active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveListing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveListing {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingCommand {
    CreateListing(CreateListing),
    SetListingAttributes(SetListingAttributes),
    PublishListing(PublishListing),
    AppendVariantValues(AppendVariantValues),
    UpdateVariantOffer(UpdateVariantOffer),
    ArchiveListing(ArchiveListing),
}

/// Event: ListingCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCreated {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub seller_id: SellerId,
    pub title: String,
    pub base_price: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ListingAttributesSet. Replaces headers, snapshot and variants wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingAttributesSet {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub headers: BTreeMap<String, HeaderValue>,
    pub snapshot: VariantAxesSnapshot,
    pub variants: VariantSet,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ListingPublished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPublished {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub snapshot_id: SnapshotId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VariantAxesAppended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAxesAppended {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub previous_snapshot_id: SnapshotId,
    pub snapshot: VariantAxesSnapshot,
    pub new_variants: Vec<ListingVariant>,
    pub repointed: Vec<RepointedVariant>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VariantOfferUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOfferUpdated {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub variant_key: VariantKey,
    pub price: Option<u64>,
    pub stock_qty: i64,
    pub is_active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ListingArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingArchived {
    pub tenant_id: TenantId,
    pub listing_id: ListingId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingEvent {
    ListingCreated(ListingCreated),
    ListingAttributesSet(ListingAttributesSet),
    ListingPublished(ListingPublished),
    VariantAxesAppended(VariantAxesAppended),
    VariantOfferUpdated(VariantOfferUpdated),
    ListingArchived(ListingArchived),
}

impl Event for ListingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ListingEvent::ListingCreated(_) => "listings.listing.created",
            ListingEvent::ListingAttributesSet(_) => "listings.listing.attributes_set",
            ListingEvent::ListingPublished(_) => "listings.listing.published",
            ListingEvent::VariantAxesAppended(_) => "listings.listing.variant_axes_appended",
            ListingEvent::VariantOfferUpdated(_) => "listings.listing.variant_offer_updated",
            ListingEvent::ListingArchived(_) => "listings.listing.archived",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ListingEvent::ListingCreated(e) => e.occurred_at,
            ListingEvent::ListingAttributesSet(e) => e.occurred_at,
            ListingEvent::ListingPublished(e) => e.occurred_at,
            ListingEvent::VariantAxesAppended(e) => e.occurred_at,
            ListingEvent::VariantOfferUpdated(e) => e.occurred_at,
            ListingEvent::ListingArchived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Listing {
    type Command = ListingCommand;
    type Event = ListingEvent;
    type Error = VariantError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ListingEvent::ListingCreated(e) => {
                self.id = e.listing_id;
                self.tenant_id = Some(e.tenant_id);
                self.seller_id = Some(e.seller_id);
                self.title = e.title.clone();
                self.base_price = e.base_price;
                self.status = ListingStatus::Draft;
                self.created = true;
            }
            ListingEvent::ListingAttributesSet(e) => {
                self.headers = e.headers.clone();
                self.axes_snapshot = Some(e.snapshot.clone());
                self.variants = e.variants.clone();
            }
            ListingEvent::ListingPublished(_) => {
                self.status = ListingStatus::Published;
            }
            ListingEvent::VariantAxesAppended(e) => {
                // Keys were checked when the event was decided.
                for update in &e.repointed {
                    if let Some(variant) = self.variants.get_mut(&update.variant_key) {
                        variant.selection_snapshot = update.selection_snapshot.clone();
                    }
                }
                self.variants.append(e.new_variants.iter().cloned());
                self.axes_snapshot = Some(e.snapshot.clone());
            }
            ListingEvent::VariantOfferUpdated(e) => {
                if let Some(variant) = self.variants.get_mut(&e.variant_key) {
                    variant.price = e.price;
                    variant.stock_qty = e.stock_qty;
                    variant.is_active = e.is_active;
                }
            }
            ListingEvent::ListingArchived(_) => {
                self.status = ListingStatus::Archived;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ListingCommand::CreateListing(cmd) => self.handle_create(cmd),
            ListingCommand::SetListingAttributes(cmd) => self.handle_set_attributes(cmd),
            ListingCommand::PublishListing(cmd) => self.handle_publish(cmd),
            ListingCommand::AppendVariantValues(cmd) => self.handle_append(cmd),
            ListingCommand::UpdateVariantOffer(cmd) => self.handle_update_offer(cmd),
            ListingCommand::ArchiveListing(cmd) => self.handle_archive(cmd),
        }
    }
}

impl Listing {
    fn ensure_created(&self, tenant_id: TenantId, listing_id: ListingId) -> VariantResult<()> {
        if !self.created {
            return Err(VariantError::NotFound);
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(VariantError::Validation("tenant mismatch".into()));
        }
        if self.id != listing_id {
            return Err(VariantError::Validation("listing_id mismatch".into()));
        }
        Ok(())
    }

    fn ensure_status(&self, allowed: ListingStatus, action: &'static str) -> VariantResult<()> {
        if self.status != allowed {
            return Err(VariantError::InvalidStatus {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateListing) -> VariantResult<Vec<ListingEvent>> {
        if self.created {
            return Err(VariantError::AlreadyExists);
        }
        if cmd.title.trim().is_empty() {
            return Err(VariantError::Validation("title cannot be empty".into()));
        }

        Ok(vec![ListingEvent::ListingCreated(ListingCreated {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            seller_id: cmd.seller_id,
            title: cmd.title.clone(),
            base_price: cmd.base_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    #[tracing::instrument(skip_all, fields(listing_id = %self.id))]
    fn handle_set_attributes(&self, cmd: &SetListingAttributes) -> VariantResult<Vec<ListingEvent>> {
        self.ensure_created(cmd.tenant_id, cmd.listing_id)?;
        self.ensure_status(ListingStatus::Draft, "set attributes on")?;

        let current = self.current_snapshot_id();
        match &cmd.expected_snapshot {
            Expected::Exact(expected) if !cmd.expected_snapshot.matches(current) => {
                return Err(VariantError::SnapshotMismatch {
                    expected: expected.clone(),
                    actual: current.cloned(),
                });
            }
            _ => {}
        }

        let normalized = normalize_attributes(
            &self.catalog,
            &cmd.inputs,
            &NormalizeOptions::full_replace(&cmd.limits),
        )?;
        let generated = generate_variants(
            &self.sku_prefix(),
            &normalized.axes,
            &GenerationContext {
                sku_cap: cmd.limits.sku_cap,
                previous_version: self.axes_snapshot.as_ref().map(|s| s.version),
                created_at: cmd.occurred_at,
                default_price: self.base_price,
            },
        )?;

        let variants = VariantSet::from(generated.variants);
        validate_listing_variants(&generated.snapshot, &variants)?;

        Ok(vec![ListingEvent::ListingAttributesSet(ListingAttributesSet {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            headers: normalized.headers,
            snapshot: generated.snapshot,
            variants,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_publish(&self, cmd: &PublishListing) -> VariantResult<Vec<ListingEvent>> {
        self.ensure_created(cmd.tenant_id, cmd.listing_id)?;
        self.ensure_status(ListingStatus::Draft, "publish")?;

        let Some(snapshot) = &self.axes_snapshot else {
            return Err(VariantError::Validation(
                "attributes must be set before publishing".into(),
            ));
        };

        Ok(vec![ListingEvent::ListingPublished(ListingPublished {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            snapshot_id: snapshot.snapshot_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    #[tracing::instrument(skip_all, fields(listing_id = %self.id))]
    fn handle_append(&self, cmd: &AppendVariantValues) -> VariantResult<Vec<ListingEvent>> {
        self.ensure_created(cmd.tenant_id, cmd.listing_id)?;
        if self.status == ListingStatus::Archived {
            return Err(VariantError::InvalidStatus {
                action: "append variant values to",
                status: self.status,
            });
        }

        let prefix = self.sku_prefix();
        let outcome = append_variant_values(
            &self.catalog,
            AppendBaseline {
                is_draft: self.status == ListingStatus::Draft,
                snapshot: self.axes_snapshot.as_ref(),
                variants: &self.variants,
                headers: &self.headers,
                prefix: &prefix,
                default_price: self.base_price,
            },
            &cmd.inputs,
            &cmd.snapshot_id,
            &cmd.limits,
            cmd.occurred_at,
        )?;

        let mut prospective = self.variants.clone();
        prospective.repoint(&outcome.repointed)?;
        prospective.append(outcome.new_variants.iter().cloned());
        validate_listing_variants(&outcome.snapshot, &prospective)?;

        Ok(vec![ListingEvent::VariantAxesAppended(VariantAxesAppended {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            previous_snapshot_id: cmd.snapshot_id.clone(),
            snapshot: outcome.snapshot,
            new_variants: outcome.new_variants,
            repointed: outcome.repointed,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_offer(&self, cmd: &UpdateVariantOffer) -> VariantResult<Vec<ListingEvent>> {
        self.ensure_created(cmd.tenant_id, cmd.listing_id)?;
        if self.status == ListingStatus::Archived {
            return Err(VariantError::InvalidStatus {
                action: "update offers on",
                status: self.status,
            });
        }
        if !self.variants.contains(&cmd.variant_key) {
            return Err(VariantError::UnknownVariant(cmd.variant_key.to_string()));
        }
        if cmd.stock_qty < 0 {
            return Err(VariantError::Validation(
                "stock quantity cannot be negative".into(),
            ));
        }

        Ok(vec![ListingEvent::VariantOfferUpdated(VariantOfferUpdated {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            variant_key: cmd.variant_key.clone(),
            price: cmd.price,
            stock_qty: cmd.stock_qty,
            is_active: cmd.is_active,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveListing) -> VariantResult<Vec<ListingEvent>> {
        self.ensure_created(cmd.tenant_id, cmd.listing_id)?;
        if self.status == ListingStatus::Archived {
            return Err(VariantError::InvalidStatus {
                action: "archive",
                status: self.status,
            });
        }

        Ok(vec![ListingEvent::ListingArchived(ListingArchived {
            tenant_id: cmd.tenant_id,
            listing_id: cmd.listing_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
