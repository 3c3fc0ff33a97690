//! Incremental growth of a published listing's existing axes.
//!
//! Existing variants keep their keys, SKU codes, prices and stock; only their
//! selection pointers move to the new snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use forgemart_attributes::AttributeCatalog;
use forgemart_core::SnapshotId;

use crate::axis::VariantAxis;
use crate::error::{VariantError, VariantResult};
use crate::expand;
use crate::input::{AttributeInputs, HeaderValue};
use crate::limits::VariantLimits;
use crate::normalize::{ChosenCodes, NormalizeOptions, merge_chosen_codes, normalize_attributes};
use crate::snapshot::VariantAxesSnapshot;
use crate::variant::{
    ListingVariant, RepointedVariant, SkuPrefix, VariantKey, VariantMaterializer, VariantSet,
};

/// Current state of the listing being grown.
#[derive(Debug, Clone, Copy)]
pub struct AppendBaseline<'a> {
    pub is_draft: bool,
    pub snapshot: Option<&'a VariantAxesSnapshot>,
    pub variants: &'a VariantSet,
    pub headers: &'a BTreeMap<String, HeaderValue>,
    pub prefix: &'a SkuPrefix,
    pub default_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub snapshot: VariantAxesSnapshot,
    pub new_variants: Vec<ListingVariant>,
    /// Every pre-existing variant, pointed at `snapshot`.
    pub repointed: Vec<RepointedVariant>,
}

/// Add new values to existing axes and create only the missing combinations.
#[tracing::instrument(skip_all, fields(expected_snapshot = %expected_snapshot))]
pub fn append_variant_values(
    catalog: &AttributeCatalog,
    baseline: AppendBaseline<'_>,
    inputs: &AttributeInputs,
    expected_snapshot: &SnapshotId,
    limits: &VariantLimits,
    created_at: DateTime<Utc>,
) -> VariantResult<AppendOutcome> {
    if baseline.is_draft {
        return Err(VariantError::AppendWhileDraft);
    }
    let current = match baseline.snapshot {
        Some(snapshot) if &snapshot.snapshot_id == expected_snapshot => snapshot,
        other => {
            return Err(VariantError::SnapshotMismatch {
                expected: expected_snapshot.clone(),
                actual: other.map(|s| s.snapshot_id.clone()),
            });
        }
    };
    if inputs.is_empty() {
        return Err(VariantError::NoNewValues);
    }

    // Only existing axes may grow; checked before normalization so a new axis
    // is reported as such rather than as an axis-cap overflow.
    for key in inputs.keys() {
        let definition = catalog
            .get(key)
            .ok_or_else(|| VariantError::UnknownAttribute(key.clone()))?;
        if let Some(group) = definition.member_of() {
            return Err(VariantError::GroupMemberNotSettable {
                attribute: key.clone(),
                group: group.to_string(),
            });
        }
        if !current.contains_axis(key) {
            return Err(VariantError::NewAxisAfterPublish(key.clone()));
        }
    }

    let existing_axes = current.to_runtime(catalog)?;
    let mut inherited = ChosenCodes::new();
    merge_chosen_codes(&mut inherited, &existing_axes, baseline.headers);
    let delta = normalize_attributes(
        catalog,
        inputs,
        &NormalizeOptions::append(existing_axes.len(), inherited),
    )?;

    let merged = merge_axes(&existing_axes, &delta.axes);
    let existing_count = current
        .sku_count()
        .ok_or_else(|| VariantError::invalid_state("current snapshot count overflows"))?;
    if existing_count != baseline.variants.len() as u64 {
        return Err(VariantError::invalid_state(format!(
            "listing holds {} variants, snapshot expands to {existing_count}",
            baseline.variants.len()
        )));
    }

    let merged_count = expand::estimate_sku_count(&merged);
    let new_count = match merged_count {
        Some(total) => total.checked_sub(existing_count).ok_or_else(|| {
            VariantError::invalid_state(format!(
                "merged axes expand to {total}, fewer than the existing {existing_count}"
            ))
        })?,
        None => {
            return Err(VariantError::SkuCapExceeded {
                requested: None,
                cap: limits.sku_cap,
            });
        }
    };
    if new_count == 0 {
        return Err(VariantError::NoNewValues);
    }
    let room = limits.sku_cap.saturating_sub(existing_count);
    if new_count > room {
        tracing::warn!(new_count, existing_count, sku_cap = limits.sku_cap, "append exceeds SKU cap");
        return Err(VariantError::SkuCapExceeded {
            requested: merged_count,
            cap: limits.sku_cap,
        });
    }

    let snapshot = VariantAxesSnapshot::capture(&merged, Some(current.version), created_at);
    let existing_keys = baseline.variants.keys();
    let mut materializer = VariantMaterializer::new(baseline.prefix, &snapshot, baseline.default_price)
        .reserving(baseline.variants.sku_codes());
    let new_variants = expand::cartesian(&merged)
        .into_iter()
        .filter(|selections| !existing_keys.contains(&VariantKey::from_selections(selections)))
        .map(|selections| materializer.materialize(selections))
        .collect::<VariantResult<Vec<_>>>()?;
    if new_variants.len() as u64 != new_count {
        return Err(VariantError::invalid_state(format!(
            "appended {} variants, expected {new_count}",
            new_variants.len()
        )));
    }

    let repointed = baseline
        .variants
        .iter()
        .map(|variant| {
            snapshot
                .selection_snapshot(&variant.attributes)
                .map(|selection_snapshot| RepointedVariant {
                    variant_key: variant.variant_key.clone(),
                    selection_snapshot,
                })
        })
        .collect::<VariantResult<Vec<_>>>()?;

    tracing::info!(
        snapshot_id = %snapshot.snapshot_id,
        version = snapshot.version,
        new_variants = new_variants.len(),
        "variant values appended"
    );
    Ok(AppendOutcome {
        snapshot,
        new_variants,
        repointed,
    })
}

/// Existing axes with the delta's genuinely new choices merged in.
fn merge_axes(existing: &[VariantAxis], delta: &[VariantAxis]) -> Vec<VariantAxis> {
    existing
        .iter()
        .map(|axis| match delta.iter().find(|d| d.key() == axis.key()) {
            Some(added) => axis.extended(
                added
                    .choices()
                    .iter()
                    .filter(|c| !axis.contains_key(c.key()))
                    .cloned(),
            ),
            None => axis.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GenerationContext, GeneratedVariants, generate_variants};
    use crate::input::AttributeInput;
    use crate::test_support::{catalog, inputs, listing_id, rows};

    struct Published {
        generated: GeneratedVariants,
        variants: VariantSet,
        headers: BTreeMap<String, HeaderValue>,
        prefix: SkuPrefix,
    }

    impl Published {
        fn new(pairs: Vec<(&str, Option<AttributeInput>)>) -> Self {
            let normalized = normalize_attributes(
                &catalog(),
                &inputs(pairs),
                &NormalizeOptions::full_replace(&VariantLimits::default()),
            )
            .unwrap();
            let prefix = SkuPrefix::for_listing(listing_id(77));
            let generated = generate_variants(
                &prefix,
                &normalized.axes,
                &GenerationContext {
                    sku_cap: 100,
                    previous_version: None,
                    created_at: Utc::now(),
                    default_price: Some(2500),
                },
            )
            .unwrap();
            Self {
                variants: generated.variants.clone().into(),
                generated,
                headers: normalized.headers,
                prefix,
            }
        }

        fn baseline(&self) -> AppendBaseline<'_> {
            AppendBaseline {
                is_draft: false,
                snapshot: Some(&self.generated.snapshot),
                variants: &self.variants,
                headers: &self.headers,
                prefix: &self.prefix,
                default_price: Some(2500),
            }
        }

        fn append(
            &self,
            pairs: Vec<(&str, Option<AttributeInput>)>,
            limits: VariantLimits,
        ) -> VariantResult<AppendOutcome> {
            append_variant_values(
                &catalog(),
                self.baseline(),
                &inputs(pairs),
                &self.generated.snapshot.snapshot_id,
                &limits,
                Utc::now(),
            )
        }
    }

    fn color_size() -> Published {
        Published::new(vec![
            ("color", Some(AttributeInput::options(["red", "blue"]))),
            ("size", Some(AttributeInput::options(["S", "M"]))),
        ])
    }

    #[test]
    fn new_size_creates_only_missing_combinations() {
        let listing = color_size();
        let outcome = listing
            .append(
                vec![("size", Some(AttributeInput::options(["L"])))],
                VariantLimits::default(),
            )
            .unwrap();

        let keys: Vec<_> = outcome
            .new_variants
            .iter()
            .map(|v| v.variant_key.as_str())
            .collect();
        assert_eq!(keys, vec!["color:red|size:L", "color:blue|size:L"]);
        assert!(outcome.new_variants.iter().all(|v| v.price == Some(2500)));
        assert_eq!(outcome.snapshot.version, 2);
        assert_ne!(outcome.snapshot.snapshot_id, listing.generated.snapshot.snapshot_id);
        assert_eq!(outcome.snapshot.sku_count(), Some(6));

        assert_eq!(outcome.repointed.len(), 4);
        assert!(outcome
            .repointed
            .iter()
            .all(|r| r.selection_snapshot.snapshot_id == outcome.snapshot.snapshot_id));
    }

    #[test]
    fn resubmitting_existing_values_is_ignored_alongside_new_ones() {
        let listing = color_size();
        let outcome = listing
            .append(
                vec![("color", Some(AttributeInput::options(["red", "green"])))],
                VariantLimits::default(),
            )
            .unwrap();
        assert_eq!(outcome.new_variants.len(), 2);
        assert!(outcome
            .new_variants
            .iter()
            .all(|v| v.variant_key.as_str().starts_with("color:green")));
    }

    #[test]
    fn appended_sku_codes_yield_to_existing_ones() {
        use crate::validate::validate_listing_variants;
        use forgemart_attributes::{AttributeDefinition, EnumOption, EnumSpec};

        let catalog = AttributeCatalog::new(
            "trousers",
            vec![AttributeDefinition::enumeration(
                "style",
                1,
                EnumSpec {
                    parent: None,
                    options: vec![EnumOption::new("slim fit", 1), EnumOption::new("slim-fit", 2)],
                },
            )
            .variant()],
        )
        .unwrap();
        let limits = VariantLimits::default();
        let prefix = SkuPrefix::for_listing(listing_id(77));
        let normalized = normalize_attributes(
            &catalog,
            &inputs(vec![("style", Some(AttributeInput::options(["slim fit"])))]),
            &NormalizeOptions::full_replace(&limits),
        )
        .unwrap();
        let generated = generate_variants(
            &prefix,
            &normalized.axes,
            &GenerationContext {
                sku_cap: limits.sku_cap,
                previous_version: None,
                created_at: Utc::now(),
                default_price: None,
            },
        )
        .unwrap();
        let mut variants: VariantSet = generated.variants.clone().into();
        assert_eq!(variants.iter().next().unwrap().sku_code.as_str(), "25-SLIM-FIT");

        let outcome = append_variant_values(
            &catalog,
            AppendBaseline {
                is_draft: false,
                snapshot: Some(&generated.snapshot),
                variants: &variants,
                headers: &normalized.headers,
                prefix: &prefix,
                default_price: None,
            },
            &inputs(vec![("style", Some(AttributeInput::options(["slim-fit"])))]),
            &generated.snapshot.snapshot_id,
            &limits,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(outcome.new_variants.len(), 1);
        assert_eq!(outcome.new_variants[0].variant_key.as_str(), "style:slim-fit");
        assert_eq!(outcome.new_variants[0].sku_code.as_str(), "25-SLIM-FIT-2");

        variants.append(outcome.new_variants);
        variants.repoint(&outcome.repointed).unwrap();
        let skus: Vec<_> = variants.iter().map(|v| v.sku_code.as_str()).collect();
        assert_eq!(skus, vec!["25-SLIM-FIT", "25-SLIM-FIT-2"]);
        validate_listing_variants(&outcome.snapshot, &variants).unwrap();
    }

    #[test]
    fn only_existing_values_is_no_new_values() {
        let listing = color_size();
        let err = listing
            .append(
                vec![("size", Some(AttributeInput::options(["S"])))],
                VariantLimits::default(),
            )
            .unwrap_err();
        assert_eq!(err, VariantError::NoNewValues);
    }

    #[test]
    fn new_axis_is_rejected() {
        let listing = color_size();
        let err = listing
            .append(
                vec![("weight", Some(AttributeInput::Numbers(vec![rust_decimal::Decimal::ONE])))],
                VariantLimits::default(),
            )
            .unwrap_err();
        assert_eq!(err, VariantError::NewAxisAfterPublish("weight".into()));
    }

    #[test]
    fn draft_and_stale_snapshots_are_rejected() {
        let listing = color_size();
        let delta = inputs(vec![("size", Some(AttributeInput::options(["L"])))]);

        let draft = AppendBaseline {
            is_draft: true,
            ..listing.baseline()
        };
        let err = append_variant_values(
            &catalog(),
            draft,
            &delta,
            &listing.generated.snapshot.snapshot_id,
            &VariantLimits::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, VariantError::AppendWhileDraft);

        let stale = SnapshotId::new();
        let err = append_variant_values(
            &catalog(),
            listing.baseline(),
            &delta,
            &stale,
            &VariantLimits::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            VariantError::SnapshotMismatch {
                expected: stale,
                actual: Some(listing.generated.snapshot.snapshot_id.clone()),
            }
        );
    }

    #[test]
    fn cap_counts_existing_variants() {
        let listing = color_size();
        // 4 existing + 2 new = 6 > 5
        let err = listing
            .append(
                vec![("size", Some(AttributeInput::options(["L"])))],
                VariantLimits::new(3, 5),
            )
            .unwrap_err();
        assert_eq!(
            err,
            VariantError::SkuCapExceeded {
                requested: Some(6),
                cap: 5
            }
        );
    }

    #[test]
    fn group_rows_append_and_sku_codes_stay_unique() {
        let listing = Published::new(vec![
            ("color", Some(AttributeInput::options(["red"]))),
            ("dims", Some(rows(&[&[100, 300]]))),
        ]);
        let outcome = listing
            .append(
                vec![("dims", Some(rows(&[&[100, 300], &[50, 80]])))],
                VariantLimits::default(),
            )
            .unwrap();
        assert_eq!(outcome.new_variants.len(), 1);
        assert_eq!(
            outcome.new_variants[0].variant_key.as_str(),
            "color:red|width:50|length:80"
        );
        // the new row sorts first, but the existing variant keeps its pointer target
        assert_eq!(
            outcome.repointed[0].selection_snapshot.selections[1].choice_key,
            "width=100,length=300"
        );
    }

    #[test]
    fn appended_values_respect_inherited_parents() {
        let listing = Published::new(vec![
            ("color", Some(AttributeInput::options(["red"]))),
            ("category", Some(AttributeInput::code("shoes"))),
            ("shoe_size", Some(AttributeInput::options(["42"]))),
        ]);
        let outcome = listing
            .append(
                vec![("shoe_size", Some(AttributeInput::options(["43"])))],
                VariantLimits::default(),
            )
            .unwrap();
        assert_eq!(outcome.new_variants.len(), 1);
    }
}
