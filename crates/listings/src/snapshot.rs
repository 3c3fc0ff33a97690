//! Portable, versioned snapshots of a listing's variant axes.
//!
//! Snapshots address everything by definition key, option code and numeric
//! value so they can be stored and later rehydrated against the live schema.
//! Each variant points into the current snapshot through a
//! [`VariantSelectionSnapshot`] whose id must always equal the listing's
//! current [`VariantAxesSnapshot::snapshot_id`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use forgemart_attributes::{AttributeCatalog, AttributeDefinition, AttributeKind};
use forgemart_core::SnapshotId;

use crate::axis::{AxisChoice, AxisSelection, ChoiceValue, GroupMemberValue, NormalizedAxisChoice, VariantAxis};
use crate::canonical;
use crate::error::{VariantError, VariantResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAxesSnapshot {
    pub snapshot_id: SnapshotId,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub axes: Vec<VariantAxisSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAxisSnapshot {
    pub definition_key: String,
    pub is_group: bool,
    pub choices: Vec<AxisChoiceSnapshot>,
}

/// Persisted form of an [`AxisChoice`]: exactly one payload field is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisChoiceSnapshot {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_option_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_option_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_members: Option<Vec<GroupMemberSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberSnapshot {
    pub member_definition_key: String,
    pub value: Decimal,
}

/// A variant's pointer into one axes snapshot: one ref per axis, in axis order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSelectionSnapshot {
    pub snapshot_id: SnapshotId,
    pub selections: Vec<AxisSelectionRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSelectionRef {
    pub definition_key: String,
    pub choice_key: String,
}

enum Payload<'a> {
    Enum(&'a str),
    Lookup(&'a str),
    Numeric(Decimal),
    Group(&'a [GroupMemberSnapshot]),
}

impl VariantAxesSnapshot {
    /// Freeze canonically ordered axes under a freshly minted snapshot id.
    pub fn capture(
        axes: &[VariantAxis],
        previous_version: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_id: SnapshotId::new(),
            version: previous_version.map_or(1, |v| v.saturating_add(1)),
            created_at,
            axes: axes.iter().map(VariantAxisSnapshot::from).collect(),
        }
    }

    pub fn axis(&self, definition_key: &str) -> Option<&VariantAxisSnapshot> {
        self.axes.iter().find(|a| a.definition_key == definition_key)
    }

    pub fn contains_axis(&self, definition_key: &str) -> bool {
        self.axis(definition_key).is_some()
    }

    /// Product of axis cardinalities (`None` on overflow).
    pub fn sku_count(&self) -> Option<u64> {
        self.axes.iter().try_fold(1u64, |acc, axis| {
            acc.checked_mul(u64::try_from(axis.choices.len()).ok()?)
        })
    }

    /// Rehydrate the runtime axes against a live schema.
    ///
    /// Fails with an invalid-state error when a referenced definition, option or
    /// group member no longer exists.
    pub fn to_runtime(&self, catalog: &AttributeCatalog) -> VariantResult<Vec<VariantAxis>> {
        let mut axes = self
            .axes
            .iter()
            .map(|axis| axis.to_runtime(catalog))
            .collect::<VariantResult<Vec<_>>>()?;
        canonical::sort_axes(&mut axes);
        Ok(axes)
    }

    /// Point one variant's selections at this snapshot's choices.
    pub fn selection_snapshot(
        &self,
        selections: &[AxisSelection],
    ) -> VariantResult<VariantSelectionSnapshot> {
        let refs = self
            .axes
            .iter()
            .map(|axis| {
                axis.resolve(selections).map(|choice| AxisSelectionRef {
                    definition_key: axis.definition_key.clone(),
                    choice_key: choice.key.clone(),
                })
            })
            .collect::<VariantResult<Vec<_>>>()?;
        Ok(VariantSelectionSnapshot {
            snapshot_id: self.snapshot_id.clone(),
            selections: refs,
        })
    }
}

impl From<&VariantAxis> for VariantAxisSnapshot {
    fn from(axis: &VariantAxis) -> Self {
        Self {
            definition_key: axis.key().to_string(),
            is_group: axis.is_group(),
            choices: axis.choices().iter().map(AxisChoiceSnapshot::from).collect(),
        }
    }
}

impl VariantAxisSnapshot {
    pub fn choice(&self, key: &str) -> Option<&AxisChoiceSnapshot> {
        self.choices.iter().find(|c| c.key == key)
    }

    fn to_runtime(&self, catalog: &AttributeCatalog) -> VariantResult<VariantAxis> {
        let definition = catalog.get(&self.definition_key).ok_or_else(|| {
            VariantError::invalid_state(format!(
                "attribute definition '{}' not found in product type '{}'",
                self.definition_key,
                catalog.product_type()
            ))
        })?;
        if definition.is_group() != self.is_group {
            return Err(VariantError::invalid_state(format!(
                "axis '{}' group flag does not match its definition",
                self.definition_key
            )));
        }

        let members = if self.is_group {
            catalog
                .group_members(&self.definition_key)
                .map_err(|e| VariantError::invalid_state(e.to_string()))?
        } else {
            Vec::new()
        };

        let choices = self
            .choices
            .iter()
            .map(|c| c.to_runtime(definition, &members))
            .collect::<VariantResult<Vec<_>>>()?;
        Ok(VariantAxis::new(definition.clone(), choices))
    }

    /// The choice matching a variant's selections on this axis.
    ///
    /// Group choices are content-addressed: every member value must match, in
    /// canonical member order.
    pub fn resolve(&self, selections: &[AxisSelection]) -> VariantResult<&AxisChoiceSnapshot> {
        let found = if self.is_group {
            let members: Vec<&AxisSelection> = selections
                .iter()
                .filter(|s| s.group_key.as_deref() == Some(self.definition_key.as_str()))
                .collect();
            self.choices.iter().find(|c| c.matches_group(&members))
        } else {
            selections
                .iter()
                .find(|s| s.group_key.is_none() && s.definition_key == self.definition_key)
                .and_then(|s| self.choices.iter().find(|c| c.matches_single(&s.value)))
        };
        found.ok_or_else(|| {
            VariantError::invalid_state(format!(
                "no choice on axis '{}' matches the variant's selection",
                self.definition_key
            ))
        })
    }
}

impl From<&AxisChoice> for AxisChoiceSnapshot {
    fn from(choice: &AxisChoice) -> Self {
        let mut snapshot = Self {
            key: choice.key().to_string(),
            enum_option_code: None,
            lookup_option_code: None,
            numeric_value: None,
            group_members: None,
        };
        match choice.value() {
            ChoiceValue::Enum { code, .. } => snapshot.enum_option_code = Some(code.clone()),
            ChoiceValue::Lookup(code) => snapshot.lookup_option_code = Some(code.clone()),
            ChoiceValue::Numeric(value) => snapshot.numeric_value = Some(*value),
            ChoiceValue::Group(members) => {
                snapshot.group_members = Some(
                    members
                        .iter()
                        .map(|m| GroupMemberSnapshot {
                            member_definition_key: m.member_key.clone(),
                            value: m.value,
                        })
                        .collect(),
                )
            }
        }
        snapshot
    }
}

impl AxisChoiceSnapshot {
    fn payload(&self) -> VariantResult<Payload<'_>> {
        let payloads = [
            self.enum_option_code.as_deref().map(Payload::Enum),
            self.lookup_option_code.as_deref().map(Payload::Lookup),
            self.numeric_value.map(Payload::Numeric),
            self.group_members.as_deref().map(Payload::Group),
        ];
        let mut set = payloads.into_iter().flatten();
        match (set.next(), set.next()) {
            (Some(payload), None) => Ok(payload),
            _ => Err(VariantError::invalid_state(format!(
                "snapshot choice '{}' must carry exactly one payload",
                self.key
            ))),
        }
    }

    fn to_runtime(
        &self,
        definition: &AttributeDefinition,
        members: &[&AttributeDefinition],
    ) -> VariantResult<AxisChoice> {
        let missing = |what: String| {
            VariantError::invalid_state(format!(
                "{what} referenced by snapshot axis '{}' no longer exists",
                definition.key
            ))
        };

        let choice = match (&definition.kind, self.payload()?) {
            (AttributeKind::Enum(spec), Payload::Enum(code)) => {
                let option = spec
                    .option(code)
                    .ok_or_else(|| missing(format!("enum option '{code}'")))?;
                AxisChoice::enumeration(code, option.position)
            }
            (AttributeKind::Lookup(spec), Payload::Lookup(code)) => {
                if !spec.options.iter().any(|o| o.code == code) {
                    return Err(missing(format!("lookup option '{code}'")));
                }
                AxisChoice::lookup(code)
            }
            (AttributeKind::Numeric(_), Payload::Numeric(value)) => AxisChoice::numeric(value),
            (AttributeKind::Group(_), Payload::Group(stored)) => {
                if stored.len() != members.len() {
                    return Err(VariantError::invalid_state(format!(
                        "group choice '{}' has {} members, schema declares {}",
                        self.key,
                        stored.len(),
                        members.len()
                    )));
                }
                let mut values = Vec::with_capacity(stored.len());
                for (stored, member) in stored.iter().zip(members) {
                    if stored.member_definition_key != member.key {
                        return Err(missing(format!(
                            "group member '{}'",
                            stored.member_definition_key
                        )));
                    }
                    values.push(GroupMemberValue {
                        member_key: member.key.clone(),
                        value: stored.value,
                    });
                }
                AxisChoice::group(values)
            }
            _ => {
                return Err(VariantError::invalid_state(format!(
                    "snapshot choice '{}' does not fit {} attribute '{}'",
                    self.key,
                    definition.kind_name(),
                    definition.key
                )));
            }
        };

        if choice.key() != self.key {
            return Err(VariantError::invalid_state(format!(
                "snapshot choice key '{}' does not match its content ('{}')",
                self.key,
                choice.key()
            )));
        }
        Ok(choice)
    }

    fn matches_single(&self, value: &NormalizedAxisChoice) -> bool {
        match value {
            NormalizedAxisChoice::Enum(code) => self.enum_option_code.as_deref() == Some(code),
            NormalizedAxisChoice::Lookup(code) => self.lookup_option_code.as_deref() == Some(code),
            NormalizedAxisChoice::Numeric(v) => self.numeric_value == Some(*v),
        }
    }

    fn matches_group(&self, selections: &[&AxisSelection]) -> bool {
        let Some(members) = &self.group_members else {
            return false;
        };
        members.len() == selections.len()
            && members.iter().zip(selections).all(|(member, selection)| {
                member.member_definition_key == selection.definition_key
                    && selection.value == NormalizedAxisChoice::Numeric(member.value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgemart_attributes::{EnumOption, EnumSpec, NumericSpec};

    fn catalog() -> AttributeCatalog {
        AttributeCatalog::new(
            "rug",
            vec![
                AttributeDefinition::enumeration(
                    "color",
                    1,
                    EnumSpec {
                        parent: None,
                        options: vec![EnumOption::new("red", 1), EnumOption::new("blue", 2)],
                    },
                )
                .variant(),
                AttributeDefinition::group("dims", 2, vec!["width".into(), "length".into()]),
                AttributeDefinition::numeric("width", 1, NumericSpec::default().in_group("dims")),
                AttributeDefinition::numeric("length", 2, NumericSpec::default().in_group("dims")),
            ],
        )
        .unwrap()
    }

    fn row(width: i64, length: i64) -> AxisChoice {
        AxisChoice::group(vec![
            GroupMemberValue {
                member_key: "width".into(),
                value: Decimal::from(width),
            },
            GroupMemberValue {
                member_key: "length".into(),
                value: Decimal::from(length),
            },
        ])
    }

    fn axes(catalog: &AttributeCatalog) -> Vec<VariantAxis> {
        vec![
            VariantAxis::new(
                catalog.get("color").unwrap().clone(),
                vec![AxisChoice::enumeration("red", 1), AxisChoice::enumeration("blue", 2)],
            ),
            VariantAxis::new(
                catalog.get("dims").unwrap().clone(),
                vec![row(150, 400), row(100, 300)],
            ),
        ]
    }

    #[test]
    fn capture_and_rehydrate_round_trip() {
        let catalog = catalog();
        let axes = axes(&catalog);
        let snapshot = VariantAxesSnapshot::capture(&axes, None, Utc::now());
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.sku_count(), Some(4));
        assert_eq!(snapshot.to_runtime(&catalog).unwrap(), axes);
    }

    #[test]
    fn capture_always_mints_new_id_and_bumps_version() {
        let catalog = catalog();
        let axes = axes(&catalog);
        let first = VariantAxesSnapshot::capture(&axes, None, Utc::now());
        let second = VariantAxesSnapshot::capture(&axes, Some(first.version), Utc::now());
        assert_ne!(first.snapshot_id, second.snapshot_id);
        assert_eq!(second.version, 2);
        assert_eq!(first.axes, second.axes);
    }

    #[test]
    fn serializes_to_portable_contract() {
        let catalog = catalog();
        let snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json["snapshotId"].is_string());
        assert_eq!(json["version"], 1);
        assert_eq!(json["axes"][0]["definitionKey"], "color");
        assert_eq!(json["axes"][0]["isGroup"], false);
        assert_eq!(json["axes"][0]["choices"][0]["enumOptionCode"], "red");
        assert!(json["axes"][0]["choices"][0].get("numericValue").is_none());
        let row = &json["axes"][1]["choices"][0];
        assert_eq!(row["key"], "width=100,length=300");
        assert_eq!(row["groupMembers"][0]["memberDefinitionKey"], "width");

        let back: VariantAxesSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn rehydration_fails_loudly_on_missing_definition() {
        let catalog = catalog();
        let mut snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        snapshot.axes[0].definition_key = "colour".into();
        let err = snapshot.to_runtime(&catalog).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn rehydration_rejects_multiple_payloads() {
        let catalog = catalog();
        let mut snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        snapshot.axes[0].choices[0].lookup_option_code = Some("red".into());
        assert!(snapshot.to_runtime(&catalog).unwrap_err().is_invalid_state());
    }

    #[test]
    fn rehydration_rejects_drifted_key() {
        let catalog = catalog();
        let mut snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        snapshot.axes[1].choices[0].key = "width=100,length=301".into();
        assert!(snapshot.to_runtime(&catalog).unwrap_err().is_invalid_state());
    }

    #[test]
    fn resolves_group_selection_by_member_values() {
        let catalog = catalog();
        let snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        let mut selections = AxisChoice::enumeration("blue", 2).pick("color");
        selections.extend(row(150, 400).pick("dims"));

        let refs = snapshot.selection_snapshot(&selections).unwrap();
        assert_eq!(refs.snapshot_id, snapshot.snapshot_id);
        assert_eq!(
            refs.selections,
            vec![
                AxisSelectionRef {
                    definition_key: "color".into(),
                    choice_key: "blue".into()
                },
                AxisSelectionRef {
                    definition_key: "dims".into(),
                    choice_key: "width=150,length=400".into()
                },
            ]
        );
    }

    #[test]
    fn unmatched_selection_is_invalid_state() {
        let catalog = catalog();
        let snapshot = VariantAxesSnapshot::capture(&axes(&catalog), None, Utc::now());
        let mut selections = AxisChoice::enumeration("red", 1).pick("color");
        selections.extend(row(150, 300).pick("dims"));
        assert!(snapshot
            .selection_snapshot(&selections)
            .unwrap_err()
            .is_invalid_state());
    }
}
