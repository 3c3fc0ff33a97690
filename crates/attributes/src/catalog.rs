//! Indexed catalog of a product type's attribute definitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use forgemart_core::{DomainError, DomainResult};

use crate::definition::{AttributeDefinition, AttributeKind};
use crate::error::CatalogError;

/// Validated, key-addressed set of attribute definitions for one product type.
///
/// Construction checks the cross references (group members, parents) once, so
/// consumers can resolve keys without re-validating the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument", into = "CatalogDocument")]
pub struct AttributeCatalog {
    product_type: String,
    definitions: BTreeMap<String, AttributeDefinition>,
}

/// Wire form of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    product_type: String,
    definitions: Vec<AttributeDefinition>,
}

impl TryFrom<CatalogDocument> for AttributeCatalog {
    type Error = CatalogError;

    fn try_from(doc: CatalogDocument) -> Result<Self, Self::Error> {
        AttributeCatalog::new(doc.product_type, doc.definitions)
    }
}

impl From<AttributeCatalog> for CatalogDocument {
    fn from(catalog: AttributeCatalog) -> Self {
        let mut definitions: Vec<_> = catalog.definitions.into_values().collect();
        definitions.sort_by(|a, b| a.canonical_cmp(b));
        CatalogDocument {
            product_type: catalog.product_type,
            definitions,
        }
    }
}

impl AttributeCatalog {
    pub fn new(
        product_type: impl Into<String>,
        definitions: impl IntoIterator<Item = AttributeDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        for def in definitions {
            if index.contains_key(&def.key) {
                return Err(CatalogError::DuplicateKey(def.key));
            }
            index.insert(def.key.clone(), def);
        }

        let catalog = Self {
            product_type: product_type.into(),
            definitions: index,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for def in self.definitions.values() {
            match &def.kind {
                AttributeKind::Enum(spec) => {
                    ensure_unique_codes(&def.key, spec.options.iter().map(|o| o.code.as_str()))?;
                }
                AttributeKind::Lookup(spec) => {
                    ensure_unique_codes(&def.key, spec.options.iter().map(|o| o.code.as_str()))?;
                }
                AttributeKind::Numeric(spec) => {
                    if let (Some(min), Some(max)) = (spec.min, spec.max) {
                        if min > max {
                            return Err(CatalogError::EmptyRange(def.key.clone()));
                        }
                    }
                    if let Some(group) = &spec.group {
                        let listed = match self.definitions.get(group).map(|g| &g.kind) {
                            Some(AttributeKind::Group(g)) => g.members.contains(&def.key),
                            _ => false,
                        };
                        if !listed {
                            return Err(CatalogError::OrphanGroupMember {
                                attribute: def.key.clone(),
                                group: group.clone(),
                            });
                        }
                    }
                }
                AttributeKind::Group(spec) => {
                    if !def.is_variant {
                        return Err(CatalogError::GroupNotVariant(def.key.clone()));
                    }
                    if spec.members.is_empty() {
                        return Err(CatalogError::EmptyGroup(def.key.clone()));
                    }
                    for member in &spec.members {
                        let Some(member_def) = self.definitions.get(member) else {
                            return Err(CatalogError::UnknownGroupMember {
                                group: def.key.clone(),
                                member: member.clone(),
                            });
                        };
                        if member_def.member_of() != Some(def.key.as_str()) {
                            return Err(CatalogError::InvalidGroupMember {
                                group: def.key.clone(),
                                member: member.clone(),
                            });
                        }
                    }
                }
            }

            if let Some(parent) = def.parent() {
                let Some(parent_def) = self.definitions.get(parent) else {
                    return Err(CatalogError::UnknownParent {
                        attribute: def.key.clone(),
                        parent: parent.to_string(),
                    });
                };
                if parent_def.kind_name() != def.kind_name() || parent_def.key == def.key {
                    return Err(CatalogError::ParentKindMismatch {
                        attribute: def.key.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeDefinition> {
        self.definitions.get(key)
    }

    /// Resolve a key that is expected to exist.
    pub fn require(&self, key: &str) -> DomainResult<&AttributeDefinition> {
        self.get(key).ok_or_else(|| {
            DomainError::not_found(format!(
                "attribute '{key}' in product type '{}'",
                self.product_type
            ))
        })
    }

    /// All definitions in canonical `(position, key)` order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.canonical_cmp(b));
        defs.into_iter()
    }

    /// Members of a group in canonical `(position, key)` order.
    pub fn group_members(&self, group_key: &str) -> DomainResult<Vec<&AttributeDefinition>> {
        let group = self.require(group_key)?;
        let AttributeKind::Group(spec) = &group.kind else {
            return Err(DomainError::validation(format!(
                "attribute '{group_key}' is not a group"
            )));
        };
        let mut members = spec
            .members
            .iter()
            .map(|m| self.require(m))
            .collect::<DomainResult<Vec<_>>>()?;
        members.sort_by(|a, b| a.canonical_cmp(b));
        Ok(members)
    }

    pub fn is_group_member(&self, key: &str) -> bool {
        self.get(key).and_then(|d| d.member_of()).is_some()
    }

    /// Attributes that become axes: variant definitions that are not group members.
    pub fn variant_definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.iter().filter(|d| d.is_variant && d.member_of().is_none())
    }

    /// Attributes a listing must supply: required ones that are not group members
    /// (members are supplied through their group).
    pub fn required_definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.iter().filter(|d| d.is_required && d.member_of().is_none())
    }
}

fn ensure_unique_codes<'a>(
    attribute: &str,
    codes: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for code in codes {
        if !seen.insert(code) {
            return Err(CatalogError::DuplicateOption {
                attribute: attribute.to_string(),
                code: code.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EnumOption, EnumSpec, LookupOption, LookupSpec, NumericSpec};
    use rust_decimal::Decimal;

    fn numeric_member(key: &str, position: i32, group: &str) -> AttributeDefinition {
        AttributeDefinition::numeric(
            key,
            position,
            NumericSpec::range(Some(Decimal::ONE), None).in_group(group),
        )
    }

    fn rug_catalog() -> AttributeCatalog {
        AttributeCatalog::new(
            "rug",
            vec![
                AttributeDefinition::group("dims", 3, vec!["length".into(), "width".into()]),
                numeric_member("width", 1, "dims"),
                numeric_member("length", 2, "dims"),
                AttributeDefinition::enumeration(
                    "color",
                    1,
                    EnumSpec {
                        parent: None,
                        options: vec![EnumOption::new("red", 1), EnumOption::new("blue", 2)],
                    },
                )
                .variant()
                .required(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn group_members_follow_canonical_order_not_declaration_order() {
        let catalog = rug_catalog();
        let members: Vec<_> = catalog
            .group_members("dims")
            .unwrap()
            .into_iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(members, vec!["width", "length"]);
        assert!(catalog.is_group_member("width"));
        assert!(!catalog.is_group_member("color"));

        let axes: Vec<_> = catalog.variant_definitions().map(|d| d.key.as_str()).collect();
        assert_eq!(axes, vec!["color", "dims"]);
    }

    #[test]
    fn required_definitions_skip_group_members() {
        let catalog = AttributeCatalog::new(
            "rug",
            vec![
                AttributeDefinition::group("dims", 3, vec!["width".into()]).required(),
                AttributeDefinition::numeric("width", 1, NumericSpec::default().in_group("dims"))
                    .required(),
            ],
        )
        .unwrap();
        let required: Vec<_> = catalog.required_definitions().map(|d| d.key.as_str()).collect();
        assert_eq!(required, vec!["dims"]);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = AttributeCatalog::new(
            "t",
            vec![
                AttributeDefinition::numeric("w", 1, NumericSpec::default()),
                AttributeDefinition::numeric("w", 2, NumericSpec::default()),
            ],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateKey("w".into()));
    }

    #[test]
    fn rejects_group_member_that_does_not_point_back() {
        let err = AttributeCatalog::new(
            "t",
            vec![
                AttributeDefinition::group("dims", 1, vec!["w".into()]),
                AttributeDefinition::numeric("w", 1, NumericSpec::default()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidGroupMember { .. }));
    }

    #[test]
    fn rejects_non_variant_group() {
        let mut group = AttributeDefinition::group("dims", 1, vec!["w".into()]);
        group.is_variant = false;
        let err = AttributeCatalog::new(
            "t",
            vec![
                group,
                AttributeDefinition::numeric("w", 1, NumericSpec::default().in_group("dims")),
            ],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::GroupNotVariant("dims".into()));
    }

    #[test]
    fn rejects_parent_of_other_kind() {
        let err = AttributeCatalog::new(
            "t",
            vec![
                AttributeDefinition::numeric("w", 1, NumericSpec::default()),
                AttributeDefinition::lookup(
                    "model",
                    2,
                    LookupSpec {
                        vocabulary: "models".into(),
                        parent: Some("w".into()),
                        options: vec![LookupOption::new("x")],
                        allow_list: None,
                    },
                ),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::ParentKindMismatch { .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = AttributeCatalog::new(
            "t",
            vec![AttributeDefinition::numeric(
                "w",
                1,
                NumericSpec::range(Some(Decimal::TEN), Some(Decimal::ONE)),
            )],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::EmptyRange("w".into()));
    }

    #[test]
    fn require_reports_not_found() {
        let catalog = rug_catalog();
        assert!(matches!(
            catalog.require("missing"),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn json_round_trip_revalidates() {
        let catalog = rug_catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: AttributeCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);

        let broken = r#"{"productType":"t","definitions":[
            {"key":"dims","position":1,"isVariant":true,"kind":{"type":"group","members":["nope"]}}
        ]}"#;
        assert!(serde_json::from_str::<AttributeCatalog>(broken).is_err());
    }
}
