//! Choice normalizer: validates raw attribute input against the schema and
//! produces canonical axes and header values.
//!
//! Pure validation and construction; nothing here expands combinations.

use std::collections::{BTreeMap, BTreeSet};

use forgemart_attributes::{AttributeCatalog, AttributeDefinition, AttributeKind};

use crate::axis::{AxisChoice, GroupMemberValue, VariantAxis};
use crate::canonical;
use crate::error::{VariantError, VariantResult};
use crate::input::{AttributeInput, AttributeInputs, HeaderValue};
use crate::limits::VariantLimits;

/// Attribute key → option codes chosen for it (header or axis values).
pub type ChosenCodes = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    pub variant_axes_cap: usize,
    /// Reject inputs that leave a required attribute unset.
    pub enforce_required: bool,
    /// Codes already chosen on the listing; parents may be satisfied by them.
    pub inherited: ChosenCodes,
}

impl NormalizeOptions {
    /// Full replacement of a draft listing's attributes.
    pub fn full_replace(limits: &VariantLimits) -> Self {
        Self {
            variant_axes_cap: limits.variant_axes_cap,
            enforce_required: true,
            inherited: ChosenCodes::new(),
        }
    }

    /// Delta on a published listing: never more axes than already exist.
    pub fn append(existing_axes: usize, inherited: ChosenCodes) -> Self {
        Self {
            variant_axes_cap: existing_axes,
            enforce_required: false,
            inherited,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedAttributes {
    /// Variant axes in canonical order.
    pub axes: Vec<VariantAxis>,
    pub headers: BTreeMap<String, HeaderValue>,
}

pub fn normalize_attributes(
    catalog: &AttributeCatalog,
    inputs: &AttributeInputs,
    options: &NormalizeOptions,
) -> VariantResult<NormalizedAttributes> {
    let mut axes = Vec::new();
    let mut headers = BTreeMap::new();

    for (key, input) in inputs {
        let definition = catalog
            .get(key)
            .ok_or_else(|| VariantError::UnknownAttribute(key.clone()))?;
        if let Some(group) = definition.member_of() {
            return Err(VariantError::GroupMemberNotSettable {
                attribute: key.clone(),
                group: group.to_string(),
            });
        }
        let input = input
            .as_ref()
            .ok_or_else(|| VariantError::NullValue(key.clone()))?;

        if definition.is_variant {
            axes.push(normalize_axis(catalog, definition, input)?);
        } else {
            headers.insert(key.clone(), normalize_header(definition, input)?);
        }
    }

    if options.enforce_required {
        if let Some(missing) = catalog
            .required_definitions()
            .find(|d| !inputs.contains_key(&d.key))
        {
            return Err(VariantError::MissingRequired(missing.key.clone()));
        }
    }

    if axes.len() > options.variant_axes_cap {
        tracing::warn!(
            axes = axes.len(),
            cap = options.variant_axes_cap,
            "variant axes exceed cap"
        );
        return Err(VariantError::AxisCapExceeded {
            count: axes.len(),
            cap: options.variant_axes_cap,
        });
    }

    let mut chosen = options.inherited.clone();
    merge_chosen_codes(&mut chosen, &axes, &headers);
    for axis in &axes {
        for code in axis.choices().iter().filter_map(AxisChoice::option_code) {
            ensure_reachable(axis.definition(), code, &chosen)?;
        }
    }
    for (key, value) in &headers {
        if let (Some(code), Some(definition)) = (value.code(), catalog.get(key)) {
            ensure_reachable(definition, code, &chosen)?;
        }
    }

    canonical::sort_axes(&mut axes);
    Ok(NormalizedAttributes { axes, headers })
}

/// Add the option codes of `axes` and `headers` to `chosen`.
pub fn merge_chosen_codes(
    chosen: &mut ChosenCodes,
    axes: &[VariantAxis],
    headers: &BTreeMap<String, HeaderValue>,
) {
    for axis in axes {
        let codes = chosen.entry(axis.key().to_string()).or_default();
        codes.extend(
            axis.choices()
                .iter()
                .filter_map(AxisChoice::option_code)
                .map(str::to_string),
        );
    }
    for (key, value) in headers {
        if let Some(code) = value.code() {
            chosen.entry(key.clone()).or_default().insert(code.to_string());
        }
    }
}

fn normalize_axis(
    catalog: &AttributeCatalog,
    definition: &AttributeDefinition,
    input: &AttributeInput,
) -> VariantResult<VariantAxis> {
    let choices = match (&definition.kind, input) {
        (AttributeKind::Enum(spec), AttributeInput::Options(codes)) => {
            ensure_non_empty(definition, codes.len())?;
            ensure_unique(definition, codes.iter().map(String::as_str))?;
            codes
                .iter()
                .map(|code| {
                    spec.option(code)
                        .map(|option| AxisChoice::enumeration(code.clone(), option.position))
                        .ok_or_else(|| unknown_option(definition, code))
                })
                .collect::<VariantResult<Vec<_>>>()?
        }
        (AttributeKind::Lookup(spec), AttributeInput::Options(codes)) => {
            ensure_non_empty(definition, codes.len())?;
            ensure_unique(definition, codes.iter().map(String::as_str))?;
            codes
                .iter()
                .map(|code| {
                    spec.option(code)
                        .map(|_| AxisChoice::lookup(code.clone()))
                        .ok_or_else(|| unknown_option(definition, code))
                })
                .collect::<VariantResult<Vec<_>>>()?
        }
        (AttributeKind::Numeric(spec), AttributeInput::Numbers(values)) => {
            ensure_non_empty(definition, values.len())?;
            if let Some(value) = values.iter().find(|v| !spec.contains(**v)) {
                return Err(VariantError::OutOfRange {
                    attribute: definition.key.clone(),
                    value: *value,
                });
            }
            let choices: Vec<_> = values.iter().map(|v| AxisChoice::numeric(*v)).collect();
            ensure_unique(definition, choices.iter().map(AxisChoice::key))?;
            choices
        }
        (AttributeKind::Group(_), AttributeInput::Rows(rows)) => {
            ensure_non_empty(definition, rows.len())?;
            let members = catalog
                .group_members(&definition.key)
                .map_err(|e| VariantError::invalid_state(e.to_string()))?;
            let choices = rows
                .iter()
                .map(|row| group_row(definition, &members, row))
                .collect::<VariantResult<Vec<_>>>()?;
            ensure_unique(definition, choices.iter().map(AxisChoice::key))?;
            choices
        }
        (_, other) => {
            return Err(VariantError::WrongShape {
                attribute: definition.key.clone(),
                expected: axis_shape(definition),
                found: other.shape(),
            });
        }
    };
    Ok(VariantAxis::new(definition.clone(), choices))
}

fn group_row(
    group: &AttributeDefinition,
    members: &[&AttributeDefinition],
    row: &[rust_decimal::Decimal],
) -> VariantResult<AxisChoice> {
    if row.len() != members.len() {
        return Err(VariantError::WrongArity {
            attribute: group.key.clone(),
            expected: members.len(),
            found: row.len(),
        });
    }
    let mut values = Vec::with_capacity(row.len());
    for (member, value) in members.iter().zip(row) {
        let AttributeKind::Numeric(spec) = &member.kind else {
            return Err(VariantError::invalid_state(format!(
                "group member '{}' is not numeric",
                member.key
            )));
        };
        if !spec.contains(*value) {
            return Err(VariantError::OutOfRange {
                attribute: member.key.clone(),
                value: *value,
            });
        }
        values.push(GroupMemberValue {
            member_key: member.key.clone(),
            value: *value,
        });
    }
    Ok(AxisChoice::group(values))
}

fn normalize_header(
    definition: &AttributeDefinition,
    input: &AttributeInput,
) -> VariantResult<HeaderValue> {
    match (&definition.kind, input) {
        (AttributeKind::Enum(spec), AttributeInput::Code(code)) => spec
            .option(code)
            .map(|_| HeaderValue::Enum(code.clone()))
            .ok_or_else(|| unknown_option(definition, code)),
        (AttributeKind::Lookup(spec), AttributeInput::Code(code)) => spec
            .option(code)
            .map(|_| HeaderValue::Lookup(code.clone()))
            .ok_or_else(|| unknown_option(definition, code)),
        (AttributeKind::Numeric(spec), AttributeInput::Number(value)) => {
            if spec.contains(*value) {
                Ok(HeaderValue::Numeric(value.normalize()))
            } else {
                Err(VariantError::OutOfRange {
                    attribute: definition.key.clone(),
                    value: *value,
                })
            }
        }
        (_, other) => Err(VariantError::WrongShape {
            attribute: definition.key.clone(),
            expected: header_shape(definition),
            found: other.shape(),
        }),
    }
}

fn ensure_reachable(
    definition: &AttributeDefinition,
    code: &str,
    chosen: &ChosenCodes,
) -> VariantResult<()> {
    let Some(parent) = definition.parent() else {
        return Ok(());
    };
    let required: Vec<&str> = match &definition.kind {
        AttributeKind::Enum(spec) => spec
            .option(code)
            .and_then(|o| o.parent_code.as_deref())
            .into_iter()
            .collect(),
        AttributeKind::Lookup(spec) => spec
            .options
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.parent_codes.iter().map(String::as_str).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    if required.is_empty() {
        return Ok(());
    }

    let reachable = chosen
        .get(parent)
        .is_some_and(|codes| required.iter().any(|p| codes.contains(*p)));
    if reachable {
        Ok(())
    } else {
        Err(VariantError::UnreachableOption {
            attribute: definition.key.clone(),
            code: code.to_string(),
            parent: parent.to_string(),
        })
    }
}

fn ensure_non_empty(definition: &AttributeDefinition, len: usize) -> VariantResult<()> {
    if len == 0 {
        Err(VariantError::EmptyValues(definition.key.clone()))
    } else {
        Ok(())
    }
}

fn ensure_unique<'a>(
    definition: &AttributeDefinition,
    keys: impl Iterator<Item = &'a str>,
) -> VariantResult<()> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(VariantError::NonUnique {
                attribute: definition.key.clone(),
                value: key.to_string(),
            });
        }
    }
    Ok(())
}

fn unknown_option(definition: &AttributeDefinition, code: &str) -> VariantError {
    VariantError::UnknownOption {
        attribute: definition.key.clone(),
        code: code.to_string(),
    }
}

fn axis_shape(definition: &AttributeDefinition) -> &'static str {
    match definition.kind {
        AttributeKind::Enum(_) | AttributeKind::Lookup(_) => "option list",
        AttributeKind::Numeric(_) => "number list",
        AttributeKind::Group(_) => "row list",
    }
}

fn header_shape(definition: &AttributeDefinition) -> &'static str {
    match definition.kind {
        AttributeKind::Enum(_) | AttributeKind::Lookup(_) => "option code",
        AttributeKind::Numeric(_) | AttributeKind::Group(_) => "number",
    }
}
