// requirement.rs — Requirement templates and the compliance baseline.
//
// A baseline is a YAML document with a `required_policies` list:
//
// ```yaml
// required_policies:
//   - name: "MFA for Admins"
//     required_conditions:
//       users:
//         includeRoles: ["GlobalAdmin"]
//     required_controls:
//       grantControls:
//         builtInControls: ["mfa"]
// ```
//
// Entries are kept raw and validated one at a time, so a single bad entry
// is reported against its own index instead of rejecting the whole file.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::document::kind_of;
use crate::error::PolicyError;

/// One baseline entry, validated.
///
/// Every section is a constraint mapping. A template only constrains the
/// paths it names; an empty template matches every policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementTemplate {
    name: String,
    description: Option<String>,
    required_conditions: Map<String, Value>,
    grant_controls: Option<Map<String, Value>>,
    session_controls: Option<Map<String, Value>>,
}

impl RequirementTemplate {
    /// Validate the baseline entry at position `index`.
    pub fn from_entry(index: usize, entry: &Value) -> Result<Self, PolicyError> {
        let fields = entry
            .as_object()
            .ok_or_else(|| PolicyError::InvalidRequirementField {
                index,
                field: "name",
                reason: format!("cannot be read: entry is {}, expected a mapping", kind_of(entry)),
            })?;

        let name = match fields.get("name") {
            None | Some(Value::Null) => {
                return Err(PolicyError::MissingRequirementField {
                    index,
                    field: "name",
                })
            }
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            Some(Value::String(_)) => {
                return Err(PolicyError::InvalidRequirementField {
                    index,
                    field: "name",
                    reason: "is blank".to_string(),
                })
            }
            Some(other) => {
                return Err(PolicyError::InvalidRequirementField {
                    index,
                    field: "name",
                    reason: format!("is {}, expected a string", kind_of(other)),
                })
            }
        };

        let description = match fields.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                return Err(PolicyError::InvalidRequirementField {
                    index,
                    field: "description",
                    reason: format!("is {}, expected a string", kind_of(other)),
                })
            }
        };

        let required_conditions =
            optional_mapping(index, "required_conditions", fields.get("required_conditions"))?
                .unwrap_or_default();

        let controls =
            optional_mapping(index, "required_controls", fields.get("required_controls"))?;
        let (grant_controls, session_controls) = match controls {
            Some(controls) => (
                optional_mapping(
                    index,
                    "required_controls.grantControls",
                    controls.get("grantControls"),
                )?,
                optional_mapping(
                    index,
                    "required_controls.sessionControls",
                    controls.get("sessionControls"),
                )?,
            ),
            None => (None, None),
        };

        Ok(Self {
            name,
            description,
            required_conditions,
            grant_controls,
            session_controls,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Constraints on the policy's `conditions` section.
    pub fn required_conditions(&self) -> &Map<String, Value> {
        &self.required_conditions
    }

    /// Constraints on the policy's `grantControls` section, if any.
    pub fn grant_controls(&self) -> Option<&Map<String, Value>> {
        self.grant_controls.as_ref()
    }

    /// Constraints on the policy's `sessionControls` section, if any.
    pub fn session_controls(&self) -> Option<&Map<String, Value>> {
        self.session_controls.as_ref()
    }

    /// True when no section constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.required_conditions.is_empty()
            && self.grant_controls.as_ref().map_or(true, Map::is_empty)
            && self.session_controls.as_ref().map_or(true, Map::is_empty)
    }
}

/// Absent or null → `None`; a mapping → its clone; anything else is invalid.
fn optional_mapping(
    index: usize,
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<Map<String, Value>>, PolicyError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(other) => Err(PolicyError::InvalidRequirementField {
            index,
            field,
            reason: format!("is {}, expected a mapping", kind_of(other)),
        }),
    }
}

/// The compliance baseline: an ordered list of requirement entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Baseline {
    #[serde(default)]
    required_policies: Option<Vec<Value>>,
}

impl Baseline {
    /// Build a baseline from raw entries.
    pub fn from_entries(entries: Vec<Value>) -> Self {
        Self {
            required_policies: Some(entries),
        }
    }

    /// Parse a baseline document. JSON is accepted too, being valid YAML.
    pub fn from_yaml_str(content: &str) -> Result<Self, PolicyError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let baseline: Self = serde_yaml::from_str(content)?;
        tracing::debug!("parsed baseline with {} requirement(s)", baseline.len());
        Ok(baseline)
    }

    /// Read and parse a baseline file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Raw entries in declaration order.
    pub fn entries(&self) -> &[Value] {
        self.required_policies.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Validate each entry, in declaration order, paired with its index.
    pub fn templates(
        &self,
    ) -> impl Iterator<Item = (usize, Result<RequirementTemplate, PolicyError>)> + '_ {
        self.entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, RequirementTemplate::from_entry(index, entry)))
    }
}
