// record.rs — Policy records and the policy export loader.
//
// A PolicyRecord is one conditional access policy as the identity provider
// returns it. Nothing about its shape is assumed beyond what a requirement
// asks for; `displayName` is only needed once a record has matched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{kind_of, lookup_path};
use crate::error::{MatchFault, PolicyError};

/// One access-control policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRecord {
    document: Value,
}

impl PolicyRecord {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.top_level_str("displayName")
    }

    /// The provider-assigned policy ID, if the export carries one.
    pub fn id(&self) -> Option<&str> {
        self.top_level_str("id")
    }

    /// Enablement state (`enabled`, `disabled`, `enabledForReportingButNotEnforced`).
    pub fn state(&self) -> Option<&str> {
        self.top_level_str("state")
    }

    /// A top-level section such as `conditions` or `grantControls`.
    pub fn section(&self, name: &str) -> Result<Option<&Value>, MatchFault> {
        lookup_path(&self.document, &[name])
    }

    /// The name a matching record is reported under.
    pub fn identifier(&self) -> Result<&str, MatchFault> {
        self.display_name().ok_or(MatchFault::MissingIdentifier)
    }

    fn top_level_str(&self, key: &str) -> Option<&str> {
        self.document.get(key).and_then(Value::as_str)
    }
}

/// Parse a policy export.
///
/// Accepts a bare JSON array of policies or a collection envelope
/// `{"value": [...]}` as returned by the conditional access policies
/// endpoint. Entries are not validated here; a malformed entry simply fails
/// to match later.
pub fn parse_records(content: &str, max_records: usize) -> Result<Vec<PolicyRecord>, PolicyError> {
    let parsed: Value = serde_json::from_str(content)?;
    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("value") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(PolicyError::InvalidExport {
                    reason: format!(
                        "'value' is {}, expected a list of policies",
                        kind_of(&other)
                    ),
                })
            }
            None => {
                return Err(PolicyError::InvalidExport {
                    reason: "expected a list of policies or an object with a 'value' list"
                        .to_string(),
                })
            }
        },
        other => {
            return Err(PolicyError::InvalidExport {
                reason: format!(
                    "top level is {}, expected a list of policies",
                    kind_of(&other)
                ),
            })
        }
    };

    if items.len() > max_records {
        return Err(PolicyError::TooManyRecords {
            count: items.len(),
            limit: max_records,
        });
    }

    let records: Vec<PolicyRecord> = items.into_iter().map(PolicyRecord::new).collect();
    tracing::debug!("parsed {} policy record(s)", records.len());
    Ok(records)
}

/// Read and parse a policy export file.
pub fn load_records(path: &Path, max_records: usize) -> Result<Vec<PolicyRecord>, PolicyError> {
    let content = std::fs::read_to_string(path).map_err(|source| PolicyError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&content, max_records)
}
