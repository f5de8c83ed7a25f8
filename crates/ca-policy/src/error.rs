// error.rs — Error types for baseline loading and policy matching.
//
// Two families:
// - PolicyError: load and validation failures surfaced to the caller.
// - MatchFault: per-record failures inside the matcher. These never escape
//   a run; the record is excluded from that requirement and logged.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading a baseline or a policy export, or validating a
/// requirement entry.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The baseline document is not valid YAML, or not shaped like a baseline.
    #[error("invalid baseline document: {0}")]
    BaselineParse(#[from] serde_yaml::Error),

    /// The policy export is not valid JSON.
    #[error("invalid policy export: {0}")]
    RecordsParse(#[from] serde_json::Error),

    /// The policy export parsed, but is neither a policy array nor a
    /// `{"value": [...]}` collection envelope.
    #[error("invalid policy export: {reason}")]
    InvalidExport { reason: String },

    /// More policies than the caller allowed.
    #[error("policy export holds {count} policies, limit is {limit}")]
    TooManyRecords { count: usize, limit: usize },

    /// A requirement entry lacks a mandatory field.
    #[error("requirement #{index} is missing required field '{field}'")]
    MissingRequirementField { index: usize, field: &'static str },

    /// A requirement entry has a field of the wrong shape.
    #[error("requirement #{index}: field '{field}' {reason}")]
    InvalidRequirementField {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

/// A policy record could not be evaluated against a requirement.
///
/// Recovered locally: the record does not match, evaluation continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchFault {
    /// A path the requirement descends into holds a non-mapping value.
    #[error("expected a mapping at '{path}', found {found}")]
    ShapeMismatch { path: String, found: &'static str },

    /// The record matched but has no string `displayName` to report it by.
    #[error("policy has no string 'displayName'")]
    MissingIdentifier,
}
