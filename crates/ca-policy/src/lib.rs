//! # ca-policy
//!
//! Compliance matcher for conditional access policies.
//!
//! Takes a tenant's policy export (untyped JSON documents) and a declarative
//! baseline of [`RequirementTemplate`]s, and decides for each requirement
//! whether at least one policy covers it. The result is a
//! [`ComplianceReport`] of [`MatchVerdict`]s plus diagnostics for anything
//! that could not be evaluated.
//!
//! ## Key invariants
//!
//! - **Open world**: a template only constrains the paths it mentions.
//!   Extra keys on a policy never change the outcome.
//! - **Subset semantics**: list constraints require every listed item to be
//!   present, in any order. Scalars compare exactly, with no coercion.
//! - **Fault isolation**: a malformed policy is excluded from one
//!   requirement's matches and logged; it never aborts the run.
//!
//! ## Quick Example
//!
//! ```rust
//! use ca_policy::{evaluate_baseline, Baseline, PolicyRecord};
//! use serde_json::json;
//!
//! let baseline = Baseline::from_yaml_str(r#"
//! required_policies:
//!   - name: MFA for Admins
//!     required_conditions:
//!       users:
//!         includeRoles: [GlobalAdmin]
//!     required_controls:
//!       grantControls:
//!         builtInControls: [mfa]
//! "#).unwrap();
//!
//! let records = vec![PolicyRecord::new(json!({
//!     "displayName": "Require MFA",
//!     "conditions": { "users": { "includeRoles": ["GlobalAdmin"] } },
//!     "grantControls": { "builtInControls": ["mfa"] }
//! }))];
//!
//! let report = evaluate_baseline(&baseline, &records);
//! assert!(report.verdicts()[0].satisfied());
//! ```

pub mod aggregate;
pub mod compare;
pub mod document;
pub mod error;
pub mod matcher;
pub mod record;
pub mod requirement;
pub mod verdict;

pub use aggregate::evaluate_baseline;
pub use error::{MatchFault, PolicyError};
pub use matcher::{
    evaluate_requirement, matches, try_matches, RequirementEvaluation, SkippedRecord,
};
pub use record::{load_records, parse_records, PolicyRecord};
pub use requirement::{Baseline, RequirementTemplate};
pub use verdict::{
    ComplianceReport, ComplianceSummary, Diagnostic, DiagnosticKind, MatchVerdict, VerdictStatus,
};
