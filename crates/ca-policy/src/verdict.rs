// verdict.rs — Match verdicts and the compliance report.
//
// A MatchVerdict is produced once per requirement per run and never
// mutated afterwards. Its serialized form is the contract with the report
// renderer:
//
// ```json
// { "requirement_name": "MFA for Admins", "found": true,
//   "matching_policies": ["Require MFA"], "status": "PRESENT" }
// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a requirement is covered by at least one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Present,
    Missing,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Present => write!(f, "PRESENT"),
            VerdictStatus::Missing => write!(f, "MISSING"),
        }
    }
}

/// The outcome of evaluating one requirement against every policy.
///
/// `found` and `status` are derived from `matching_policies`, so the three
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchVerdict {
    requirement_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    found: bool,
    matching_policies: Vec<String>,
    status: VerdictStatus,
}

impl MatchVerdict {
    /// Build a verdict from the display names of matching policies, in
    /// input scan order.
    pub fn new(requirement_name: impl Into<String>, matching_policies: Vec<String>) -> Self {
        let found = !matching_policies.is_empty();
        Self {
            requirement_name: requirement_name.into(),
            description: None,
            found,
            matching_policies,
            status: if found {
                VerdictStatus::Present
            } else {
                VerdictStatus::Missing
            },
        }
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }

    pub fn requirement_name(&self) -> &str {
        &self.requirement_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn satisfied(&self) -> bool {
        self.found
    }

    pub fn matching_record_identifiers(&self) -> &[String] {
        &self.matching_policies
    }

    pub fn status(&self) -> VerdictStatus {
        self.status
    }
}

/// What went wrong with an entry that was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A policy could not be evaluated against a requirement and was left out
    /// of that requirement's matches.
    MalformedRecord,
    /// A baseline entry failed validation and produced no verdict.
    InvalidRequirement,
}

/// A problem encountered during a run, reported alongside the verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Position of the requirement in the baseline.
    pub requirement_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_name: Option<String>,
    /// Position of the policy in the export (malformed records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    /// Provider-assigned ID of the policy (malformed records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Enablement state of the policy (malformed records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_state: Option<String>,
    pub message: String,
}

/// Headline counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    /// Requirements that produced a verdict.
    pub total: usize,
    pub present: usize,
    pub missing: usize,
    /// Baseline entries rejected by validation.
    pub invalid_requirements: usize,
    /// Policy/requirement pairs skipped because the policy was malformed.
    pub skipped_records: usize,
}

/// Result of auditing a policy export against a baseline.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    report_id: Uuid,
    generated_at: DateTime<Utc>,
    summary: ComplianceSummary,
    verdicts: Vec<MatchVerdict>,
    diagnostics: Vec<Diagnostic>,
}

impl ComplianceReport {
    pub fn new(verdicts: Vec<MatchVerdict>, diagnostics: Vec<Diagnostic>) -> Self {
        let present = verdicts.iter().filter(|v| v.satisfied()).count();
        let count_kind =
            |kind: DiagnosticKind| diagnostics.iter().filter(|d| d.kind == kind).count();
        let summary = ComplianceSummary {
            total: verdicts.len(),
            present,
            missing: verdicts.len() - present,
            invalid_requirements: count_kind(DiagnosticKind::InvalidRequirement),
            skipped_records: count_kind(DiagnosticKind::MalformedRecord),
        };
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary,
            verdicts,
            diagnostics,
        }
    }

    pub fn report_id(&self) -> Uuid {
        self.report_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn summary(&self) -> ComplianceSummary {
        self.summary
    }

    /// Verdicts in baseline declaration order.
    pub fn verdicts(&self) -> &[MatchVerdict] {
        &self.verdicts
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when any baseline entry was rejected.
    pub fn has_invalid_requirements(&self) -> bool {
        self.summary.invalid_requirements > 0
    }

    /// True when any requirement has no matching policy.
    pub fn has_missing(&self) -> bool {
        self.summary.missing > 0
    }
}
