// aggregate.rs — Run a whole baseline against a policy export.
//
// Requirements are evaluated independently, in the order the baseline
// declares them. An entry that fails validation produces an
// InvalidRequirement diagnostic instead of a verdict, and the run carries
// on with the next entry. Results are returned, never accumulated in shared
// state, so a baseline can be evaluated repeatedly or from several threads.

use crate::matcher::evaluate_requirement;
use crate::record::PolicyRecord;
use crate::requirement::Baseline;
use crate::verdict::{ComplianceReport, Diagnostic, DiagnosticKind};

/// Evaluate every requirement in `baseline` against `records`.
pub fn evaluate_baseline(baseline: &Baseline, records: &[PolicyRecord]) -> ComplianceReport {
    let mut verdicts = Vec::with_capacity(baseline.len());
    let mut diagnostics = Vec::new();

    for (index, template) in baseline.templates() {
        let template = match template {
            Ok(template) => template,
            Err(e) => {
                let name = baseline.entries()[index]
                    .get("name")
                    .and_then(|n| n.as_str())
                    .map(str::to_string);
                tracing::warn!("rejecting baseline entry #{}: {}", index, e);
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::InvalidRequirement,
                    requirement_index: index,
                    requirement_name: name,
                    record_index: None,
                    record_name: None,
                    record_id: None,
                    record_state: None,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let evaluation = evaluate_requirement(&template, records);
        diagnostics.extend(evaluation.skipped.into_iter().map(|skipped| Diagnostic {
            kind: DiagnosticKind::MalformedRecord,
            requirement_index: index,
            requirement_name: Some(template.name().to_string()),
            record_index: Some(skipped.record_index),
            record_name: skipped.display_name,
            record_id: skipped.policy_id,
            record_state: skipped.state,
            message: skipped.fault.to_string(),
        }));
        verdicts.push(evaluation.verdict);
    }

    let report = ComplianceReport::new(verdicts, diagnostics);
    let summary = report.summary();
    tracing::info!(
        "evaluated {} requirement(s) against {} policies: {} present, {} missing, {} invalid",
        summary.total,
        records.len(),
        summary.present,
        summary.missing,
        summary.invalid_requirements
    );
    report
}
