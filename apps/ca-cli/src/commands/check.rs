// check.rs — `ca-audit check`: audit a policy export against the baseline.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use ca_policy::{evaluate_baseline, load_records, Baseline, ComplianceReport, Diagnostic};
use clap::Args;

use crate::config::{AuditConfig, OutputFormat};

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Policy export JSON (a list of policies or a `{"value": [...]}` envelope).
    #[arg(long)]
    pub policies: Option<PathBuf>,
    /// Baseline YAML (defaults to policy_requirements.yaml).
    #[arg(long)]
    pub requirements: Option<PathBuf>,
    /// Output format: terminal or json.
    #[arg(long)]
    pub format: Option<OutputFormat>,
    /// Write the report to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Exit non-zero when any requirement is MISSING.
    #[arg(long)]
    pub fail_on_missing: bool,
}

pub fn execute(args: &CheckArgs, config: &AuditConfig) -> anyhow::Result<()> {
    let requirements = args
        .requirements
        .clone()
        .unwrap_or_else(|| config.requirements.clone());
    let policies = args
        .policies
        .clone()
        .or_else(|| config.policies.clone())
        .context("no policy export given; pass --policies or set `policies` in ca-audit.toml")?;
    let format = args.format.unwrap_or(config.format);

    let baseline = Baseline::load(&requirements)
        .with_context(|| format!("failed to load baseline {}", requirements.display()))?;
    let records = load_records(&policies, config.max_policies)
        .with_context(|| format!("failed to load policy export {}", policies.display()))?;
    tracing::info!(
        "auditing {} policies against {} requirement(s)",
        records.len(),
        baseline.len()
    );

    let report = evaluate_baseline(&baseline, &records);

    let rendered = match format {
        OutputFormat::Terminal => render_terminal(&report)?,
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    let summary = report.summary();
    if report.has_invalid_requirements() {
        anyhow::bail!(
            "baseline has {} invalid requirement(s)",
            summary.invalid_requirements
        );
    }
    if (args.fail_on_missing || config.fail_on_missing) && report.has_missing() {
        anyhow::bail!("{} required policies are missing", summary.missing);
    }
    Ok(())
}

/// Plain-text report: summary block, one row per requirement, then diagnostics.
pub fn render_terminal(report: &ComplianceReport) -> Result<String, std::fmt::Error> {
    let summary = report.summary();
    let mut out = String::new();

    writeln!(out, "Conditional Access Policy Compliance Report")?;
    writeln!(
        out,
        "Generated: {}",
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;
    writeln!(out, "Total Required Policies: {}", summary.total)?;
    writeln!(out, "Compliant Policies:      {}", summary.present)?;
    writeln!(out, "Missing Policies:        {}", summary.missing)?;
    writeln!(out)?;

    if report.verdicts().is_empty() {
        writeln!(out, "No requirements evaluated.")?;
    } else {
        writeln!(out, "{:<9} {:<40} MATCHING POLICIES", "STATUS", "REQUIREMENT")?;
        writeln!(out, "{}", "-".repeat(80))?;
        for verdict in report.verdicts() {
            let matching = if verdict.matching_record_identifiers().is_empty() {
                "-".to_string()
            } else {
                verdict.matching_record_identifiers().join(", ")
            };
            writeln!(
                out,
                "{:<9} {:<40} {}",
                verdict.status().to_string(),
                verdict.requirement_name(),
                matching
            )?;
        }
    }

    if !report.diagnostics().is_empty() {
        writeln!(out)?;
        writeln!(out, "Diagnostics:")?;
        for d in report.diagnostics() {
            writeln!(out, "  - {}", diagnostic_line(d))?;
        }
    }

    Ok(out)
}

fn diagnostic_line(d: &Diagnostic) -> String {
    match (&d.requirement_name, d.record_index) {
        (Some(requirement), Some(index)) => {
            let mut policy = d.record_name.as_deref().unwrap_or("<unnamed>").to_string();
            if let Some(id) = &d.record_id {
                policy.push_str(&format!(", id {}", id));
            }
            if let Some(state) = &d.record_state {
                policy.push_str(&format!(", {}", state));
            }
            format!(
                "requirement '{}': skipped policy #{} ({}): {}",
                requirement, index, policy, d.message
            )
        }
        _ => d.message.clone(),
    }
}
