// baseline.rs — `ca-audit baseline`: validate a baseline and list its requirements.

use std::path::Path;

use anyhow::Context;
use ca_policy::Baseline;

use crate::config::AuditConfig;

pub fn execute(requirements: Option<&Path>, config: &AuditConfig) -> anyhow::Result<()> {
    let path = requirements.unwrap_or(config.requirements.as_path());
    let baseline = Baseline::load(path)
        .with_context(|| format!("failed to load baseline {}", path.display()))?;

    let (lines, invalid) = describe(&baseline);
    if lines.is_empty() {
        println!("No requirements in {}", path.display());
        return Ok(());
    }

    println!("{:<5} {:<9} REQUIREMENT", "#", "STATUS");
    println!("{}", "-".repeat(60));
    for line in &lines {
        println!("{}", line);
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} baseline entries are invalid", invalid, baseline.len());
    }
    println!();
    println!("Baseline valid: {} requirement(s).", baseline.len());
    Ok(())
}

/// One row per entry, plus the number of invalid entries.
fn describe(baseline: &Baseline) -> (Vec<String>, usize) {
    let mut invalid = 0;
    let lines = baseline
        .templates()
        .map(|(index, template)| match template {
            Ok(template) if template.is_unconstrained() => format!(
                "{:<5} {:<9} {} (no constraints, matches any policy)",
                index,
                "ok",
                template.name()
            ),
            Ok(template) => format!("{:<5} {:<9} {}", index, "ok", template.name()),
            Err(e) => {
                invalid += 1;
                format!("{:<5} {:<9} {}", index, "INVALID", e)
            }
        })
        .collect();
    (lines, invalid)
}
