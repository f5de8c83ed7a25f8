// matcher.rs — Requirement matching.
//
// `try_matches()` decides whether one policy satisfies one requirement:
//
// 1. required_conditions vs. record.conditions
// 2. required_controls.grantControls vs. record.grantControls
// 3. required_controls.sessionControls vs. record.sessionControls
//
// Every step is a conjunction over the keys the requirement names; keys it
// does not name are never read. Within a section:
//
// - a mapping constraint descends into the record at the same key, at any
//   depth, and every leaf below it is a membership test (list_satisfies,
//   with scalars wrapped into one-element lists);
// - a list constraint is a subset test (list_satisfies);
// - a scalar constraint directly under the section is exact equality
//   (scalar_satisfies).
//
// Descending into a record value that is not a mapping is a MatchFault.
// `matches()` folds faults into "no match"; `evaluate_requirement()` skips
// faulted records, logs them and carries on with the rest.

use serde_json::{Map, Value};

use crate::compare::{list_satisfies, scalar_satisfies};
use crate::document::{lookup, KeyPath};
use crate::error::MatchFault;
use crate::record::PolicyRecord;
use crate::requirement::RequirementTemplate;
use crate::verdict::MatchVerdict;

/// How a scalar leaf constraint is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafRule {
    /// Directly under a section: exact equality.
    Exact,
    /// Below a nested mapping: membership in the actual value.
    Membership,
}

/// Decide whether `record` satisfies `template`, surfacing structural faults.
pub fn try_matches(record: &PolicyRecord, template: &RequirementTemplate) -> Result<bool, MatchFault> {
    let sections = [
        ("conditions", Some(template.required_conditions())),
        ("grantControls", template.grant_controls()),
        ("sessionControls", template.session_controls()),
    ];

    for (section, required) in sections {
        let Some(required) = required.filter(|r| !r.is_empty()) else {
            continue;
        };
        let actual = record.section(section)?;
        let mut path = KeyPath::at(section);
        if !fields_satisfy(actual, required, LeafRule::Exact, &mut path)? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Decide whether `record` satisfies `template`. Malformed records never match.
pub fn matches(record: &PolicyRecord, template: &RequirementTemplate) -> bool {
    try_matches(record, template).unwrap_or(false)
}

/// Check every `(key, constraint)` pair against the same key under `actual`.
fn fields_satisfy(
    actual: Option<&Value>,
    required: &Map<String, Value>,
    leaf: LeafRule,
    path: &mut KeyPath,
) -> Result<bool, MatchFault> {
    for (key, constraint) in required {
        let child = lookup(actual, key, path)?;
        path.push(key);
        let satisfied = constraint_satisfied(child, constraint, leaf, path)?;
        path.pop();
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn constraint_satisfied(
    actual: Option<&Value>,
    constraint: &Value,
    leaf: LeafRule,
    path: &mut KeyPath,
) -> Result<bool, MatchFault> {
    match constraint {
        Value::Object(nested) => fields_satisfy(actual, nested, LeafRule::Membership, path),
        Value::Array(_) => Ok(list_satisfies(actual, Some(constraint))),
        scalar => Ok(match leaf {
            LeafRule::Exact => scalar_satisfies(actual, scalar),
            LeafRule::Membership => list_satisfies(actual, Some(scalar)),
        }),
    }
}

/// A policy left out of a requirement's evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the input sequence.
    pub record_index: usize,
    pub display_name: Option<String>,
    pub policy_id: Option<String>,
    pub state: Option<String>,
    pub fault: MatchFault,
}

/// Verdict for one requirement plus the records that could not be judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEvaluation {
    pub verdict: MatchVerdict,
    pub skipped: Vec<SkippedRecord>,
}

/// Evaluate one requirement against every record.
///
/// The requirement is satisfied if any record matches. Matching records are
/// reported by display name in input order. Each record is judged on its
/// own; a faulted record is skipped without affecting the others.
pub fn evaluate_requirement(
    template: &RequirementTemplate,
    records: &[PolicyRecord],
) -> RequirementEvaluation {
    let mut matching = Vec::new();
    let mut skipped = Vec::new();

    for (record_index, record) in records.iter().enumerate() {
        let outcome = try_matches(record, template).and_then(|matched| {
            if matched {
                record.identifier().map(Some)
            } else {
                Ok(None)
            }
        });

        match outcome {
            Ok(Some(name)) => matching.push(name.to_string()),
            Ok(None) => {}
            Err(fault) => {
                tracing::warn!(
                    "requirement '{}': skipping policy #{} ({}): {}",
                    template.name(),
                    record_index,
                    record.display_name().unwrap_or("<unnamed>"),
                    fault
                );
                skipped.push(SkippedRecord {
                    record_index,
                    display_name: record.display_name().map(str::to_string),
                    policy_id: record.id().map(str::to_string),
                    state: record.state().map(str::to_string),
                    fault,
                });
            }
        }
    }

    tracing::debug!(
        "requirement '{}': {} matching polic{}",
        template.name(),
        matching.len(),
        if matching.len() == 1 { "y" } else { "ies" }
    );

    RequirementEvaluation {
        verdict: MatchVerdict::new(template.name(), matching)
            .with_description(template.description()),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::VerdictStatus;
    use serde_json::json;

    /// Helper: build a template from a baseline entry.
    fn template(entry: Value) -> RequirementTemplate {
        RequirementTemplate::from_entry(0, &entry).unwrap()
    }

    fn record(document: Value) -> PolicyRecord {
        PolicyRecord::new(document)
    }

    fn mfa_for_admins() -> RequirementTemplate {
        template(json!({
            "name": "MFA for Admins",
            "required_conditions": { "users": { "includeRoles": ["GlobalAdmin"] } },
            "required_controls": { "grantControls": { "builtInControls": ["mfa"] } }
        }))
    }

    #[test]
    fn empty_template_matches_everything() {
        let empty = template(json!({ "name": "Anything" }));
        assert!(matches(&record(json!({})), &empty));
        assert!(matches(&record(json!({ "displayName": "p", "conditions": null })), &empty));
        assert!(matches(
            &record(json!({ "conditions": "garbage", "grantControls": 5 })),
            &empty
        ));
    }

    #[test]
    fn end_to_end_positive() {
        let policy = record(json!({
            "displayName": "Require MFA",
            "conditions": { "users": { "includeRoles": ["GlobalAdmin", "SecurityAdmin"] } },
            "grantControls": { "builtInControls": ["mfa", "compliantDevice"] }
        }));
        let evaluation = evaluate_requirement(&mfa_for_admins(), &[policy]);
        let verdict = evaluation.verdict;

        assert_eq!(verdict.requirement_name(), "MFA for Admins");
        assert!(verdict.satisfied());
        assert_eq!(verdict.matching_record_identifiers(), ["Require MFA"]);
        assert_eq!(verdict.status(), VerdictStatus::Present);
        assert!(evaluation.skipped.is_empty());
    }

    #[test]
    fn end_to_end_negative() {
        let policy = record(json!({
            "displayName": "Require compliant device",
            "conditions": { "users": { "includeRoles": ["GlobalAdmin", "SecurityAdmin"] } },
            "grantControls": { "builtInControls": ["compliantDevice"] }
        }));
        let verdict = evaluate_requirement(&mfa_for_admins(), &[policy]).verdict;

        assert!(!verdict.satisfied());
        assert!(verdict.matching_record_identifiers().is_empty());
        assert_eq!(verdict.status(), VerdictStatus::Missing);
    }

    #[test]
    fn list_order_is_irrelevant() {
        let requirement = template(json!({
            "name": "Legacy clients",
            "required_conditions": { "clientAppTypes": ["a", "b"] }
        }));
        assert!(matches(
            &record(json!({ "conditions": { "clientAppTypes": ["a", "b", "c"] } })),
            &requirement
        ));
        assert!(matches(
            &record(json!({ "conditions": { "clientAppTypes": ["c", "b", "a"] } })),
            &requirement
        ));
        assert!(!matches(
            &record(json!({ "conditions": { "clientAppTypes": ["a", "c"] } })),
            &requirement
        ));
    }

    #[test]
    fn top_level_scalar_is_case_sensitive() {
        let requirement = template(json!({
            "name": "Enforced",
            "required_conditions": { "mode": "enforced" }
        }));
        assert!(matches(&record(json!({ "conditions": { "mode": "enforced" } })), &requirement));
        assert!(!matches(&record(json!({ "conditions": { "mode": "Enforced" } })), &requirement));
        // Exact equality does not accept a list containing the value.
        assert!(!matches(
            &record(json!({ "conditions": { "mode": ["enforced"] } })),
            &requirement
        ));
    }

    #[test]
    fn nested_scalar_is_membership() {
        let requirement = template(json!({
            "name": "All apps",
            "required_conditions": { "applications": { "includeApplications": "All" } }
        }));
        assert!(matches(
            &record(json!({ "conditions": { "applications": { "includeApplications": ["All"] } } })),
            &requirement
        ));
        assert!(matches(
            &record(json!({ "conditions": { "applications": { "includeApplications": "All" } } })),
            &requirement
        ));
        assert!(!matches(
            &record(json!({ "conditions": { "applications": { "includeApplications": ["Office365"] } } })),
            &requirement
        ));
    }

    #[test]
    fn nesting_beyond_two_levels() {
        let requirement = template(json!({
            "name": "Trusted locations excluded",
            "required_conditions": {
                "locations": { "excludeLocations": ["AllTrusted"] },
                "devices": { "deviceFilter": { "mode": "exclude" } }
            }
        }));
        let policy = record(json!({
            "conditions": {
                "locations": { "includeLocations": ["All"], "excludeLocations": ["AllTrusted"] },
                "devices": { "deviceFilter": { "mode": "exclude", "rule": "device.isCompliant -eq True" } }
            }
        }));
        assert!(matches(&policy, &requirement));

        let other = record(json!({
            "conditions": {
                "locations": { "excludeLocations": ["AllTrusted"] },
                "devices": { "deviceFilter": { "mode": "include" } }
            }
        }));
        assert!(!matches(&other, &requirement));
    }

    #[test]
    fn unrelated_keys_never_change_the_outcome() {
        let requirement = mfa_for_admins();
        let base = json!({
            "displayName": "Require MFA",
            "conditions": { "users": { "includeRoles": ["GlobalAdmin"] } },
            "grantControls": { "builtInControls": ["mfa"] }
        });
        let extended = json!({
            "displayName": "Require MFA",
            "id": "0f7e",
            "state": "enabled",
            "conditions": {
                "users": { "includeRoles": ["GlobalAdmin"], "excludeUsers": ["breakglass"] },
                "clientAppTypes": ["all"]
            },
            "grantControls": {
                "operator": "OR",
                "builtInControls": ["mfa"],
                "authenticationStrength": { "displayName": "Phishing-resistant MFA" }
            },
            "sessionControls": { "signInFrequency": { "value": 4, "type": "hours" } }
        });
        assert!(matches(&record(base), &requirement));
        assert!(matches(&record(extended), &requirement));

        let failing = json!({ "conditions": { "users": { "includeRoles": ["SecurityAdmin"] } } });
        let mut failing_extended = failing.clone();
        failing_extended["conditions"]["platforms"] = json!({ "includePlatforms": ["all"] });
        assert!(!matches(&record(failing), &requirement));
        assert!(!matches(&record(failing_extended), &requirement));
    }

    #[test]
    fn missing_sections_fail_non_empty_requirements() {
        let requirement = mfa_for_admins();
        assert!(!matches(&record(json!({ "displayName": "Bare" })), &requirement));
        assert!(!matches(
            &record(json!({ "conditions": { "users": { "includeRoles": ["GlobalAdmin"] } } })),
            &requirement
        ));
    }

    #[test]
    fn grant_control_scalar_and_mapping() {
        let requirement = template(json!({
            "name": "Phishing resistant",
            "required_controls": {
                "grantControls": {
                    "operator": "OR",
                    "authenticationStrength": { "displayName": "Phishing-resistant MFA" }
                }
            }
        }));
        let policy = record(json!({
            "grantControls": {
                "operator": "OR",
                "builtInControls": [],
                "authenticationStrength": {
                    "id": "00000000-0000-0000-0000-000000000004",
                    "displayName": "Phishing-resistant MFA"
                }
            }
        }));
        assert!(matches(&policy, &requirement));

        let and_operator = record(json!({
            "grantControls": {
                "operator": "AND",
                "authenticationStrength": { "displayName": "Phishing-resistant MFA" }
            }
        }));
        assert!(!matches(&and_operator, &requirement));
    }

    #[test]
    fn session_controls_are_checked() {
        let requirement = template(json!({
            "name": "Sign-in frequency",
            "required_controls": {
                "sessionControls": { "signInFrequency": { "isEnabled": true, "type": "hours" } }
            }
        }));
        assert!(matches(
            &record(json!({
                "sessionControls": { "signInFrequency": { "isEnabled": true, "type": "hours", "value": 4 } }
            })),
            &requirement
        ));
        assert!(!matches(
            &record(json!({ "sessionControls": null })),
            &requirement
        ));
    }

    #[test]
    fn yaml_floats_match_json_integers() {
        let baseline = crate::requirement::Baseline::from_yaml_str(
            r#"
required_policies:
  - name: "Four-hour sign-in frequency"
    required_conditions:
      n: 1.0
    required_controls:
      sessionControls:
        signInFrequency:
          value: 4.0
"#,
        )
        .unwrap();
        let (_, requirement) = baseline.templates().next().unwrap();
        let requirement = requirement.unwrap();

        let policy = record(json!({
            "displayName": "Sign-in frequency",
            "conditions": { "n": 1 },
            "sessionControls": { "signInFrequency": { "value": 4, "type": "hours" } }
        }));
        let verdict = evaluate_requirement(&requirement, &[policy]).verdict;
        assert!(verdict.satisfied());

        let other = record(json!({
            "conditions": { "n": 1 },
            "sessionControls": { "signInFrequency": { "value": 8 } }
        }));
        assert!(!matches(&other, &requirement));
    }

    #[test]
    fn scalar_where_mapping_expected_is_fault() {
        let policy = record(json!({
            "displayName": "Broken",
            "conditions": { "users": "GlobalAdmin" }
        }));
        let fault = try_matches(&policy, &mfa_for_admins()).unwrap_err();
        assert_eq!(
            fault,
            MatchFault::ShapeMismatch {
                path: "conditions.users".to_string(),
                found: "a string",
            }
        );
        assert!(!matches(&policy, &mfa_for_admins()));
    }

    #[test]
    fn non_mapping_section_is_fault() {
        let policy = record(json!({ "displayName": "Broken", "conditions": ["users"] }));
        let fault = try_matches(&policy, &mfa_for_admins()).unwrap_err();
        assert_eq!(fault.to_string(), "expected a mapping at 'conditions', found a list");
    }

    #[test]
    fn existential_aggregation_reports_only_matching_records() {
        let requirement = mfa_for_admins();
        let records = vec![
            record(json!({
                "displayName": "Report-only MFA",
                "conditions": { "users": { "includeRoles": ["SecurityAdmin"] } },
                "grantControls": { "builtInControls": ["mfa"] }
            })),
            record(json!({
                "displayName": "Require MFA",
                "conditions": { "users": { "includeRoles": ["GlobalAdmin"] } },
                "grantControls": { "builtInControls": ["mfa"] }
            })),
        ];
        let verdict = evaluate_requirement(&requirement, &records).verdict;
        assert!(verdict.satisfied());
        assert_eq!(verdict.matching_record_identifiers(), ["Require MFA"]);
    }

    #[test]
    fn matches_are_reported_in_scan_order() {
        let requirement = template(json!({ "name": "Anything" }));
        let records = vec![
            record(json!({ "displayName": "zeta" })),
            record(json!({ "displayName": "alpha" })),
            record(json!({ "displayName": "mu" })),
        ];
        let verdict = evaluate_requirement(&requirement, &records).verdict;
        assert_eq!(verdict.matching_record_identifiers(), ["zeta", "alpha", "mu"]);
    }

    #[test]
    fn faulted_records_do_not_hide_others() {
        let requirement = mfa_for_admins();
        let records = vec![
            record(json!({ "displayName": "No conditions" })),
            record(json!({ "displayName": "Scalar users", "conditions": { "users": 7 } })),
            record(json!("not even a mapping")),
            record(json!({
                "displayName": "Require MFA",
                "conditions": { "users": { "includeRoles": ["GlobalAdmin"] } },
                "grantControls": { "builtInControls": ["mfa"] }
            })),
        ];
        let evaluation = evaluate_requirement(&requirement, &records);

        assert_eq!(evaluation.verdict.matching_record_identifiers(), ["Require MFA"]);
        // Missing conditions is a plain non-match, not a fault.
        let skipped: Vec<usize> = evaluation.skipped.iter().map(|s| s.record_index).collect();
        assert_eq!(skipped, vec![1, 2]);
        assert_eq!(evaluation.skipped[0].display_name.as_deref(), Some("Scalar users"));
        assert_eq!(evaluation.skipped[1].display_name, None);
        assert_eq!(evaluation.skipped[1].policy_id, None);
    }

    #[test]
    fn matching_record_without_display_name_is_skipped() {
        let requirement = template(json!({ "name": "Anything" }));
        let records = vec![record(json!({ "id": "no-name" })), record(json!({ "displayName": "named" }))];
        let evaluation = evaluate_requirement(&requirement, &records);

        assert_eq!(evaluation.verdict.matching_record_identifiers(), ["named"]);
        assert_eq!(evaluation.skipped.len(), 1);
        assert_eq!(evaluation.skipped[0].fault, MatchFault::MissingIdentifier);
        assert_eq!(evaluation.skipped[0].policy_id.as_deref(), Some("no-name"));
    }

    #[test]
    fn non_matching_record_without_display_name_is_not_a_fault() {
        let evaluation = evaluate_requirement(&mfa_for_admins(), &[record(json!({ "id": "x" }))]);
        assert!(evaluation.skipped.is_empty());
        assert!(!evaluation.verdict.satisfied());
    }

    #[test]
    fn required_list_against_scalar_actual() {
        let single = template(json!({
            "name": "single",
            "required_conditions": { "clientAppTypes": ["all"] }
        }));
        let double = template(json!({
            "name": "double",
            "required_conditions": { "clientAppTypes": ["all", "browser"] }
        }));
        let policy = record(json!({ "conditions": { "clientAppTypes": "all" } }));
        assert!(matches(&policy, &single));
        assert!(!matches(&policy, &double));
    }

    #[test]
    fn empty_required_list_is_vacuous_even_when_absent() {
        let requirement = template(json!({
            "name": "vacuous",
            "required_conditions": { "users": { "excludeUsers": [] } }
        }));
        assert!(matches(&record(json!({ "conditions": {} })), &requirement));
        assert!(matches(&record(json!({})), &requirement));
    }
}
