//! Matching grants against the risk catalog

use serde::{Deserialize, Serialize};

use super::catalog::{RiskSignature, Severity, CATALOG};
use crate::permissions::{Grant, PolicyRule, WILDCARD};

/// Grants that fall into one risk category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyPermission {
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub grants: Vec<Grant>,
}

impl RiskyPermission {
    fn from_signature(signature: &RiskSignature, grant: Grant) -> Self {
        Self {
            category: signature.category.to_string(),
            description: signature.description.to_string(),
            severity: signature.severity,
            grants: vec![grant],
        }
    }
}

/// Whether any rule value meets any signature value
///
/// The rule's wildcard reaches everything. With `signature_wildcard` set, a
/// `*` in the signature reaches every rule value too.
fn overlaps(rule_values: &[String], signature_values: &[&str], signature_wildcard: bool) -> bool {
    rule_values.iter().any(|value| {
        value == WILDCARD
            || signature_values.contains(&value.as_str())
            || (signature_wildcard && signature_values.contains(&WILDCARD))
    })
}

/// Check a rule against a signature on verbs, API groups and resources
///
/// Each axis must overlap independently. Verbs are compared without the
/// signature's wildcard, so the verb decides which capability a rule carries;
/// a rule with an empty axis never matches.
pub fn matches_signature(rule: &PolicyRule, signature: &RiskSignature) -> bool {
    overlaps(&rule.verbs, signature.verbs, false)
        && overlaps(&rule.api_groups, signature.api_groups, true)
        && overlaps(&rule.resources, signature.resources, true)
}

/// Classify grants by risk category
///
/// Categories appear in the order they are first hit. A grant matching
/// several signatures is listed under each of them.
pub fn classify(grants: &[Grant]) -> Vec<RiskyPermission> {
    let risks = grants.iter().fold(Vec::<RiskyPermission>::new(), |mut risks, grant| {
        for signature in CATALOG {
            if !matches_signature(&grant.matching_rule, signature) {
                continue;
            }
            match risks.iter_mut().find(|risk| risk.category == signature.category) {
                Some(risk) => risk.grants.push(grant.clone()),
                None => risks.push(RiskyPermission::from_signature(signature, grant.clone())),
            }
        }
        risks
    });

    tracing::debug!(
        "Classified {} grant(s) into {} risk categor(ies)",
        grants.len(),
        risks.len()
    );
    risks
}

/// Risks of one severity, in discovery order
pub fn by_severity(risks: &[RiskyPermission], severity: Severity) -> Vec<&RiskyPermission> {
    risks.iter().filter(|risk| risk.severity == severity).collect()
}
