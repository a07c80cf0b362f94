//! Rule and subject matching
//!
//! Pure predicates: nothing here fails. A malformed rule simply does not
//! match on the affected axis.

use super::types::{BindingSubject, PermissionRequest, PolicyRule, WILDCARD};
use crate::subject::{Subject, SubjectKind};

/// Check if a policy rule grants the requested permission
pub fn rule_matches(rule: &PolicyRule, request: &PermissionRequest) -> bool {
    verb_matches(&rule.verbs, &request.verb)
        && api_group_matches(&rule.api_groups, &request.api_group)
        && resource_matches(
            &rule.resources,
            &request.resource,
            request.subresource.as_deref(),
        )
        && resource_name_matches(&rule.resource_names, request.resource_name.as_deref())
}

/// Requested verb is listed, or the rule allows every verb
pub fn verb_matches(rule_verbs: &[String], verb: &str) -> bool {
    rule_verbs.iter().any(|v| v == WILDCARD || v == verb)
}

/// Requested group is listed, or the rule allows every group
///
/// The core group is the empty string and only matches itself.
pub fn api_group_matches(rule_groups: &[String], group: &str) -> bool {
    rule_groups.iter().any(|g| g == WILDCARD || g == group)
}

/// Check the resource and optional subresource against the rule
///
/// `pods/*` covers every pods subresource but not `pods` itself.
pub fn resource_matches(rule_resources: &[String], resource: &str, subresource: Option<&str>) -> bool {
    let subresource = subresource.filter(|s| !s.is_empty());
    let full = match subresource {
        Some(sub) => format!("{}/{}", resource, sub),
        None => resource.to_string(),
    };

    rule_resources.iter().any(|r| {
        if r == WILDCARD || *r == full {
            return true;
        }
        match subresource {
            Some(_) => r.strip_suffix("/*") == Some(resource),
            None => r == resource,
        }
    })
}

/// Check a requested object name against the rule's name restriction
///
/// A rule without names covers every object. A request without a name is
/// asking about the capability in general, so a name-restricted rule still
/// counts.
pub fn resource_name_matches(rule_names: &[String], name: Option<&str>) -> bool {
    match name.filter(|n| !n.is_empty()) {
        Some(name) if !rule_names.is_empty() => rule_names.iter().any(|n| n == name),
        _ => true,
    }
}

/// Check if a binding subject entry names this subject directly
pub fn subject_entry_matches(entry: &BindingSubject, subject: &Subject) -> bool {
    if entry.kind != subject.kind.as_str() || entry.name != subject.name {
        return false;
    }

    if subject.kind == SubjectKind::ServiceAccount {
        return entry.namespace.as_deref().unwrap_or("") == subject.namespace_str();
    }

    true
}

/// Check if a binding subject entry names this subject or one of its groups
pub fn subject_entry_matches_with_groups(
    entry: &BindingSubject,
    subject: &Subject,
    groups: &[String],
) -> bool {
    if subject_entry_matches(entry, subject) {
        return true;
    }

    entry.kind == SubjectKind::Group.as_str() && groups.iter().any(|g| *g == entry.name)
}

/// Check if any subject entry of a binding applies
pub fn binding_matches_subject(entries: &[BindingSubject], subject: &Subject, groups: &[String]) -> bool {
    entries
        .iter()
        .any(|entry| subject_entry_matches_with_groups(entry, subject, groups))
}
