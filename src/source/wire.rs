//! Kubernetes wire format for RBAC objects
//!
//! Mirrors the `rbac.authorization.k8s.io/v1` JSON shapes returned by the
//! API server (camelCase keys, optional lists) and converts them into the
//! crate's model. Only the fields the resolver needs are decoded.

use serde::{Deserialize, Serialize};

use super::SourceError;
use crate::permissions::{Binding, BindingKind, BindingSubject, PolicyRule, Role, RoleKind, RoleRef};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePolicyRule {
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub api_groups: Option<Vec<String>>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
    #[serde(default)]
    pub resource_names: Option<Vec<String>>,
    #[serde(default, rename = "nonResourceURLs")]
    pub non_resource_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSubject {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRoleRef {
    pub kind: String,
    pub name: String,
}

/// Any RBAC object; `kind` selects the interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireObject {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Option<Vec<WirePolicyRule>>,
    #[serde(default)]
    pub subjects: Option<Vec<WireSubject>>,
    #[serde(default)]
    pub role_ref: Option<WireRoleRef>,
}

/// A `List` or `*List` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireList {
    #[serde(default)]
    pub items: Vec<WireObject>,
}

impl From<WirePolicyRule> for PolicyRule {
    fn from(rule: WirePolicyRule) -> Self {
        PolicyRule {
            verbs: rule.verbs,
            api_groups: rule.api_groups.unwrap_or_default(),
            resources: rule.resources.unwrap_or_default(),
            resource_names: rule.resource_names.unwrap_or_default(),
        }
    }
}

impl From<WireSubject> for BindingSubject {
    fn from(subject: WireSubject) -> Self {
        BindingSubject {
            kind: subject.kind,
            name: subject.name,
            namespace: subject.namespace.filter(|ns| !ns.is_empty()),
        }
    }
}

impl WireRoleRef {
    fn into_role_ref(self) -> Result<RoleRef, SourceError> {
        match self.kind.as_str() {
            "Role" => Ok(RoleRef::Role(self.name)),
            "ClusterRole" => Ok(RoleRef::ClusterRole(self.name)),
            other => Err(SourceError::Decode(format!(
                "unsupported roleRef kind {:?} for {}",
                other, self.name
            ))),
        }
    }
}

impl WireObject {
    /// Convert a Role or ClusterRole. `kind` overrides an absent `kind` field,
    /// which happens for items of typed lists.
    pub fn into_role(self, kind: RoleKind) -> Result<Role, SourceError> {
        check_kind(&self.kind, kind.as_str(), &self.metadata.name)?;
        let namespace = match kind {
            RoleKind::Role => self.metadata.namespace.filter(|ns| !ns.is_empty()),
            RoleKind::ClusterRole => None,
        };
        Ok(Role {
            kind,
            name: self.metadata.name,
            namespace,
            rules: self
                .rules
                .unwrap_or_default()
                .into_iter()
                .map(PolicyRule::from)
                .collect(),
        })
    }

    /// Convert a RoleBinding or ClusterRoleBinding
    pub fn into_binding(self, kind: BindingKind) -> Result<Binding, SourceError> {
        check_kind(&self.kind, kind.as_str(), &self.metadata.name)?;
        let name = self.metadata.name;
        let role_ref = self
            .role_ref
            .ok_or_else(|| SourceError::Decode(format!("{} {} has no roleRef", kind, name)))?
            .into_role_ref()?;
        let namespace = match kind {
            BindingKind::RoleBinding => self.metadata.namespace.filter(|ns| !ns.is_empty()),
            BindingKind::ClusterRoleBinding => None,
        };
        Ok(Binding {
            kind,
            name,
            namespace,
            subjects: self
                .subjects
                .unwrap_or_default()
                .into_iter()
                .map(BindingSubject::from)
                .collect(),
            role_ref,
        })
    }
}

fn check_kind(actual: &str, expected: &str, name: &str) -> Result<(), SourceError> {
    if actual.is_empty() || actual == expected {
        Ok(())
    } else {
        Err(SourceError::Decode(format!(
            "expected {} but {} is a {}",
            expected, name, actual
        )))
    }
}

/// Decode a typed list of bindings
pub fn decode_bindings(json: &[u8], kind: BindingKind) -> Result<Vec<Binding>, SourceError> {
    let list: WireList =
        serde_json::from_slice(json).map_err(|e| SourceError::Decode(e.to_string()))?;
    list.items
        .into_iter()
        .map(|item| item.into_binding(kind))
        .collect()
}

/// Decode a single role
pub fn decode_role(json: &[u8], kind: RoleKind) -> Result<Role, SourceError> {
    let object: WireObject =
        serde_json::from_slice(json).map_err(|e| SourceError::Decode(e.to_string()))?;
    object.into_role(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINDING_LIST: &str = r#"{
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "kind": "RoleBindingList",
        "items": [
            {
                "kind": "RoleBinding",
                "metadata": {"name": "read-pods", "namespace": "default"},
                "subjects": [
                    {"kind": "ServiceAccount", "name": "test-sa", "namespace": "default"},
                    {"kind": "Group", "apiGroup": "rbac.authorization.k8s.io", "name": "devs"}
                ],
                "roleRef": {"apiGroup": "rbac.authorization.k8s.io", "kind": "Role", "name": "pod-reader"}
            },
            {
                "metadata": {"name": "no-subjects", "namespace": "default"},
                "roleRef": {"kind": "ClusterRole", "name": "view"}
            }
        ]
    }"#;

    #[test]
    fn test_decode_role_bindings() {
        let bindings = decode_bindings(BINDING_LIST.as_bytes(), BindingKind::RoleBinding).unwrap();
        assert_eq!(bindings.len(), 2);

        let first = &bindings[0];
        assert_eq!(first.name, "read-pods");
        assert_eq!(first.namespace.as_deref(), Some("default"));
        assert_eq!(first.role_ref, RoleRef::role("pod-reader"));
        assert_eq!(first.subjects[0], BindingSubject::service_account("default", "test-sa"));
        assert_eq!(first.subjects[1], BindingSubject::group("devs"));

        assert!(bindings[1].subjects.is_empty());
        assert_eq!(bindings[1].role_ref, RoleRef::cluster_role("view"));
    }

    #[test]
    fn test_decode_cluster_role_without_optional_lists() {
        let json = r#"{
            "kind": "ClusterRole",
            "metadata": {"name": "metrics"},
            "rules": [
                {"verbs": ["get"], "nonResourceURLs": ["/metrics"]},
                {"verbs": ["list"], "apiGroups": [""], "resources": ["nodes"]}
            ]
        }"#;
        let role = decode_role(json.as_bytes(), RoleKind::ClusterRole).unwrap();
        assert_eq!(role.namespace, None);
        assert_eq!(role.rules.len(), 2);
        assert!(role.rules[0].resources.is_empty());
        assert_eq!(role.rules[1].api_groups, vec![""]);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let json = r#"{"kind": "Role", "metadata": {"name": "x", "namespace": "a"}}"#;
        assert!(matches!(
            decode_role(json.as_bytes(), RoleKind::ClusterRole),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_role_ref_kind() {
        let json = r#"{"items": [{"metadata": {"name": "b"}, "roleRef": {"kind": "Widget", "name": "w"}}]}"#;
        assert!(matches!(
            decode_bindings(json.as_bytes(), BindingKind::ClusterRoleBinding),
            Err(SourceError::Decode(_))
        ));
    }
}
