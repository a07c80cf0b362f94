//! RBAC object model and resolution results

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{RbacError, RbacResult};
use crate::subject::Subject;

/// Wildcard token accepted in verbs, API groups and resources
pub const WILDCARD: &str = "*";

/// A permission being checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub verb: String,
    /// API group; "" is the core group
    pub api_group: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subresource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// None for a cluster-scoped query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl PermissionRequest {
    /// Create a request for a verb on a core-group resource
    pub fn new(verb: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            resource: resource.into(),
            ..Self::default()
        }
    }

    /// Create a request from a `resource[.group][/subresource]` argument
    ///
    /// `pods/exec`, `deployments.apps` and `deployments.apps/scale` are all
    /// accepted. A version suffix on the group (`apps/v1`) is not: the part
    /// after the first `/` is always the subresource.
    pub fn parse_resource(verb: impl Into<String>, resource: &str) -> RbacResult<Self> {
        let verb = verb.into();
        if verb.is_empty() {
            return Err(RbacError::InvalidRequest("verb is required".into()));
        }

        let (base, subresource) = match resource.split_once('/') {
            Some((base, sub)) => (base, Some(sub)),
            None => (resource, None),
        };
        let (resource, api_group) = match base.split_once('.') {
            Some((resource, group)) => (resource, group),
            None => (base, ""),
        };

        if resource.is_empty() {
            return Err(RbacError::InvalidRequest("resource is required".into()));
        }

        let mut request = Self::new(verb, resource).with_api_group(api_group);
        if let Some(sub) = subresource.filter(|s| !s.is_empty()) {
            request = request.with_subresource(sub);
        }
        Ok(request)
    }

    /// Set the API group
    pub fn with_api_group(mut self, api_group: impl Into<String>) -> Self {
        self.api_group = api_group.into();
        self
    }

    /// Set the subresource (e.g. "exec" for pods/exec)
    pub fn with_subresource(mut self, subresource: impl Into<String>) -> Self {
        self.subresource = Some(subresource.into());
        self
    }

    /// Restrict the request to a single named object
    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// Scope the request to a namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into()).filter(|ns: &String| !ns.is_empty());
        self
    }

    /// Resource including subresource, e.g. "pods/exec"
    pub fn full_resource(&self) -> String {
        match &self.subresource {
            Some(sub) => format!("{}/{}", self.resource, sub),
            None => self.resource.clone(),
        }
    }
}

impl fmt::Display for PermissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.full_resource())?;
        if !self.api_group.is_empty() {
            write!(f, ".{}", self.api_group)?;
        }
        if let Some(name) = &self.resource_name {
            write!(f, " (name: {})", name)?;
        }
        Ok(())
    }
}

/// A single policy rule: a conjunction of match sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Empty means every resource name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
}

impl PolicyRule {
    /// Create a rule over the given verbs
    pub fn new<I, S>(verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verbs: collect(verbs),
            ..Self::default()
        }
    }

    pub fn with_api_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_groups = collect(groups);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = collect(resources);
        self
    }

    pub fn with_resource_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_names = collect(names);
        self
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.api_groups.is_empty() {
            parts.push(format!("apiGroups={}", quoted(&self.api_groups)));
        }
        if !self.resources.is_empty() {
            parts.push(format!("resources={}", quoted(&self.resources)));
        }
        if !self.verbs.is_empty() {
            parts.push(format!("verbs={}", quoted(&self.verbs)));
        }
        if !self.resource_names.is_empty() {
            parts.push(format!("resourceNames={}", quoted(&self.resource_names)));
        }
        f.write_str(&parts.join(", "))
    }
}

fn collect<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

fn quoted(items: &[String]) -> String {
    let inner: Vec<String> = items.iter().map(|item| format!("{:?}", item)).collect();
    format!("[{}]", inner.join(" "))
}

/// One entry of a binding's subject list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSubject {
    /// "User", "Group" or "ServiceAccount"
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl BindingSubject {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: "User".into(),
            name: name.into(),
            namespace: None,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: "Group".into(),
            name: name.into(),
            namespace: None,
        }
    }

    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: "ServiceAccount".into(),
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

/// What a binding points to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum RoleRef {
    /// A Role in the binding's own namespace
    Role(String),
    /// A cluster-wide ClusterRole
    ClusterRole(String),
}

impl RoleRef {
    pub fn role(name: impl Into<String>) -> Self {
        RoleRef::Role(name.into())
    }

    pub fn cluster_role(name: impl Into<String>) -> Self {
        RoleRef::ClusterRole(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            RoleRef::Role(name) | RoleRef::ClusterRole(name) => name,
        }
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            RoleRef::Role(_) => RoleKind::Role,
            RoleRef::ClusterRole(_) => RoleKind::ClusterRole,
        }
    }
}

impl fmt::Display for RoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}

/// RoleBinding or ClusterRoleBinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    RoleBinding,
    ClusterRoleBinding,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::RoleBinding => "RoleBinding",
            BindingKind::ClusterRoleBinding => "ClusterRoleBinding",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role or ClusterRole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Role,
    ClusterRole,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Role => "Role",
            RoleKind::ClusterRole => "ClusterRole",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Associates subjects with a role reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub kind: BindingKind,
    pub name: String,
    /// RoleBinding only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub subjects: Vec<BindingSubject>,
    pub role_ref: RoleRef,
}

impl Binding {
    /// Create a ClusterRoleBinding to a ClusterRole
    pub fn cluster_role_binding(name: impl Into<String>, cluster_role: impl Into<String>) -> Self {
        Self {
            kind: BindingKind::ClusterRoleBinding,
            name: name.into(),
            namespace: None,
            subjects: Vec::new(),
            role_ref: RoleRef::cluster_role(cluster_role),
        }
    }

    /// Create a RoleBinding in a namespace
    pub fn role_binding(
        namespace: impl Into<String>,
        name: impl Into<String>,
        role_ref: RoleRef,
    ) -> Self {
        Self {
            kind: BindingKind::RoleBinding,
            name: name.into(),
            namespace: Some(namespace.into()),
            subjects: Vec::new(),
            role_ref,
        }
    }

    /// Add a subject entry
    pub fn with_subject(mut self, subject: BindingSubject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Summary used in grants and diagnostics
    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            kind: self.kind,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// A named collection of policy rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub kind: RoleKind,
    pub name: String,
    /// Role only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Role {
    /// Create a namespaced Role
    pub fn role(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: RoleKind::Role,
            name: name.into(),
            namespace: Some(namespace.into()),
            rules: Vec::new(),
        }
    }

    /// Create a ClusterRole
    pub fn cluster_role(name: impl Into<String>) -> Self {
        Self {
            kind: RoleKind::ClusterRole,
            name: name.into(),
            namespace: None,
            rules: Vec::new(),
        }
    }

    /// Add a rule
    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn info(&self) -> RoleInfo {
        RoleInfo {
            kind: self.kind,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Identifies the binding of a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingInfo {
    pub kind: BindingKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl fmt::Display for BindingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Identifies the role of a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub kind: RoleKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl fmt::Display for RoleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Whether a grant is confined to a namespace or applies cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantScope {
    #[serde(rename = "namespace")]
    Namespace,
    #[serde(rename = "cluster-wide")]
    ClusterWide,
}

impl GrantScope {
    /// Scope follows the binding, never the role
    pub fn of(kind: BindingKind) -> Self {
        match kind {
            BindingKind::ClusterRoleBinding => GrantScope::ClusterWide,
            BindingKind::RoleBinding => GrantScope::Namespace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GrantScope::Namespace => "namespace",
            GrantScope::ClusterWide => "cluster-wide",
        }
    }
}

impl fmt::Display for GrantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently revocable grant chain: subject → binding → role → rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub binding: BindingInfo,
    pub role: RoleInfo,
    pub matching_rule: PolicyRule,
    pub scope: GrantScope,
}

impl Grant {
    pub fn new(binding: &Binding, role: &Role, rule: &PolicyRule) -> Self {
        Self {
            binding: binding.info(),
            role: role.info(),
            matching_rule: rule.clone(),
            scope: GrantScope::of(binding.kind),
        }
    }
}

/// Outcome of `Resolver::resolve_permission`
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionResult {
    pub request: PermissionRequest,
    pub subject: Subject,
    /// True iff at least one grant exists
    pub allowed: bool,
    pub grants: Vec<Grant>,
    /// Non-fatal lookup failures; a denial with errors may be incomplete
    pub errors: Vec<RbacError>,
}

impl PermissionResult {
    /// Whether the answer was computed with full visibility
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
