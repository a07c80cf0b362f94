//! Catalog of dangerous capability signatures

use serde::{Deserialize, Serialize};
use std::fmt;

/// How dangerous a capability is
///
/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::High, Severity::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known dangerous combination of verbs, API groups and resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskSignature {
    pub category: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub verbs: &'static [&'static str],
    pub api_groups: &'static [&'static str],
    pub resources: &'static [&'static str],
}

/// Signatures in classification order
pub const CATALOG: &[RiskSignature] = &[
    RiskSignature {
        category: "secrets-access",
        severity: Severity::Critical,
        description: "Access to Secrets can expose sensitive credentials, tokens, and keys",
        verbs: &["get", "list", "watch", "*"],
        api_groups: &["", "*"],
        resources: &["secrets", "*"],
    },
    RiskSignature {
        category: "pod-exec",
        severity: Severity::Critical,
        description: "Pod exec allows arbitrary command execution in containers",
        verbs: &["create", "*"],
        api_groups: &["", "*"],
        resources: &["pods/exec", "*"],
    },
    RiskSignature {
        category: "pod-attach",
        severity: Severity::Critical,
        description: "Pod attach allows connecting to running containers",
        verbs: &["create", "*"],
        api_groups: &["", "*"],
        resources: &["pods/attach", "*"],
    },
    RiskSignature {
        category: "pod-create",
        severity: Severity::High,
        description: "Pod creation can lead to privilege escalation via hostPath, hostPID, etc.",
        verbs: &["create", "*"],
        api_groups: &["", "*"],
        resources: &["pods", "*"],
    },
    RiskSignature {
        category: "impersonate",
        severity: Severity::Critical,
        description: "Impersonation allows assuming other user/group identities",
        verbs: &["impersonate", "*"],
        api_groups: &["", "*"],
        resources: &["users", "groups", "serviceaccounts", "*"],
    },
    RiskSignature {
        category: "nodes-proxy",
        severity: Severity::Critical,
        description: "Node proxy access can execute commands on nodes via kubelet API",
        verbs: &["get", "create", "*"],
        api_groups: &["", "*"],
        resources: &["nodes/proxy", "*"],
    },
    RiskSignature {
        category: "persistent-volume-create",
        severity: Severity::High,
        description: "PV creation with hostPath can access node filesystem",
        verbs: &["create", "*"],
        api_groups: &["", "*"],
        resources: &["persistentvolumes", "*"],
    },
    RiskSignature {
        category: "cluster-admin",
        severity: Severity::Critical,
        description: "Wildcard access grants full cluster control (cluster-admin equivalent)",
        verbs: &["*"],
        api_groups: &["*"],
        resources: &["*"],
    },
    RiskSignature {
        category: "role-escalation",
        severity: Severity::Critical,
        description: "Ability to create/modify roles can escalate privileges",
        verbs: &["create", "update", "patch", "*"],
        api_groups: &["rbac.authorization.k8s.io", "*"],
        resources: &["roles", "clusterroles", "*"],
    },
    RiskSignature {
        category: "binding-escalation",
        severity: Severity::Critical,
        description: "Ability to create/modify bindings can grant any permissions",
        verbs: &["create", "update", "patch", "*"],
        api_groups: &["rbac.authorization.k8s.io", "*"],
        resources: &["rolebindings", "clusterrolebindings", "*"],
    },
    RiskSignature {
        category: "csr-approve",
        severity: Severity::High,
        description: "CSR approval can issue certificates for any identity",
        verbs: &["approve", "*"],
        api_groups: &["certificates.k8s.io", "*"],
        resources: &["certificatesigningrequests/approval", "*"],
    },
    RiskSignature {
        category: "token-request",
        severity: Severity::High,
        description: "Token request can generate tokens for any service account",
        verbs: &["create", "*"],
        api_groups: &["", "*"],
        resources: &["serviceaccounts/token", "*"],
    },
];

/// Look up a signature by category
pub fn signature(category: &str) -> Option<&'static RiskSignature> {
    CATALOG.iter().find(|sig| sig.category == category)
}
