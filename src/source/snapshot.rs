//! In-memory RBAC snapshot
//!
//! Holds a point-in-time copy of every binding and role. Every resolution
//! against a snapshot sees one consistent view, which also makes it the
//! natural backend for tests and offline analysis.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::wire::WireList;
use super::{RbacSource, SourceError};
use crate::core::{RbacError, RbacResult};
use crate::permissions::{Binding, BindingKind, Role, RoleKind};

/// Point-in-time RBAC state
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    cluster_role_bindings: Vec<Binding>,
    role_bindings: HashMap<String, Vec<Binding>>,
    cluster_roles: HashMap<String, Role>,
    roles: HashMap<(String, String), Role>,
    captured_at: Option<DateTime<Utc>>,
}

impl SnapshotSource {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self {
            cluster_role_bindings: Vec::new(),
            role_bindings: HashMap::new(),
            cluster_roles: HashMap::new(),
            roles: HashMap::new(),
            captured_at: None,
        }
    }

    /// Add a binding, keeping list order
    ///
    /// A RoleBinding without a namespace is filed under "default".
    pub fn add_binding(&mut self, binding: Binding) {
        match binding.kind {
            BindingKind::ClusterRoleBinding => self.cluster_role_bindings.push(binding),
            BindingKind::RoleBinding => {
                let namespace = binding
                    .namespace
                    .clone()
                    .unwrap_or_else(|| "default".to_string());
                self.role_bindings.entry(namespace).or_default().push(binding);
            }
        }
    }

    /// Add a role; a later role with the same identity replaces the earlier one
    pub fn add_role(&mut self, role: Role) {
        match role.kind {
            RoleKind::ClusterRole => {
                self.cluster_roles.insert(role.name.clone(), role);
            }
            RoleKind::Role => {
                let namespace = role.namespace.clone().unwrap_or_else(|| "default".to_string());
                self.roles.insert((namespace, role.name.clone()), role);
            }
        }
    }

    /// Builder form of `add_binding`
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.add_binding(binding);
        self
    }

    /// Builder form of `add_role`
    pub fn with_role(mut self, role: Role) -> Self {
        self.add_role(role);
        self
    }

    /// Decode a mixed `List`, e.g. the output of
    /// `kubectl get clusterroles,clusterrolebindings,roles,rolebindings -A -o json`
    ///
    /// Items of other kinds are ignored.
    pub fn from_json(json: &[u8]) -> RbacResult<Self> {
        let list: WireList =
            serde_json::from_slice(json).map_err(|e| RbacError::Snapshot(e.to_string()))?;

        let mut snapshot = Self::new();
        let mut skipped = 0usize;
        for item in list.items {
            let name = item.metadata.name.clone();
            let kind = item.kind.clone();
            let converted = match kind.as_str() {
                "ClusterRole" => item.into_role(RoleKind::ClusterRole).map(|r| snapshot.add_role(r)),
                "Role" => item.into_role(RoleKind::Role).map(|r| snapshot.add_role(r)),
                "ClusterRoleBinding" => item
                    .into_binding(BindingKind::ClusterRoleBinding)
                    .map(|b| snapshot.add_binding(b)),
                "RoleBinding" => item
                    .into_binding(BindingKind::RoleBinding)
                    .map(|b| snapshot.add_binding(b)),
                other => {
                    tracing::debug!("Ignoring {} {} in snapshot", other, name);
                    skipped += 1;
                    Ok(())
                }
            };
            converted.map_err(|e| RbacError::Snapshot(format!("{}: {}", name, e)))?;
        }

        tracing::info!(
            "Loaded RBAC snapshot: {} cluster role bindings, {} role bindings, {} cluster roles, {} roles ({} items ignored)",
            snapshot.cluster_role_bindings.len(),
            snapshot.role_bindings.values().map(Vec::len).sum::<usize>(),
            snapshot.cluster_roles.len(),
            snapshot.roles.len(),
            skipped
        );

        Ok(snapshot)
    }

    /// Load a snapshot file
    ///
    /// The file's modification time is taken as the capture time.
    pub fn load(path: impl AsRef<Path>) -> RbacResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| RbacError::Snapshot(format!("failed to read {}: {}", path.display(), e)))?;
        let mut snapshot = Self::from_json(&bytes)?;

        match fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => snapshot.captured_at = Some(DateTime::<Utc>::from(modified)),
            Err(e) => tracing::debug!("No modification time for {}: {}", path.display(), e),
        }
        Ok(snapshot)
    }

    /// Record when the RBAC state was captured
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// When the RBAC state was captured, if known
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Namespaces that have at least one RoleBinding
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.role_bindings.keys().map(String::as_str).collect();
        namespaces.sort_unstable();
        namespaces
    }
}

impl Default for SnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RbacSource for SnapshotSource {
    async fn list_cluster_role_bindings(&self) -> Result<Vec<Binding>, SourceError> {
        Ok(self.cluster_role_bindings.clone())
    }

    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<Binding>, SourceError> {
        Ok(self.role_bindings.get(namespace).cloned().unwrap_or_default())
    }

    async fn get_cluster_role(&self, name: &str) -> Result<Role, SourceError> {
        self.cluster_roles
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::not_found("ClusterRole", None, name))
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, SourceError> {
        self.roles
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::not_found("Role", Some(namespace), name))
    }

    fn source_name(&self) -> &str {
        "snapshot"
    }
}
