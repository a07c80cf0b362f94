//! RBAC data sources
//!
//! The resolver reads bindings and roles through the `RbacSource` trait so
//! that different backends can be used interchangeably:
//!
//! - `SnapshotSource` - in-memory point-in-time snapshot (tests, offline analysis)
//! - `KubectlSource` - live cluster reads through `kubectl`
//!
//! Implementations never write anything. List failures are fatal to a
//! resolution; get failures only drop the binding that needed the object.

pub mod kubectl;
pub mod snapshot;
pub mod wire;

use async_trait::async_trait;
use thiserror::Error;

use crate::permissions::{Binding, Role};

pub use kubectl::{KubectlConfig, KubectlSource};
pub use snapshot::SnapshotSource;

/// Errors reported by a data source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Requested object does not exist
    #[error("{kind} {} not found", qualified(.namespace, .name))]
    NotFound {
        kind: String,
        namespace: Option<String>,
        name: String,
    },

    /// The backend could not be reached or refused the request
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with data that could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn not_found(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        SourceError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

fn qualified(namespace: &Option<String>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}/{}", ns, name),
        None => name.to_string(),
    }
}

/// Read-only accessor over RBAC objects
///
/// Implementations must be safe for concurrent reads. Ordering matters:
/// the resolver reports grants in the order bindings are listed here.
#[async_trait]
pub trait RbacSource: Send + Sync {
    /// List every ClusterRoleBinding
    async fn list_cluster_role_bindings(&self) -> Result<Vec<Binding>, SourceError>;

    /// List the RoleBindings of one namespace
    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<Binding>, SourceError>;

    /// Fetch a ClusterRole by name
    async fn get_cluster_role(&self, name: &str) -> Result<Role, SourceError>;

    /// Fetch a Role by namespace and name
    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, SourceError>;

    /// Short name for logging (e.g. "snapshot", "kubectl")
    fn source_name(&self) -> &str;
}

#[async_trait]
impl<S: RbacSource + ?Sized> RbacSource for std::sync::Arc<S> {
    async fn list_cluster_role_bindings(&self) -> Result<Vec<Binding>, SourceError> {
        (**self).list_cluster_role_bindings().await
    }

    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<Binding>, SourceError> {
        (**self).list_role_bindings(namespace).await
    }

    async fn get_cluster_role(&self, name: &str) -> Result<Role, SourceError> {
        (**self).get_cluster_role(name).await
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, SourceError> {
        (**self).get_role(namespace, name).await
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}
