//! Resolution error types

use std::time::Duration;

use thiserror::Error;

use crate::permissions::{BindingInfo, RoleRef};
use crate::source::SourceError;

/// Errors that can occur while resolving RBAC permissions
///
/// Some variants are fatal and abort a resolution (`DataSourceUnavailable`,
/// `Cancelled`, `Timeout`). Others are diagnostics that end up in
/// `PermissionResult::errors` while resolution carries on
/// (`ReferencedObjectMissing`, `InvalidRoleRef`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    /// Empty subject identifier
    #[error("subject cannot be empty")]
    EmptySubject,

    /// Subject identifier could not be parsed
    #[error("invalid serviceaccount format: {0} (expected system:serviceaccount:namespace:name)")]
    MalformedIdentifier(String),

    /// A list call against the data source failed
    #[error("failed to {operation}: {source}")]
    DataSourceUnavailable {
        /// What the resolver was trying to do
        operation: String,
        /// Underlying data source error
        #[source]
        source: SourceError,
    },

    /// The role a binding points to could not be fetched
    #[error("{binding}: failed to get {role}: {source}")]
    ReferencedObjectMissing {
        /// Binding holding the dangling reference
        binding: BindingInfo,
        /// The reference that failed to resolve
        role: RoleRef,
        /// Underlying data source error
        #[source]
        source: SourceError,
    },

    /// A ClusterRoleBinding that references a namespaced Role
    #[error("{binding}: cluster role binding cannot reference {role}")]
    InvalidRoleRef {
        /// Offending binding
        binding: BindingInfo,
        /// The reference it holds
        role: RoleRef,
    },

    /// Resolution was cancelled by the caller
    #[error("resolution cancelled")]
    Cancelled,

    /// A data source call exceeded the configured timeout
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The data source call that timed out
        operation: String,
        /// Configured limit
        timeout: Duration,
    },

    /// Permission request is missing required fields
    #[error("invalid permission request: {0}")]
    InvalidRequest(String),

    /// RBAC snapshot could not be read or decoded
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RbacError {
    /// Whether this error aborts a resolution rather than being recorded
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RbacError::ReferencedObjectMissing { .. } | RbacError::InvalidRoleRef { .. }
        )
    }

    pub(crate) fn unavailable(operation: impl Into<String>, source: SourceError) -> Self {
        RbacError::DataSourceUnavailable {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type alias for resolution operations
pub type RbacResult<T> = Result<T, RbacError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::BindingKind;

    #[test]
    fn test_error_display() {
        let err = RbacError::EmptySubject;
        assert_eq!(err.to_string(), "subject cannot be empty");

        let err = RbacError::MalformedIdentifier("system:serviceaccount:ns".into());
        assert_eq!(
            err.to_string(),
            "invalid serviceaccount format: system:serviceaccount:ns (expected system:serviceaccount:namespace:name)"
        );

        let err = RbacError::unavailable(
            "list cluster role bindings",
            SourceError::Transport("connection refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "failed to list cluster role bindings: transport error: connection refused"
        );
    }

    #[test]
    fn test_missing_reference_is_not_fatal() {
        let err = RbacError::ReferencedObjectMissing {
            binding: BindingInfo {
                kind: BindingKind::RoleBinding,
                name: "read-pods".into(),
                namespace: Some("default".into()),
            },
            role: RoleRef::role("pod-reader"),
            source: SourceError::not_found("Role", Some("default"), "pod-reader"),
        };
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "RoleBinding default/read-pods: failed to get Role pod-reader: Role default/pod-reader not found"
        );

        assert!(RbacError::Cancelled.is_fatal());
    }
}
