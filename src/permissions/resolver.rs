//! Grant chain resolution
//!
//! Walks subject → binding → role → rule against an `RbacSource` and
//! reports every chain that grants a permission. Cluster bindings are
//! visited first, then the RoleBindings of the requested namespace; grants
//! come out in that order, then binding list order, then rule order.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::matcher::{binding_matches_subject, rule_matches};
use super::types::{Binding, BindingKind, Grant, PermissionRequest, PermissionResult, Role, RoleRef};
use crate::core::{RbacError, RbacResult, ResolverConfig};
use crate::source::{RbacSource, SourceError};
use crate::subject::Subject;

/// Contribution of a single matching binding: its grants, or the reason
/// it could not be followed
type BindingOutcome = Result<Vec<Grant>, RbacError>;

/// Grants and non-fatal diagnostics collected over one traversal
#[derive(Debug, Default)]
struct Resolution {
    grants: Vec<Grant>,
    errors: Vec<RbacError>,
}

impl Resolution {
    fn absorb(mut self, outcome: BindingOutcome) -> Self {
        match outcome {
            Ok(grants) => self.grants.extend(grants),
            Err(error) => self.errors.push(error),
        }
        self
    }
}

/// Resolves RBAC permissions against a data source
///
/// The resolver holds no mutable state; one instance can serve concurrent
/// resolutions if the source supports concurrent reads.
pub struct Resolver<S> {
    source: S,
    config: ResolverConfig,
    cancel: CancellationToken,
}

impl<S: RbacSource> Resolver<S> {
    /// Create a resolver with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, ResolverConfig::default())
    }

    /// Create a resolver with custom configuration
    pub fn with_config(source: S, config: ResolverConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future resolutions when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get the data source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get the configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Find every grant chain that allows `request` for `subject`
    ///
    /// Role references that cannot be fetched, including fetches that time
    /// out, are recorded in `errors` and do not stop resolution. Failing to
    /// list bindings does.
    pub async fn resolve_permission(
        &self,
        subject: &Subject,
        request: &PermissionRequest,
    ) -> RbacResult<PermissionResult> {
        if request.verb.is_empty() {
            return Err(RbacError::InvalidRequest("verb is required".into()));
        }
        if request.resource.is_empty() {
            return Err(RbacError::InvalidRequest("resource is required".into()));
        }

        let resolution = self
            .traverse(subject, request.namespace.as_deref(), Some(request))
            .await?;

        tracing::info!(
            "Resolved '{}' for {}: {} grant(s), {} error(s)",
            request,
            subject,
            resolution.grants.len(),
            resolution.errors.len()
        );

        Ok(PermissionResult {
            request: request.clone(),
            subject: subject.clone(),
            allowed: !resolution.grants.is_empty(),
            grants: resolution.grants,
            errors: resolution.errors,
        })
    }

    /// Collect every rule reachable by `subject`, regardless of verb or resource
    ///
    /// Bindings whose role cannot be fetched are skipped with a warning.
    pub async fn resolve_all_permissions(
        &self,
        subject: &Subject,
        namespace: Option<&str>,
    ) -> RbacResult<Vec<Grant>> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let resolution = self.traverse(subject, namespace, None).await?;

        for error in &resolution.errors {
            tracing::warn!("Skipping binding while enumerating permissions: {}", error);
        }

        tracing::info!(
            "Enumerated {} rule(s) reachable by {}",
            resolution.grants.len(),
            subject
        );

        Ok(resolution.grants)
    }

    /// Resolve several requests for one subject, returning results in input order
    pub async fn check_many(
        &self,
        subject: &Subject,
        requests: &[PermissionRequest],
    ) -> RbacResult<Vec<PermissionResult>> {
        stream::iter(requests)
            .map(|request| self.resolve_permission(subject, request))
            .buffered(self.config.batch_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn traverse(
        &self,
        subject: &Subject,
        namespace: Option<&str>,
        filter: Option<&PermissionRequest>,
    ) -> RbacResult<Resolution> {
        let groups = subject.effective_groups();
        let mut outcomes = Vec::new();

        let operation = "list cluster role bindings";
        let cluster_bindings = self
            .call(operation, self.source.list_cluster_role_bindings())
            .await?
            .map_err(|e| RbacError::unavailable(operation, e))?;

        for binding in &cluster_bindings {
            if binding_matches_subject(&binding.subjects, subject, &groups) {
                outcomes.push(self.expand_binding(binding, None, filter).await?);
            }
        }

        if let Some(namespace) = namespace {
            let operation = format!("list role bindings in namespace {}", namespace);
            let role_bindings = self
                .call(&operation, self.source.list_role_bindings(namespace))
                .await?
                .map_err(|e| RbacError::unavailable(operation.as_str(), e))?;

            for binding in &role_bindings {
                if binding_matches_subject(&binding.subjects, subject, &groups) {
                    outcomes.push(self.expand_binding(binding, Some(namespace), filter).await?);
                }
            }
        }

        Ok(outcomes
            .into_iter()
            .fold(Resolution::default(), Resolution::absorb))
    }

    /// Fetch the role a matching binding refers to and turn its rules into grants
    async fn expand_binding(
        &self,
        binding: &Binding,
        namespace: Option<&str>,
        filter: Option<&PermissionRequest>,
    ) -> RbacResult<BindingOutcome> {
        tracing::debug!("{} matches subject, resolving {}", binding.info(), binding.role_ref);

        let fetched = match (binding.kind, &binding.role_ref) {
            (BindingKind::ClusterRoleBinding, RoleRef::Role(_)) => {
                return Ok(Err(RbacError::InvalidRoleRef {
                    binding: binding.info(),
                    role: binding.role_ref.clone(),
                }));
            }
            (_, RoleRef::ClusterRole(name)) => {
                self.fetch_role("get cluster role", self.source.get_cluster_role(name))
                    .await?
            }
            (BindingKind::RoleBinding, RoleRef::Role(name)) => {
                let namespace = namespace
                    .or(binding.namespace.as_deref())
                    .unwrap_or_default();
                self.fetch_role("get role", self.source.get_role(namespace, name))
                    .await?
            }
        };

        let role = match fetched {
            Ok(role) => role,
            Err(source) => {
                return Ok(Err(RbacError::ReferencedObjectMissing {
                    binding: binding.info(),
                    role: binding.role_ref.clone(),
                    source,
                }));
            }
        };

        let grants = role
            .rules
            .iter()
            .filter(|rule| filter.map_or(true, |request| rule_matches(rule, request)))
            .map(|rule| Grant::new(binding, &role, rule))
            .collect();

        Ok(Ok(grants))
    }

    /// Fetch the role behind one binding
    ///
    /// A timeout only loses this binding and is reported like any other
    /// failed fetch. Cancellation still aborts resolution.
    async fn fetch_role<F>(&self, operation: &str, call: F) -> RbacResult<Result<Role, SourceError>>
    where
        F: Future<Output = Result<Role, SourceError>>,
    {
        match self.call(operation, call).await {
            Err(timed_out @ RbacError::Timeout { .. }) => {
                tracing::warn!("{}", timed_out);
                Ok(Err(SourceError::Transport(timed_out.to_string())))
            }
            other => other,
        }
    }

    /// Run one data source call under the cancellation token and timeout
    ///
    /// The outer error aborts resolution; the inner one is the source's answer.
    async fn call<T, F>(&self, operation: &str, call: F) -> RbacResult<Result<T, SourceError>>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(RbacError::Cancelled);
        }

        tracing::debug!("[{}] {}", self.source.source_name(), operation);

        let limit = self.config.call_timeout();
        let guarded = async {
            match limit {
                Some(limit) => timeout(limit, call).await.map_err(|_| RbacError::Timeout {
                    operation: operation.to_string(),
                    timeout: limit,
                }),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RbacError::Cancelled),
            result = guarded => result,
        }
    }
}

impl<S> std::fmt::Debug for Resolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{BindingSubject, GrantScope, PolicyRule, Role, RoleKind};
    use crate::source::SnapshotSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn core_rule(verbs: &[&str], resources: &[&str]) -> PolicyRule {
        PolicyRule::new(verbs.iter().copied())
            .with_api_groups([""])
            .with_resources(resources.iter().copied())
    }

    fn test_sa() -> Subject {
        Subject::service_account("default", "test-sa")
    }

    /// Wraps a snapshot and fails or stalls selected calls
    #[derive(Default)]
    struct ScriptedSource {
        inner: SnapshotSource,
        fail_cluster_list: bool,
        fail_namespace_list: bool,
        list_delay: Option<Duration>,
        get_delay: Option<Duration>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RbacSource for ScriptedSource {
        async fn list_cluster_role_bindings(&self) -> Result<Vec<Binding>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.list_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_cluster_list {
                return Err(SourceError::Transport("connection refused".into()));
            }
            self.inner.list_cluster_role_bindings().await
        }

        async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<Binding>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_namespace_list {
                return Err(SourceError::Transport("forbidden".into()));
            }
            self.inner.list_role_bindings(namespace).await
        }

        async fn get_cluster_role(&self, name: &str) -> Result<Role, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.get_delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.get_cluster_role(name).await
        }

        async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_role(namespace, name).await
        }

        fn source_name(&self) -> &str {
            "scripted"
        }
    }

    fn scenario_a() -> SnapshotSource {
        SnapshotSource::new()
            .with_role(
                Role::role("default", "pod-reader")
                    .with_rule(core_rule(&["get", "list", "watch"], &["pods"])),
            )
            .with_binding(
                Binding::role_binding("default", "read-pods", RoleRef::role("pod-reader"))
                    .with_subject(BindingSubject::service_account("default", "test-sa")),
            )
    }

    #[tokio::test]
    async fn test_scenario_a_role_binding() {
        let resolver = Resolver::new(scenario_a());
        let request = PermissionRequest::new("get", "pods").in_namespace("default");

        let result = resolver.resolve_permission(&test_sa(), &request).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.grants.len(), 1);
        assert_eq!(result.grants[0].binding.kind, BindingKind::RoleBinding);
        assert_eq!(result.grants[0].binding.name, "read-pods");
        assert_eq!(result.grants[0].role.kind, RoleKind::Role);
        assert_eq!(result.grants[0].scope, GrantScope::Namespace);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_b_cluster_role_binding() {
        let source = SnapshotSource::new()
            .with_role(
                Role::cluster_role("secret-reader").with_rule(core_rule(&["get", "list"], &["secrets"])),
            )
            .with_binding(
                Binding::cluster_role_binding("read-secrets-global", "secret-reader")
                    .with_subject(BindingSubject::service_account("kube-system", "admin-sa")),
            );
        let resolver = Resolver::new(source);
        let subject = Subject::service_account("kube-system", "admin-sa");
        let request = PermissionRequest::new("get", "secrets").in_namespace("default");

        let result = resolver.resolve_permission(&subject, &request).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.grants.len(), 1);
        assert_eq!(result.grants[0].scope, GrantScope::ClusterWide);
    }

    #[tokio::test]
    async fn test_scenario_c_implicit_group() {
        let source = SnapshotSource::new()
            .with_role(Role::cluster_role("node-reader").with_rule(core_rule(&["get", "list"], &["nodes"])))
            .with_binding(
                Binding::cluster_role_binding("all-sa-read-nodes", "node-reader")
                    .with_subject(BindingSubject::group("system:serviceaccounts")),
            );
        let resolver = Resolver::new(source);
        let request = PermissionRequest::new("list", "nodes");

        for subject in [
            Subject::service_account("default", "anything"),
            Subject::service_account("monitoring", "prometheus"),
        ] {
            let result = resolver.resolve_permission(&subject, &request).await.unwrap();
            assert!(result.allowed, "{} should reach nodes via group", subject);
        }

        let user = resolver
            .resolve_permission(&Subject::user("jane"), &request)
            .await
            .unwrap();
        assert!(!user.allowed);
    }

    #[tokio::test]
    async fn test_scenario_d_multiple_paths() {
        let source = SnapshotSource::new()
            .with_role(Role::role("default", "cm-reader").with_rule(core_rule(&["get"], &["configmaps"])))
            .with_role(Role::cluster_role("cm-reader-global").with_rule(core_rule(&["get"], &["configmaps"])))
            .with_binding(
                Binding::role_binding("default", "local-cm", RoleRef::role("cm-reader"))
                    .with_subject(BindingSubject::service_account("default", "test-sa")),
            )
            .with_binding(
                Binding::cluster_role_binding("global-cm", "cm-reader-global")
                    .with_subject(BindingSubject::service_account("default", "test-sa")),
            );
        let resolver = Resolver::new(source);
        let request = PermissionRequest::new("get", "configmaps").in_namespace("default");

        let result = resolver.resolve_permission(&test_sa(), &request).await.unwrap();
        assert_eq!(result.grants.len(), 2);
        // Cluster grants come first
        assert_eq!(result.grants[0].binding.kind, BindingKind::ClusterRoleBinding);
        assert_eq!(result.grants[1].binding.kind, BindingKind::RoleBinding);
    }

    #[tokio::test]
    async fn test_scenario_e_no_binding() {
        let resolver = Resolver::new(scenario_a());
        let subject = Subject::service_account("default", "lonely");
        let request = PermissionRequest::new("get", "pods").in_namespace("default");

        let result = resolver.resolve_permission(&subject, &request).await.unwrap();
        assert!(!result.allowed);
        assert!(result.grants.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_role_binding_to_cluster_role_is_namespace_scoped() {
        let source = SnapshotSource::new()
            .with_role(Role::cluster_role("view").with_rule(core_rule(&["get"], &["pods"])))
            .with_binding(
                Binding::role_binding("dev", "dev-view", RoleRef::cluster_role("view"))
                    .with_subject(BindingSubject::user("jane")),
            );
        let resolver = Resolver::new(source);
        let subject = Subject::user("jane");

        let in_dev = resolver
            .resolve_permission(&subject, &PermissionRequest::new("get", "pods").in_namespace("dev"))
            .await
            .unwrap();
        assert_eq!(in_dev.grants.len(), 1);
        assert_eq!(in_dev.grants[0].scope, GrantScope::Namespace);
        assert_eq!(in_dev.grants[0].role.kind, RoleKind::ClusterRole);

        let in_prod = resolver
            .resolve_permission(&subject, &PermissionRequest::new("get", "pods").in_namespace("prod"))
            .await
            .unwrap();
        assert!(!in_prod.allowed);
    }

    #[tokio::test]
    async fn test_cluster_query_ignores_role_bindings() {
        let resolver = Resolver::new(scenario_a());
        let result = resolver
            .resolve_permission(&test_sa(), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap();
        assert!(!result.allowed);
    }

    #[tokio::test]
    async fn test_multiplicity_without_dedup() {
        let rule = core_rule(&["get"], &["pods"]);
        let mut source = SnapshotSource::new().with_role(
            Role::cluster_role("dup")
                .with_rule(rule.clone())
                .with_rule(rule.clone()),
        );
        for name in ["one", "two", "three"] {
            source.add_binding(
                Binding::cluster_role_binding(name, "dup").with_subject(BindingSubject::user("jane")),
            );
        }
        let resolver = Resolver::new(source);
        let result = resolver
            .resolve_permission(&Subject::user("jane"), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap();

        assert_eq!(result.grants.len(), 6);
        let names: Vec<&str> = result.grants.iter().map(|g| g.binding.name.as_str()).collect();
        assert_eq!(names, vec!["one", "one", "two", "two", "three", "three"]);
    }

    #[tokio::test]
    async fn test_binding_listing_subject_twice_counts_once() {
        let source = SnapshotSource::new()
            .with_role(Role::cluster_role("view").with_rule(core_rule(&["get"], &["pods"])))
            .with_binding(
                Binding::cluster_role_binding("both", "view")
                    .with_subject(BindingSubject::service_account("default", "test-sa"))
                    .with_subject(BindingSubject::group("system:serviceaccounts")),
            );
        let resolver = Resolver::new(source);
        let result = resolver
            .resolve_permission(&test_sa(), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap();
        assert_eq!(result.grants.len(), 1);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let resolver = Resolver::new(scenario_a());
        let request = PermissionRequest::new("list", "pods").in_namespace("default");

        let first = resolver.resolve_permission(&test_sa(), &request).await.unwrap();
        let second = resolver.resolve_permission(&test_sa(), &request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_role_is_recorded_not_fatal() {
        let source = scenario_a()
            .with_binding(
                Binding::role_binding("default", "dangling", RoleRef::role("gone"))
                    .with_subject(BindingSubject::service_account("default", "test-sa")),
            )
            .with_binding(
                Binding::cluster_role_binding("dangling-global", "also-gone")
                    .with_subject(BindingSubject::group("system:authenticated")),
            );
        let resolver = Resolver::new(source);
        let request = PermissionRequest::new("get", "pods").in_namespace("default");

        let result = resolver.resolve_permission(&test_sa(), &request).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.grants.len(), 1);
        assert_eq!(result.errors.len(), 2);
        assert!(!result.is_complete());
        assert!(matches!(
            &result.errors[0],
            RbacError::ReferencedObjectMissing { role: RoleRef::ClusterRole(name), .. } if name == "also-gone"
        ));
        assert!(matches!(
            &result.errors[1],
            RbacError::ReferencedObjectMissing { role: RoleRef::Role(name), .. } if name == "gone"
        ));
    }

    #[tokio::test]
    async fn test_cluster_binding_to_role_is_invalid() {
        let mut binding = Binding::cluster_role_binding("odd", "ignored")
            .with_subject(BindingSubject::user("jane"));
        binding.role_ref = RoleRef::role("pod-reader");
        let resolver = Resolver::new(scenario_a().with_binding(binding));

        let result = resolver
            .resolve_permission(&Subject::user("jane"), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap();
        assert!(!result.allowed);
        assert!(matches!(result.errors[0], RbacError::InvalidRoleRef { .. }));
    }

    #[tokio::test]
    async fn test_list_failure_is_fatal() {
        let resolver = Resolver::new(ScriptedSource {
            inner: scenario_a(),
            fail_cluster_list: true,
            ..Default::default()
        });
        let err = resolver
            .resolve_permission(&test_sa(), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::DataSourceUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_namespace_list_failure_is_fatal() {
        let resolver = Resolver::new(ScriptedSource {
            inner: scenario_a(),
            fail_namespace_list: true,
            ..Default::default()
        });
        let request = PermissionRequest::new("get", "pods").in_namespace("default");
        let err = resolver.resolve_permission(&test_sa(), &request).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to list role bindings in namespace default: transport error: forbidden"
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        let source = ScriptedSource {
            inner: scenario_a(),
            ..Default::default()
        };
        let resolver = Resolver::new(source).with_cancellation(token.clone());
        token.cancel();

        let err = resolver
            .resolve_permission(&test_sa(), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap_err();
        assert_eq!(err, RbacError::Cancelled);
        assert_eq!(resolver.source().calls.load(Ordering::SeqCst), 0);
    }

    fn slow_view_source() -> SnapshotSource {
        SnapshotSource::new()
            .with_role(Role::cluster_role("view").with_rule(core_rule(&["get"], &["pods"])))
            .with_role(Role::role("default", "pod-reader").with_rule(core_rule(&["get"], &["pods"])))
            .with_binding(
                Binding::cluster_role_binding("view", "view").with_subject(BindingSubject::user("jane")),
            )
            .with_binding(
                Binding::role_binding("default", "read-pods", RoleRef::role("pod-reader"))
                    .with_subject(BindingSubject::user("jane")),
            )
    }

    #[tokio::test]
    async fn test_role_fetch_timeout_is_recorded() {
        let source = ScriptedSource {
            inner: slow_view_source(),
            get_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let resolver = Resolver::with_config(source, ResolverConfig::new().with_call_timeout(10));
        let request = PermissionRequest::new("get", "pods").in_namespace("default");

        let result = resolver.resolve_permission(&Subject::user("jane"), &request).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.grants.len(), 1);
        assert_eq!(result.grants[0].role.name, "pod-reader");
        assert_eq!(result.errors.len(), 1);
        match &result.errors[0] {
            RbacError::ReferencedObjectMissing {
                role: RoleRef::ClusterRole(name),
                source: SourceError::Transport(message),
                ..
            } => {
                assert_eq!(name, "view");
                assert!(message.contains("get cluster role"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!result.errors[0].is_fatal());
    }

    #[tokio::test]
    async fn test_list_timeout_is_fatal() {
        let source = ScriptedSource {
            inner: slow_view_source(),
            list_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let resolver = Resolver::with_config(source, ResolverConfig::new().with_call_timeout(10));

        let err = resolver
            .resolve_permission(&Subject::user("jane"), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::Timeout { ref operation, .. } if operation == "list cluster role bindings"));
    }

    #[tokio::test]
    async fn test_cancel_during_role_fetch_is_fatal() {
        let token = CancellationToken::new();
        let source = ScriptedSource {
            inner: slow_view_source(),
            get_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let resolver = Resolver::new(source).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = resolver
            .resolve_permission(&Subject::user("jane"), &PermissionRequest::new("get", "pods"))
            .await
            .unwrap_err();
        canceller.await.unwrap();
        assert_eq!(err, RbacError::Cancelled);
    }

    #[tokio::test]
    async fn test_explicit_groups_match_group_bindings() {
        let source = SnapshotSource::new()
            .with_role(Role::cluster_role("cluster-admin").with_rule(PolicyRule::new(["*"]).with_api_groups(["*"]).with_resources(["*"])))
            .with_binding(
                Binding::cluster_role_binding("masters", "cluster-admin")
                    .with_subject(BindingSubject::group("system:masters")),
            );
        let resolver = Resolver::new(source);
        let request = PermissionRequest::new("delete", "nodes");

        let plain = resolver.resolve_permission(&Subject::user("kube-admin"), &request).await.unwrap();
        assert!(!plain.allowed);

        let with_group = Subject::user("kube-admin").with_groups(["system:masters"]);
        let result = resolver.resolve_permission(&with_group, &request).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let resolver = Resolver::new(SnapshotSource::new());
        let err = resolver
            .resolve_permission(&test_sa(), &PermissionRequest::new("", "pods"))
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_resolve_all_permissions() {
        let source = scenario_a()
            .with_role(
                Role::cluster_role("secret-reader")
                    .with_rule(core_rule(&["get"], &["secrets"]))
                    .with_rule(core_rule(&["list"], &["secrets"])),
            )
            .with_binding(
                Binding::cluster_role_binding("secrets", "secret-reader")
                    .with_subject(BindingSubject::group("system:serviceaccounts:default")),
            )
            .with_binding(
                Binding::role_binding("default", "dangling", RoleRef::role("gone"))
                    .with_subject(BindingSubject::service_account("default", "test-sa")),
            );
        let resolver = Resolver::new(source);

        let cluster_only = resolver.resolve_all_permissions(&test_sa(), None).await.unwrap();
        assert_eq!(cluster_only.len(), 2);
        assert!(cluster_only.iter().all(|g| g.scope == GrantScope::ClusterWide));

        let with_namespace = resolver
            .resolve_all_permissions(&test_sa(), Some("default"))
            .await
            .unwrap();
        assert_eq!(with_namespace.len(), 3);
        assert_eq!(with_namespace[2].role.name, "pod-reader");
        assert_eq!(with_namespace[2].scope, GrantScope::Namespace);
    }

    #[tokio::test]
    async fn test_check_many_preserves_order() {
        let resolver = Resolver::with_config(
            Arc::new(scenario_a()),
            ResolverConfig::new().with_batch_concurrency(2),
        );
        let requests = vec![
            PermissionRequest::new("get", "pods").in_namespace("default"),
            PermissionRequest::new("delete", "pods").in_namespace("default"),
            PermissionRequest::new("watch", "pods").in_namespace("default"),
        ];

        let results = resolver.check_many(&test_sa(), &requests).await.unwrap();
        let allowed: Vec<bool> = results.iter().map(|r| r.allowed).collect();
        assert_eq!(allowed, vec![true, false, true]);
        assert_eq!(results[1].request.verb, "delete");
    }
}
