//! Live data source backed by `kubectl`
//!
//! Each call runs `kubectl get <resource> -o json` and decodes the result.
//! Reads use whatever credentials the kubeconfig provides; impersonation
//! is never passed through, since the RBAC objects must be readable by the
//! caller rather than by the subject under investigation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::wire::{decode_bindings, decode_role};
use super::{RbacSource, SourceError};
use crate::permissions::{Binding, BindingKind, Role, RoleKind};

/// Default timeout for a single kubectl invocation (30 seconds)
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum stderr kept in error messages
const MAX_STDERR_LENGTH: usize = 2_000;
/// Reason marker kubectl prints for a 404 from the API server
const NOT_FOUND_MARKER: &str = "(NotFound)";

/// Configuration for `KubectlSource`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// kubectl executable
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Explicit kubeconfig path (otherwise kubectl's own lookup applies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Timeout per invocation in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_binary() -> String {
    "kubectl".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl KubectlConfig {
    pub fn new() -> Self {
        Self {
            binary: default_binary(),
            kubeconfig: None,
            context: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Arguments shared by every invocation
    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.kubeconfig {
            args.push(format!("--kubeconfig={}", path.display()));
        }
        if let Some(context) = &self.context {
            args.push(format!("--context={}", context));
        }
        args
    }
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads RBAC objects from a live cluster through kubectl
#[derive(Debug, Clone, Default)]
pub struct KubectlSource {
    config: KubectlConfig,
}

/// Outcome of one kubectl run
enum Fetch {
    Found(Vec<u8>),
    /// The API server answered NotFound; carries kubectl's message
    Missing(String),
}

impl KubectlSource {
    pub fn new(config: KubectlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KubectlConfig {
        &self.config
    }

    /// Full argument list for `kubectl get`
    fn get_args(&self, resource: &str, name: Option<&str>, namespace: Option<&str>) -> Vec<String> {
        let mut args = self.config.global_args();
        args.push("get".to_string());
        args.push(resource.to_string());
        if let Some(name) = name {
            args.push(name.to_string());
        }
        if let Some(namespace) = namespace {
            args.push(format!("--namespace={}", namespace));
        }
        args.push("--output=json".to_string());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<Fetch, SourceError> {
        tracing::debug!("Running {} {}", self.config.binary, args.join(" "));

        let output_future = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.config.timeout(), output_future).await {
            Ok(result) => result.map_err(|e| {
                SourceError::Transport(format!("failed to run {}: {}", self.config.binary, e))
            })?,
            Err(_) => {
                return Err(SourceError::Transport(format!(
                    "{} timed out after {}ms",
                    self.config.binary, self.config.timeout_ms
                )));
            }
        };

        if output.status.success() {
            return Ok(Fetch::Found(output.stdout));
        }

        let stderr = truncate_stderr(String::from_utf8_lossy(&output.stderr).trim().to_string());
        if stderr.contains(NOT_FOUND_MARKER) {
            return Ok(Fetch::Missing(stderr));
        }

        Err(SourceError::Transport(format!(
            "{} exited with {}: {}",
            self.config.binary,
            output.status.code().unwrap_or(-1),
            stderr
        )))
    }

    async fn list(&self, resource: &str, namespace: Option<&str>, kind: BindingKind) -> Result<Vec<Binding>, SourceError> {
        match self.run(self.get_args(resource, None, namespace)).await? {
            Fetch::Found(json) => decode_bindings(&json, kind),
            // An empty namespace lists fine; NotFound here means the resource type itself is gone
            Fetch::Missing(stderr) => Err(SourceError::Transport(format!(
                "listing {} failed: {}",
                resource, stderr
            ))),
        }
    }

    async fn get(&self, resource: &str, name: &str, namespace: Option<&str>, kind: RoleKind) -> Result<Role, SourceError> {
        match self.run(self.get_args(resource, Some(name), namespace)).await? {
            Fetch::Found(json) => decode_role(&json, kind),
            Fetch::Missing(_) => Err(SourceError::not_found(kind.as_str(), namespace, name)),
        }
    }
}

fn truncate_stderr(mut stderr: String) -> String {
    if stderr.len() > MAX_STDERR_LENGTH {
        let mut cut = MAX_STDERR_LENGTH;
        while !stderr.is_char_boundary(cut) {
            cut -= 1;
        }
        stderr.truncate(cut);
        stderr.push_str("... (truncated)");
    }
    stderr
}

#[async_trait]
impl RbacSource for KubectlSource {
    async fn list_cluster_role_bindings(&self) -> Result<Vec<Binding>, SourceError> {
        self.list("clusterrolebindings.rbac.authorization.k8s.io", None, BindingKind::ClusterRoleBinding)
            .await
    }

    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<Binding>, SourceError> {
        self.list("rolebindings.rbac.authorization.k8s.io", Some(namespace), BindingKind::RoleBinding)
            .await
    }

    async fn get_cluster_role(&self, name: &str) -> Result<Role, SourceError> {
        self.get("clusterroles.rbac.authorization.k8s.io", name, None, RoleKind::ClusterRole)
            .await
    }

    async fn get_role(&self, namespace: &str, name: &str) -> Result<Role, SourceError> {
        self.get("roles.rbac.authorization.k8s.io", name, Some(namespace), RoleKind::Role)
            .await
    }

    fn source_name(&self) -> &str {
        "kubectl"
    }
}
