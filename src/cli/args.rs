use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::core::{RbacError, RbacResult, ResolverConfig};
use crate::logging::LoggingConfig;
use crate::output::OutputFormat;
use crate::permissions::PermissionRequest;
use crate::source::KubectlConfig;
use crate::subject::{parse_subject, Subject};

/// Optional leading word accepted for kubectl plugin compatibility
const CAN_I: &str = "can-i";

#[derive(Debug, Parser)]
#[command(
    name = "rbac-why",
    about = "Explain which RBAC bindings and rules allow a subject to perform an action",
    version,
    after_help = "Examples:\n  rbac-why --as system:serviceaccount:default:my-sa get pods -n default\n  rbac-why can-i --as jane create deployments.apps -n dev -o dot\n  rbac-why --as system:serviceaccount:default:my-sa --show-risky -n default"
)]
pub struct Cli {
    #[arg(
        value_name = "VERB RESOURCE",
        num_args = 0..=3,
        help = "Verb and resource[.group][/subresource], optionally preceded by 'can-i'"
    )]
    pub args: Vec<String>,

    #[arg(
        long = "as",
        value_name = "SUBJECT",
        help = "Subject to check: a user name, a group (system:...) or system:serviceaccount:<namespace>:<name>"
    )]
    pub as_subject: String,

    #[arg(
        long = "as-group",
        visible_alias = "group",
        value_name = "GROUP",
        action = ArgAction::Append,
        help = "Additional group the subject belongs to (repeatable)"
    )]
    pub groups: Vec<String>,

    #[arg(short = 'n', long, help = "Namespace to check; omit for a cluster-scoped check")]
    pub namespace: Option<String>,

    #[arg(long = "resource-name", help = "Specific object name to check")]
    pub resource_name: Option<String>,

    #[arg(
        short = 'o',
        long,
        default_value = "text",
        help = "Output format: text, json, yaml, dot, mermaid"
    )]
    pub output: OutputFormat,

    #[arg(
        long = "show-risky",
        help = "List risky permissions reachable by the subject instead of checking one action"
    )]
    pub show_risky: bool,

    #[arg(
        long,
        env = "RBAC_WHY_SNAPSHOT",
        value_name = "FILE",
        help = "Read RBAC objects from a JSON List (kubectl get clusterroles,clusterrolebindings,roles,rolebindings -A -o json) instead of the cluster"
    )]
    pub snapshot: Option<PathBuf>,

    #[arg(long, env = "RBAC_WHY_KUBECTL", default_value = "kubectl", help = "kubectl executable")]
    pub kubectl: String,

    #[arg(long, value_name = "FILE", help = "Path to the kubeconfig file passed to kubectl")]
    pub kubeconfig: Option<PathBuf>,

    #[arg(long, help = "Kubeconfig context passed to kubectl")]
    pub context: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        default_value_t = 30_000,
        help = "Timeout for each kubectl invocation in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "call-timeout-ms",
        help = "Abort the whole check if a single data source call takes longer than this"
    )]
    pub call_timeout_ms: Option<u64>,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short, long, help = "Enable debug logging on stderr")]
    pub verbose: bool,

    #[arg(long = "log-json", help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long = "log-file", value_name = "FILE", help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Positional arguments with a leading `can-i` removed
    fn action_args(&self) -> &[String] {
        match self.args.split_first() {
            Some((first, rest)) if first == CAN_I => rest,
            _ => &self.args,
        }
    }

    /// Namespace flag, with an empty value meaning cluster scope
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// The subject named by `--as`, with any `--as-group` memberships
    pub fn subject(&self) -> RbacResult<Subject> {
        Ok(parse_subject(&self.as_subject)?.with_groups(self.groups.iter().cloned()))
    }

    /// The permission being checked
    pub fn permission_request(&self) -> RbacResult<PermissionRequest> {
        let (verb, resource) = match self.action_args() {
            [verb, resource] => (verb, resource),
            args => {
                return Err(RbacError::InvalidRequest(format!(
                    "requires exactly 2 arguments: VERB RESOURCE (got {})",
                    args.len()
                )));
            }
        };

        let mut request = PermissionRequest::parse_resource(verb.as_str(), resource)?;
        if let Some(name) = &self.resource_name {
            request = request.with_resource_name(name.as_str());
        }
        if let Some(namespace) = self.namespace() {
            request = request.in_namespace(namespace);
        }
        Ok(request)
    }

    pub fn kubectl_config(&self) -> KubectlConfig {
        let mut config = KubectlConfig::new()
            .with_binary(self.kubectl.as_str())
            .with_timeout(self.request_timeout_ms);
        if let Some(path) = &self.kubeconfig {
            config = config.with_kubeconfig(path.clone());
        }
        if let Some(context) = &self.context {
            config = config.with_context(context.as_str());
        }
        config
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        match self.call_timeout_ms {
            Some(ms) => ResolverConfig::new().with_call_timeout(ms),
            None => ResolverConfig::new(),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::new()
            .verbose(self.verbose)
            .with_json(self.log_json);
        if let Some(path) = &self.log_file {
            config = config.with_file(path.clone());
        }
        config
    }
}
