//! Permission resolution
//!
//! Explains why a subject holds a permission by tracing every chain
//! from the subject through a binding and a role to the rule that matches:
//!
//! - **types**: the RBAC object model, requests and results
//! - **matcher**: pure predicates over rules and binding subjects
//! - **resolver**: walks a data source and assembles grant chains
//!
//! ## Example
//!
//! ```rust,ignore
//! use rbac_why::permissions::{PermissionRequest, Resolver};
//! use rbac_why::source::SnapshotSource;
//! use rbac_why::subject::parse_subject;
//!
//! let resolver = Resolver::new(SnapshotSource::load("rbac.json")?);
//! let subject = parse_subject("system:serviceaccount:default:test-sa")?;
//! let request = PermissionRequest::parse_resource("get", "pods")?.in_namespace("default");
//!
//! let result = resolver.resolve_permission(&subject, &request).await?;
//! for grant in &result.grants {
//!     println!("{} -> {} ({})", grant.binding, grant.role, grant.scope);
//! }
//! ```

pub mod matcher;
pub mod resolver;
mod types;

pub use matcher::rule_matches;
pub use resolver::Resolver;
pub use types::{
    Binding, BindingInfo, BindingKind, BindingSubject, Grant, GrantScope, PermissionRequest,
    PermissionResult, PolicyRule, Role, RoleInfo, RoleKind, RoleRef, WILDCARD,
};
