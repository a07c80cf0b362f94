//! Explain Kubernetes RBAC decisions
//!
//! Given a subject and a permission, finds every binding → role → rule chain
//! that grants it, and flags risky permissions a subject can reach.

pub mod core;
pub mod permissions;
pub mod risk;
pub mod source;
pub mod subject;

// Front end
pub mod cli;
pub mod logging;
pub mod output;

pub use crate::core::{RbacError, RbacResult, ResolverConfig};
pub use crate::permissions::{Grant, GrantScope, PermissionRequest, PermissionResult, Resolver};
pub use crate::subject::{parse_subject, Subject};
