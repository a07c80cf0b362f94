//! Risk analysis
//!
//! Flags reachable rules that match known dangerous capabilities (secret
//! reads, pod exec, impersonation, RBAC mutation and similar). Input is the
//! grant inventory from `Resolver::resolve_all_permissions`.

pub mod catalog;
pub mod classifier;

pub use catalog::{RiskSignature, Severity, CATALOG};
pub use classifier::{by_severity, classify, matches_signature, RiskyPermission};
