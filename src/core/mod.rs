//! Core types shared across the crate
//!
//! - `RbacError` / `RbacResult` - Error types
//! - `ResolverConfig` - Resolver tuning

pub mod config;
pub mod error;

pub use config::ResolverConfig;
pub use error::{RbacError, RbacResult};
