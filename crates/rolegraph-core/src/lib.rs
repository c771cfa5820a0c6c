//! rolegraph-core: the in-memory RBAC model shared by every rolegraph component.
//!
//! This crate provides:
//! - Identifier types (`RoleId`, `PermissionId`) validated for use as store keys
//! - `Role` and `RoleSet`, the aggregate saved to and loaded from the graph
//! - Grant evaluation over a role set (`any_granted`, `all_granted`)
//! - Graph naming and edge policy configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{EdgePolicy, GraphNaming};
pub use error::RbacError;
pub use types::{PermissionId, Role, RoleId, RoleSet};
