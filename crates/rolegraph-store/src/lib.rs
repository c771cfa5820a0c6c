//! rolegraph-store: persists an RBAC role set into a graph store and reads it back.
//!
//! Three operations make up the crate's surface:
//! - [`ensure_schema`] creates the role and permission vertex collections and
//!   the grant graph if they are missing
//! - [`synchronize`] upserts every role and permission vertex and writes one
//!   grant edge per (role, permission) pair
//! - [`load`] runs the fixed traversal and folds its rows into a fresh `RoleSet`
//!
//! Every store call goes through a [`CancelScope`], so callers can cancel or
//! bound any operation with a deadline.

pub mod cancel;
pub mod client;
pub mod error;
pub mod load;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod store;
pub mod sync;

pub use cancel::CancelScope;
pub use client::{GraphClient, GraphConfig, GraphError};
pub use error::SyncError;
pub use load::load;
pub use memory::MemoryStore;
pub use schema::{ensure_schema, SchemaReport};
pub use store::{CollectionKind, GraphDefinition, GraphStore, RowCursor, TraversalQuery, TraversalRow};
pub use sync::{synchronize, SyncOptions, SyncReport};
