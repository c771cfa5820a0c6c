//! Synchronization: write an in-memory role set into the graph.
//!
//! Vertices are upserted by key (existence check, then create); a duplicate
//! error on create means a concurrent writer got there first and is not
//! fatal. Edges follow the configured [`EdgePolicy`]. The first failing
//! store call aborts the run; writes already made are kept.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use rolegraph_core::{EdgePolicy, GraphNaming, PermissionId, RoleSet};

use crate::cancel::CancelScope;
use crate::error::{Result, SyncError};
use crate::store::GraphStore;

/// Write options, loaded from the `[sync]` config section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SyncOptions {
    #[serde(default)]
    pub edge_policy: EdgePolicy,
}

/// What a synchronization run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Roles walked.
    pub roles: usize,
    pub roles_created: usize,
    pub permissions_created: usize,
    pub edges_created: usize,
    /// Edges left alone because they already existed.
    pub edges_skipped: usize,
    /// Vertex creates that lost a race with another writer.
    pub duplicates_tolerated: usize,
}

enum Upsert {
    Created,
    Existing,
    Raced,
}

/// Make the store reflect `roles`.
///
/// A role without permissions still gets its vertex.
pub async fn synchronize<S>(
    store: &S,
    naming: &GraphNaming,
    options: SyncOptions,
    roles: &RoleSet,
    scope: &CancelScope,
) -> Result<SyncReport>
where
    S: GraphStore + ?Sized,
{
    naming.validate()?;
    scope.check()?;

    let mut report = SyncReport {
        roles: roles.len(),
        ..Default::default()
    };
    // Permission vertices already upserted during this run.
    let mut seen: HashSet<&PermissionId> = HashSet::new();

    for role in roles {
        let role_key = role.id.as_str();
        match upsert_vertex(store, &naming.role_collection, role_key, scope).await? {
            Upsert::Created => report.roles_created += 1,
            Upsert::Raced => report.duplicates_tolerated += 1,
            Upsert::Existing => {}
        }

        let from = naming.role_handle(role_key);
        for permission in &role.permissions {
            let perm_key = permission.as_str();
            if seen.insert(permission) {
                match upsert_vertex(store, &naming.permission_collection, perm_key, scope).await? {
                    Upsert::Created => report.permissions_created += 1,
                    Upsert::Raced => report.duplicates_tolerated += 1,
                    Upsert::Existing => {}
                }
            }

            let to = naming.permission_handle(perm_key);
            if options.edge_policy == EdgePolicy::SkipExisting
                && scope
                    .run(store.edge_exists(&naming.edge_collection, &from, &to))
                    .await?
            {
                report.edges_skipped += 1;
                continue;
            }

            scope
                .run(store.create_edge(&naming.edge_collection, &from, &to))
                .await?;
            tracing::debug!(role = role_key, permission = perm_key, "Created grant edge");
            report.edges_created += 1;
        }
    }

    tracing::info!(
        graph = %naming.graph_name,
        roles = report.roles,
        roles_created = report.roles_created,
        permissions_created = report.permissions_created,
        edges_created = report.edges_created,
        edges_skipped = report.edges_skipped,
        "Synchronized role set"
    );
    Ok(report)
}

async fn upsert_vertex<S>(
    store: &S,
    collection: &str,
    key: &str,
    scope: &CancelScope,
) -> Result<Upsert>
where
    S: GraphStore + ?Sized,
{
    if scope.run(store.document_exists(collection, key)).await? {
        return Ok(Upsert::Existing);
    }

    match scope.run(store.create_document(collection, key)).await {
        Ok(()) => {
            tracing::debug!(collection, key, "Created vertex");
            Ok(Upsert::Created)
        }
        Err(SyncError::Store(e)) if e.is_duplicate() => {
            tracing::warn!(collection, key, "Vertex created concurrently, continuing");
            Ok(Upsert::Raced)
        }
        Err(e) => Err(e),
    }
}
