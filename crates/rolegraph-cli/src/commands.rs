//! Subcommand implementations, generic over the graph store.

use std::path::Path;

use rolegraph_core::RoleSet;
use rolegraph_store::{
    ensure_schema, load, synchronize, CancelScope, GraphClient, GraphStore, SchemaReport,
    SyncReport,
};

use crate::config::Settings;
use crate::error::Result;
use crate::input::read_role_set;

pub async fn connect(settings: &Settings) -> Result<GraphClient> {
    Ok(GraphClient::connect(&settings.neo4j).await?)
}

pub async fn schema<S>(store: &S, settings: &Settings, scope: &CancelScope) -> Result<SchemaReport>
where
    S: GraphStore + ?Sized,
{
    Ok(ensure_schema(store, &settings.graph, scope).await?)
}

/// Read a role set file, make sure the schema exists, then synchronize.
pub async fn save<S>(
    store: &S,
    settings: &Settings,
    input: &Path,
    scope: &CancelScope,
) -> Result<SyncReport>
where
    S: GraphStore + ?Sized,
{
    let roles = read_role_set(input)?;
    tracing::info!(path = %input.display(), roles = roles.len(), "Read role set");

    ensure_schema(store, &settings.graph, scope).await?;
    Ok(synchronize(store, &settings.graph, settings.sync, &roles, scope).await?)
}

pub async fn load_roles<S>(store: &S, settings: &Settings, scope: &CancelScope) -> Result<RoleSet>
where
    S: GraphStore + ?Sized,
{
    Ok(load(store, &settings.graph, scope).await?)
}
