//! Schema provisioning: the role and permission vertex collections and the
//! grant graph.
//!
//! Each artefact is checked then created. Another process may create it in
//! between; the resulting duplicate error is tolerated.

use rolegraph_core::GraphNaming;

use crate::cancel::CancelScope;
use crate::error::{Result, SyncError};
use crate::store::{CollectionKind, GraphDefinition, GraphStore};

/// Which schema artefacts a call created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created_roles: bool,
    pub created_permissions: bool,
    pub created_graph: bool,
}

impl SchemaReport {
    pub fn created_any(&self) -> bool {
        self.created_roles || self.created_permissions || self.created_graph
    }
}

/// The graph definition described by `naming`.
pub fn graph_definition(naming: &GraphNaming) -> GraphDefinition {
    GraphDefinition {
        name: naming.graph_name.clone(),
        edge_collection: naming.edge_collection.clone(),
        from_collection: naming.role_collection.clone(),
        to_collection: naming.permission_collection.clone(),
    }
}

/// Create whichever of the two vertex collections and the graph are missing.
pub async fn ensure_schema<S>(
    store: &S,
    naming: &GraphNaming,
    scope: &CancelScope,
) -> Result<SchemaReport>
where
    S: GraphStore + ?Sized,
{
    naming.validate()?;
    scope.check()?;

    let report = SchemaReport {
        created_roles: ensure_vertex_collection(store, &naming.role_collection, scope).await?,
        created_permissions: ensure_vertex_collection(store, &naming.permission_collection, scope)
            .await?,
        created_graph: ensure_graph(store, naming, scope).await?,
    };

    if report.created_any() {
        tracing::info!(
            graph = %naming.graph_name,
            created_roles = report.created_roles,
            created_permissions = report.created_permissions,
            created_graph = report.created_graph,
            "Schema provisioned"
        );
    } else {
        tracing::debug!(graph = %naming.graph_name, "Schema already present");
    }
    Ok(report)
}

async fn ensure_vertex_collection<S>(store: &S, name: &str, scope: &CancelScope) -> Result<bool>
where
    S: GraphStore + ?Sized,
{
    if scope.run(store.collection_exists(name)).await? {
        return Ok(false);
    }
    tolerate_duplicate(
        scope
            .run(store.create_collection(name, CollectionKind::Vertex))
            .await,
        name,
    )
}

async fn ensure_graph<S>(store: &S, naming: &GraphNaming, scope: &CancelScope) -> Result<bool>
where
    S: GraphStore + ?Sized,
{
    if scope.run(store.graph_exists(&naming.graph_name)).await? {
        return Ok(false);
    }
    let definition = graph_definition(naming);
    tolerate_duplicate(
        scope.run(store.create_graph(&definition)).await,
        &naming.graph_name,
    )
}

/// Ok(true) if we created it, Ok(false) if a concurrent caller beat us to it.
fn tolerate_duplicate(res: Result<()>, name: &str) -> Result<bool> {
    match res {
        Ok(()) => Ok(true),
        Err(SyncError::Store(e)) if e.is_duplicate() => {
            tracing::warn!(object = name, "Schema object created concurrently, continuing");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn creates_everything_on_empty_store() {
        let store = MemoryStore::new();
        let naming = GraphNaming::default();

        let report = ensure_schema(&store, &naming, &CancelScope::new())
            .await
            .unwrap();

        assert!(report.created_roles && report.created_permissions && report.created_graph);
        assert_eq!(
            store.collection_names(),
            vec![
                "gorbac_permissions".to_string(),
                "gorbac_roles".to_string(),
                "gorbac_roles_permissions".to_string(),
            ]
        );
        assert_eq!(store.graph("gorbac"), Some(graph_definition(&naming)));
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let store = MemoryStore::new();
        let naming = GraphNaming::default();
        let scope = CancelScope::new();

        ensure_schema(&store, &naming, &scope).await.unwrap();
        let report = ensure_schema(&store, &naming, &scope).await.unwrap();

        assert_eq!(report, SchemaReport::default());
        assert_eq!(store.collection_names().len(), 3);
    }

    #[tokio::test]
    async fn creates_only_missing_pieces() {
        let store = MemoryStore::new();
        let naming = GraphNaming::default();
        store
            .create_collection(&naming.role_collection, CollectionKind::Vertex)
            .await
            .unwrap();

        let report = ensure_schema(&store, &naming, &CancelScope::new())
            .await
            .unwrap();

        assert!(!report.created_roles);
        assert!(report.created_permissions);
        assert!(report.created_graph);
    }

    #[tokio::test]
    async fn concurrent_creation_is_tolerated() {
        let store = MemoryStore::new();
        let naming = GraphNaming::default();
        ensure_schema(&store, &naming, &CancelScope::new())
            .await
            .unwrap();

        // Existence checks now miss, so every create hits "already exists".
        let racing = store.clone().hide_existing();
        let report = ensure_schema(&racing, &naming, &CancelScope::new())
            .await
            .unwrap();

        assert!(!report.created_any());
        assert_eq!(store.collection_names().len(), 3);
    }

    #[tokio::test]
    async fn invalid_naming_is_a_shape_error() {
        let store = MemoryStore::new();
        let naming = GraphNaming {
            role_collection: "roles; DROP".to_string(),
            ..Default::default()
        };

        let err = ensure_schema(&store, &naming, &CancelScope::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Shape(_)));
        assert!(store.collection_names().is_empty());
    }

    #[tokio::test]
    async fn cancelled_scope_creates_nothing() {
        let store = MemoryStore::new();
        let scope = CancelScope::new();
        scope.cancel();

        let err = ensure_schema(&store, &GraphNaming::default(), &scope)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Cancelled));
        assert!(store.collection_names().is_empty());
    }
}
