//! The store boundary: the primitives the schema, sync, and load paths need.
//!
//! Vertices are addressed by `(collection, key)`; edge endpoints by the
//! `collection/key` handle of the vertex.

use async_trait::async_trait;

use crate::client::{GraphClient, GraphError};
use crate::queries::Neo4jCursor;

/// Physical kind of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Vertex,
    Edge,
}

/// A graph with one edge definition: `edge_collection` links vertices of
/// `from_collection` to vertices of `to_collection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDefinition {
    pub name: String,
    pub edge_collection: String,
    pub from_collection: String,
    pub to_collection: String,
}

/// A parameterless traversal.
///
/// `text` is what a query-capable backend executes. The collection names
/// describe the same traversal structurally for backends that evaluate it
/// without a query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalQuery {
    pub text: String,
    pub start_collection: String,
    pub edge_collection: String,
    pub target_collection: String,
}

/// One traversal row: a role key and the permission keys it reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalRow {
    pub role: String,
    pub permissions: Vec<String>,
}

/// A graph-capable document store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, GraphError>;

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), GraphError>;

    async fn graph_exists(&self, name: &str) -> Result<bool, GraphError>;

    /// Create a graph and its edge collection.
    async fn create_graph(&self, graph: &GraphDefinition) -> Result<(), GraphError>;

    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, GraphError>;

    /// Create a keyed document. Fails with [`GraphError::Duplicate`] if the
    /// key is taken.
    async fn create_document(&self, collection: &str, key: &str) -> Result<(), GraphError>;

    async fn edge_exists(&self, collection: &str, from: &str, to: &str)
        -> Result<bool, GraphError>;

    /// Create an edge between two existing vertices.
    async fn create_edge(&self, collection: &str, from: &str, to: &str) -> Result<(), GraphError>;

    /// Start a read-only traversal. The returned cursor must be closed.
    async fn traverse(&self, query: &TraversalQuery) -> Result<Box<dyn RowCursor>, GraphError>;
}

/// Forward-only, non-restartable sequence of traversal rows.
#[async_trait]
pub trait RowCursor: Send {
    /// Advance to the next row; `None` once the result is exhausted.
    async fn next_row(&mut self) -> Result<Option<TraversalRow>, GraphError>;

    /// Release the server-side resources held by the cursor.
    async fn close(self: Box<Self>);
}

// ── Neo4j backend ────────────────────────────────────────────────

#[async_trait]
impl GraphStore for GraphClient {
    async fn collection_exists(&self, name: &str) -> Result<bool, GraphError> {
        self.collection_registered(name).await
    }

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), GraphError> {
        match kind {
            CollectionKind::Vertex => self.create_vertex_collection(name).await,
            // Relationship types need no schema object in Neo4j.
            CollectionKind::Edge => Ok(()),
        }
    }

    async fn graph_exists(&self, name: &str) -> Result<bool, GraphError> {
        self.graph_registered(name).await
    }

    async fn create_graph(&self, graph: &GraphDefinition) -> Result<(), GraphError> {
        self.create_graph_definition(graph).await
    }

    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, GraphError> {
        self.keyed_node_exists(collection, key).await
    }

    async fn create_document(&self, collection: &str, key: &str) -> Result<(), GraphError> {
        self.create_keyed_node(collection, key).await
    }

    async fn edge_exists(
        &self,
        collection: &str,
        from: &str,
        to: &str,
    ) -> Result<bool, GraphError> {
        self.relationship_exists(collection, from, to).await
    }

    async fn create_edge(&self, collection: &str, from: &str, to: &str) -> Result<(), GraphError> {
        self.create_relationship(collection, from, to).await
    }

    async fn traverse(&self, query: &TraversalQuery) -> Result<Box<dyn RowCursor>, GraphError> {
        let cursor: Neo4jCursor = self.open_traversal(&query.text).await?;
        Ok(Box::new(cursor))
    }
}
