//! Neo4j connection management and shared graph client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;

/// Errors from graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("Document already exists: {collection}/{key}")]
    Duplicate { collection: String, key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Fault raised on purpose by `MemoryStore` knobs; the Neo4j client
    /// never produces it.
    #[error("Injected store failure: {0}")]
    Injected(String),
}

impl GraphError {
    /// True for the "already exists" class, raised when a concurrent writer
    /// created the same document, collection, or graph first.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section of `rolegraph.toml` or
/// `ROLEGRAPH__NEO4J__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "rolegraph-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Implements [`GraphStore`](crate::store::GraphStore) by mapping vertex
/// collections to labels guarded by a uniqueness constraint on `key`, edge
/// collections to relationship types, and graphs to `RoleGraph` metadata
/// nodes. Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }

    /// Execute a query that returns a single `cnt` column.
    pub async fn count(&self, query: Query) -> Result<i64, GraphError> {
        match self.query_one(query).await? {
            Some(row) => row
                .get::<i64>("cnt")
                .map_err(|e| GraphError::Serialization(format!("Failed to read count: {e}"))),
            None => Ok(0),
        }
    }
}

/// Quote a label or relationship type for splicing into Cypher.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Split a `collection/key` handle.
pub(crate) fn split_handle(handle: &str) -> Result<(&str, &str), GraphError> {
    handle
        .split_once('/')
        .filter(|(c, k)| !c.is_empty() && !k.is_empty())
        .ok_or_else(|| GraphError::Serialization(format!("Malformed document handle: {handle:?}")))
}

/// Server error codes and messages meaning "someone else created it first".
const DUPLICATE_MARKERS: &[&str] = &[
    "ConstraintValidationFailed",
    "EquivalentSchemaRuleAlreadyExists",
    "ConstraintAlreadyExists",
    "already exists",
];

/// Map a Neo4j error to `Duplicate` when it belongs to the "already exists" class.
pub(crate) fn classify(err: neo4rs::Error, collection: &str, key: &str) -> GraphError {
    let msg = err.to_string();
    if DUPLICATE_MARKERS.iter().any(|m| msg.contains(m)) {
        GraphError::Duplicate {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    } else {
        GraphError::Query(err)
    }
}
