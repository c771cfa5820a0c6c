//! Write operations against Neo4j.
//!
//! Writes use plain CREATE so that a concurrent writer's earlier insert
//! surfaces as a constraint violation, mapped to `GraphError::Duplicate`.

use neo4rs::query;

use crate::client::{classify, quote_ident, split_handle, GraphClient, GraphError};
use crate::store::GraphDefinition;

/// Label of the metadata node describing a graph.
pub(crate) const GRAPH_LABEL: &str = "RoleGraph";

const GRAPH_NAME_CONSTRAINT: &str = "rolegraph_graph_name";

/// Name of the uniqueness constraint backing a vertex collection.
pub(crate) fn key_constraint(collection: &str) -> String {
    format!("{collection}_key")
}

/// Result of creating a schema rule that several graphs share. Another
/// provisioner creating it first is not an error.
fn shared_schema_rule(res: Result<(), neo4rs::Error>) -> Result<(), GraphError> {
    match res {
        Ok(()) => Ok(()),
        Err(e) => match classify(e, GRAPH_LABEL, GRAPH_NAME_CONSTRAINT) {
            GraphError::Duplicate { .. } => {
                tracing::debug!(
                    constraint = GRAPH_NAME_CONSTRAINT,
                    "Schema rule created concurrently, continuing"
                );
                Ok(())
            }
            other => Err(other),
        },
    }
}

impl GraphClient {
    // ── Schema ───────────────────────────────────────────────────

    /// Register a vertex collection: a uniqueness constraint on `key` for its label.
    pub async fn create_vertex_collection(&self, name: &str) -> Result<(), GraphError> {
        let cypher = format!(
            "CREATE CONSTRAINT {constraint} FOR (n:{label}) REQUIRE n.key IS UNIQUE",
            constraint = quote_ident(&key_constraint(name)),
            label = quote_ident(name),
        );

        self.inner()
            .run(query(&cypher))
            .await
            .map_err(|e| classify(e, name, ""))?;

        tracing::info!(collection = name, "Created vertex collection");
        Ok(())
    }

    /// Store a graph's edge definition as a `RoleGraph` node.
    pub async fn create_graph_definition(&self, graph: &GraphDefinition) -> Result<(), GraphError> {
        let constraint = format!(
            "CREATE CONSTRAINT {GRAPH_NAME_CONSTRAINT} IF NOT EXISTS
             FOR (g:{GRAPH_LABEL}) REQUIRE g.name IS UNIQUE"
        );
        // The graph node CREATE below still decides who owns the graph.
        shared_schema_rule(self.inner().run(query(&constraint)).await)?;

        let cypher = format!(
            "CREATE (g:{GRAPH_LABEL} {{
               name: $name, edge_collection: $edge_collection,
               from_collection: $from_collection, to_collection: $to_collection
             }})"
        );
        let q = query(&cypher)
            .param("name", graph.name.clone())
            .param("edge_collection", graph.edge_collection.clone())
            .param("from_collection", graph.from_collection.clone())
            .param("to_collection", graph.to_collection.clone());

        self.inner()
            .run(q)
            .await
            .map_err(|e| classify(e, GRAPH_LABEL, &graph.name))?;

        tracing::info!(
            graph = %graph.name,
            edges = %graph.edge_collection,
            "Created graph"
        );
        Ok(())
    }

    // ── Documents ────────────────────────────────────────────────

    /// Create a node carrying only its key.
    pub async fn create_keyed_node(&self, collection: &str, key: &str) -> Result<(), GraphError> {
        let cypher = format!("CREATE (n:{} {{key: $key}})", quote_ident(collection));
        let q = query(&cypher).param("key", key.to_string());

        self.inner()
            .run(q)
            .await
            .map_err(|e| classify(e, collection, key))
    }

    /// Create a relationship of type `collection` between two keyed nodes.
    pub async fn create_relationship(
        &self,
        collection: &str,
        from: &str,
        to: &str,
    ) -> Result<(), GraphError> {
        let (from_label, from_key) = split_handle(from)?;
        let (to_label, to_key) = split_handle(to)?;

        let cypher = format!(
            "MATCH (a:{from_label} {{key: $from}})
             MATCH (b:{to_label} {{key: $to}})
             CREATE (a)-[:{rel}]->(b)
             RETURN count(*) AS cnt",
            from_label = quote_ident(from_label),
            to_label = quote_ident(to_label),
            rel = quote_ident(collection),
        );
        let q = query(&cypher)
            .param("from", from_key.to_string())
            .param("to", to_key.to_string());

        if self.count(q).await? == 0 {
            // One of the endpoints is missing; report whichever it is.
            let (collection, key) = if self.keyed_node_exists(from_label, from_key).await? {
                (to_label, to_key)
            } else {
                (from_label, from_key)
            };
            return Err(GraphError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }
}
