//! Read operations against Neo4j.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use neo4rs::{query, Row};

use crate::client::{quote_ident, split_handle, GraphClient, GraphError};
use crate::mutations::{key_constraint, GRAPH_LABEL};
use crate::store::{RowCursor, TraversalRow};

impl GraphClient {
    // ── Schema Lookups ───────────────────────────────────────────

    /// A vertex collection exists once its key constraint does; an edge
    /// collection exists once a graph names it.
    pub async fn collection_registered(&self, name: &str) -> Result<bool, GraphError> {
        let q = query(
            "SHOW CONSTRAINTS YIELD name
             WHERE name = $name
             RETURN count(name) AS cnt",
        )
        .param("name", key_constraint(name));
        if self.count(q).await? > 0 {
            return Ok(true);
        }

        let cypher = format!(
            "MATCH (g:{GRAPH_LABEL} {{edge_collection: $name}})
             RETURN count(g) AS cnt"
        );
        let q = query(&cypher).param("name", name.to_string());
        Ok(self.count(q).await? > 0)
    }

    pub async fn graph_registered(&self, name: &str) -> Result<bool, GraphError> {
        let cypher = format!(
            "MATCH (g:{GRAPH_LABEL} {{name: $name}})
             RETURN count(g) AS cnt"
        );
        let q = query(&cypher).param("name", name.to_string());
        Ok(self.count(q).await? > 0)
    }

    // ── Document Lookups ─────────────────────────────────────────

    pub async fn keyed_node_exists(&self, collection: &str, key: &str) -> Result<bool, GraphError> {
        let cypher = format!(
            "MATCH (n:{} {{key: $key}})
             RETURN count(n) AS cnt",
            quote_ident(collection)
        );
        let q = query(&cypher).param("key", key.to_string());
        Ok(self.count(q).await? > 0)
    }

    pub async fn relationship_exists(
        &self,
        collection: &str,
        from: &str,
        to: &str,
    ) -> Result<bool, GraphError> {
        let (from_label, from_key) = split_handle(from)?;
        let (to_label, to_key) = split_handle(to)?;

        let cypher = format!(
            "MATCH (:{from_label} {{key: $from}})-[r:{rel}]->(:{to_label} {{key: $to}})
             RETURN count(r) AS cnt",
            from_label = quote_ident(from_label),
            to_label = quote_ident(to_label),
            rel = quote_ident(collection),
        );
        let q = query(&cypher)
            .param("from", from_key.to_string())
            .param("to", to_key.to_string());
        Ok(self.count(q).await? > 0)
    }

    // ── Traversal ────────────────────────────────────────────────

    /// Run a parameterless traversal returning `r` (role key) and `p`
    /// (list of permission keys) columns.
    pub async fn open_traversal(&self, text: &str) -> Result<Neo4jCursor, GraphError> {
        let rows = self.inner().execute(query(text)).await?;
        Ok(Neo4jCursor::new(
            TryStreamExt::into_stream(rows.into_stream()).boxed(),
        ))
    }
}

/// Streaming cursor over a Neo4j traversal result.
///
/// Rows are pulled from the server in `fetch_size` batches; dropping the
/// stream returns its connection to the pool.
pub struct Neo4jCursor {
    stream: BoxStream<'static, Result<Row, neo4rs::Error>>,
}

impl Neo4jCursor {
    pub fn new(stream: BoxStream<'static, Result<Row, neo4rs::Error>>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl RowCursor for Neo4jCursor {
    async fn next_row(&mut self) -> Result<Option<TraversalRow>, GraphError> {
        let Some(row) = self.stream.try_next().await? else {
            return Ok(None);
        };

        let role: String = row
            .get("r")
            .map_err(|e| GraphError::Serialization(format!("Failed to read role key: {e}")))?;
        let permissions: Vec<String> = row.get("p").map_err(|e| {
            GraphError::Serialization(format!("Failed to read permission keys: {e}"))
        })?;

        Ok(Some(TraversalRow { role, permissions }))
    }

    async fn close(self: Box<Self>) {
        drop(self.stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{BoltList, BoltType};

    fn row(role: &str, permissions: Vec<&str>) -> Row {
        Row::new(
            BoltList::from(vec![BoltType::from("r"), BoltType::from("p")]),
            BoltList::from(vec![BoltType::from(role), BoltType::from(permissions)]),
        )
    }

    #[tokio::test]
    async fn test_cursor_decodes_rows_in_order() {
        let rows = vec![Ok(row("foo", vec!["bar", "quux"])), Ok(row("lurker", vec![]))];
        let mut cursor = Neo4jCursor::new(futures::stream::iter(rows).boxed());

        let first = cursor.next_row().await.unwrap().unwrap();
        assert_eq!(first.role, "foo");
        assert_eq!(first.permissions, vec!["bar", "quux"]);

        let second = cursor.next_row().await.unwrap().unwrap();
        assert_eq!(second.role, "lurker");
        assert!(second.permissions.is_empty());

        assert!(cursor.next_row().await.unwrap().is_none());
        Box::new(cursor).close().await;
    }

    #[tokio::test]
    async fn test_cursor_rejects_row_without_role_column() {
        let bad = Row::new(
            BoltList::from(vec![BoltType::from("p")]),
            BoltList::from(vec![BoltType::from(vec!["bar"])]),
        );
        let mut cursor = Neo4jCursor::new(futures::stream::iter(vec![Ok(bad)]).boxed());

        let err = cursor.next_row().await.unwrap_err();
        assert!(matches!(err, GraphError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_cursor_surfaces_driver_errors() {
        let rows: Vec<Result<Row, neo4rs::Error>> = vec![Err(neo4rs::Error::ConnectionError)];
        let mut cursor = Neo4jCursor::new(futures::stream::iter(rows).boxed());

        let err = cursor.next_row().await.unwrap_err();
        assert!(matches!(err, GraphError::Query(_)));
    }
}
