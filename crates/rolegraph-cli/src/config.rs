//! Settings for the rolegraph CLI.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`ROLEGRAPH__` prefix, `__` separator)
//! 2. Config file (`rolegraph.toml`, optional)
//! 3. Defaults

use serde::Deserialize;

use rolegraph_core::GraphNaming;
use rolegraph_store::{GraphConfig, SyncOptions};

use crate::error::Result;

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Neo4j connection.
    #[serde(default)]
    pub neo4j: GraphConfig,

    /// Collection and graph names.
    #[serde(default)]
    pub graph: GraphNaming,

    /// Write behaviour.
    #[serde(default)]
    pub sync: SyncOptions,
}

/// Load settings from `<file_prefix>.toml` (if present) and the environment.
pub fn load_settings(file_prefix: &str) -> Result<Settings> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("ROLEGRAPH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegraph_core::EdgePolicy;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let settings = load_settings(prefix.to_str().unwrap()).unwrap();

        assert_eq!(settings.graph, GraphNaming::default());
        assert_eq!(settings.sync.edge_policy, EdgePolicy::SkipExisting);
        assert_eq!(settings.neo4j.uri, "bolt://localhost:7687");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rolegraph.toml"),
            r#"
            [neo4j]
            uri = "bolt://graph.internal:7687"
            fetch_size = 64

            [graph]
            graph_name = "acl"
            role_collection = "acl_roles"

            [sync]
            edge_policy = "append"
            "#,
        )
        .unwrap();

        let prefix = dir.path().join("rolegraph");
        let settings = load_settings(prefix.to_str().unwrap()).unwrap();

        assert_eq!(settings.neo4j.uri, "bolt://graph.internal:7687");
        assert_eq!(settings.neo4j.fetch_size, 64);
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.graph.graph_name, "acl");
        assert_eq!(settings.graph.role_collection, "acl_roles");
        assert_eq!(settings.graph.permission_collection, "gorbac_permissions");
        assert_eq!(settings.sync.edge_policy, EdgePolicy::Append);
    }
}
