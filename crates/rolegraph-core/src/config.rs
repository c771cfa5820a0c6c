//! Naming and write-policy configuration for the persisted graph.
//!
//! Loaded from the `[graph]` and `[sync]` sections of `rolegraph.toml` or
//! `ROLEGRAPH__GRAPH__*` / `ROLEGRAPH__SYNC__*` environment variables.

use serde::Deserialize;

use crate::error::{RbacError, Result};

/// Names of the collections and graph that hold the RBAC model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphNaming {
    /// Vertex collection for roles.
    #[serde(default = "default_role_collection")]
    pub role_collection: String,

    /// Vertex collection for permissions.
    #[serde(default = "default_permission_collection")]
    pub permission_collection: String,

    /// Edge collection for role -> permission grants.
    #[serde(default = "default_edge_collection")]
    pub edge_collection: String,

    /// Graph holding the single edge definition.
    #[serde(default = "default_graph_name")]
    pub graph_name: String,
}

impl GraphNaming {
    /// Derive a naming set with every name prefixed, e.g. for isolated tests.
    pub fn prefixed(prefix: &str) -> Self {
        let base = Self::default();
        Self {
            role_collection: format!("{prefix}_{}", base.role_collection),
            permission_collection: format!("{prefix}_{}", base.permission_collection),
            edge_collection: format!("{prefix}_{}", base.edge_collection),
            graph_name: format!("{prefix}_{}", base.graph_name),
        }
    }

    /// Names are spliced into query text, so only plain identifiers pass.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("role_collection", &self.role_collection),
            ("permission_collection", &self.permission_collection),
            ("edge_collection", &self.edge_collection),
            ("graph_name", &self.graph_name),
        ] {
            if !is_identifier(value) {
                return Err(RbacError::InvalidName {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Store handle of a role vertex.
    pub fn role_handle(&self, key: &str) -> String {
        format!("{}/{key}", self.role_collection)
    }

    /// Store handle of a permission vertex.
    pub fn permission_handle(&self, key: &str) -> String {
        format!("{}/{key}", self.permission_collection)
    }
}

impl Default for GraphNaming {
    fn default() -> Self {
        Self {
            role_collection: default_role_collection(),
            permission_collection: default_permission_collection(),
            edge_collection: default_edge_collection(),
            graph_name: default_graph_name(),
        }
    }
}

/// How grant edges are written on synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Check for an existing (role, permission) edge and create only if absent.
    #[default]
    SkipExisting,
    /// Always create an edge, accumulating duplicates on repeated saves.
    Append,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_role_collection() -> String {
    "gorbac_roles".to_string()
}

fn default_permission_collection() -> String {
    "gorbac_permissions".to_string()
}

fn default_edge_collection() -> String {
    "gorbac_roles_permissions".to_string()
}

fn default_graph_name() -> String {
    "gorbac".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming() {
        let naming = GraphNaming::default();
        assert_eq!(naming.role_collection, "gorbac_roles");
        assert_eq!(naming.permission_collection, "gorbac_permissions");
        assert_eq!(naming.edge_collection, "gorbac_roles_permissions");
        assert_eq!(naming.graph_name, "gorbac");
        assert!(naming.validate().is_ok());
    }

    #[test]
    fn test_prefixed_naming() {
        let naming = GraphNaming::prefixed("t1");
        assert_eq!(naming.role_collection, "t1_gorbac_roles");
        assert_eq!(naming.graph_name, "t1_gorbac");
        assert_eq!(naming.role_handle("admin"), "t1_gorbac_roles/admin");
    }

    #[test]
    fn test_validate_rejects_injection() {
        let naming = GraphNaming {
            edge_collection: "grants`]->() DETACH DELETE".to_string(),
            ..Default::default()
        };
        let err = naming.validate().unwrap_err();
        assert!(matches!(
            err,
            RbacError::InvalidName {
                field: "edge_collection",
                ..
            }
        ));

        let naming = GraphNaming {
            graph_name: "9lives".to_string(),
            ..Default::default()
        };
        assert!(naming.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let naming: GraphNaming =
            serde_json::from_str(r#"{"graph_name": "acl"}"#).unwrap();
        assert_eq!(naming.graph_name, "acl");
        assert_eq!(naming.role_collection, "gorbac_roles");
    }

    #[test]
    fn test_edge_policy_names() {
        let p: EdgePolicy = serde_json::from_str(r#""append""#).unwrap();
        assert_eq!(p, EdgePolicy::Append);
        assert_eq!(EdgePolicy::default(), EdgePolicy::SkipExisting);
    }
}
