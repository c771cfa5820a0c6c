//! Role set files.

use std::path::Path;

use rolegraph_core::RoleSet;

use crate::error::{CliError, Result};

/// Read a role set from a JSON array of `{"id": ..., "permissions": [...]}`.
pub fn read_role_set(path: &Path) -> Result<RoleSet> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegraph_core::RoleId;

    #[test]
    fn test_read_role_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "admin", "permissions": ["read", "write"]},
                {"id": "guest"}
            ]"#,
        )
        .unwrap();

        let set = read_role_set(&path).unwrap();
        assert_eq!(set.len(), 2);
        let admin = set.get(&RoleId::new("admin").unwrap()).unwrap();
        assert_eq!(admin.permissions.len(), 2);
    }

    #[test]
    fn test_invalid_identifier_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(&path, r#"[{"id": "ops/admin"}]"#).unwrap();

        let err = read_role_set(&path).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
        assert!(err.to_string().contains("roles.json"));
    }

    #[test]
    fn test_repeated_role_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "admin", "permissions": ["read"]},
                {"id": "admin", "permissions": ["write"]}
            ]"#,
        )
        .unwrap();

        let err = read_role_set(&path).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
        assert!(err.to_string().contains("Duplicate role"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_role_set(Path::new("/nonexistent/roles.json")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
