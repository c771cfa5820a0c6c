//! Reconstruction: rebuild a `RoleSet` from a single traversal.

use rolegraph_core::{GraphNaming, Role, RoleSet};

use crate::cancel::CancelScope;
use crate::error::Result;
use crate::store::{GraphStore, RowCursor, TraversalQuery};

/// Traversal returning one row per role vertex: the role key as `r` and the
/// keys of permissions reachable over grant edges as `p` (possibly empty).
const LOAD_QUERY: &str = include_str!("../queries/load.cypher");

/// Render the traversal for `naming`. The result carries no bind parameters.
pub fn traversal_query(naming: &GraphNaming) -> TraversalQuery {
    let text = LOAD_QUERY
        .replace("{roles}", &naming.role_collection)
        .replace("{permissions}", &naming.permission_collection)
        .replace("{grants}", &naming.edge_collection);

    TraversalQuery {
        text,
        start_collection: naming.role_collection.clone(),
        edge_collection: naming.edge_collection.clone(),
        target_collection: naming.permission_collection.clone(),
    }
}

/// Load the whole role set. Nothing partial is returned on error.
pub async fn load<S>(store: &S, naming: &GraphNaming, scope: &CancelScope) -> Result<RoleSet>
where
    S: GraphStore + ?Sized,
{
    naming.validate()?;
    let query = traversal_query(naming);

    let mut cursor = scope.run(store.traverse(&query)).await?;
    let folded = fold_rows(cursor.as_mut(), scope).await;
    cursor.close().await;

    let roles = folded?;
    tracing::info!(graph = %naming.graph_name, roles = roles.len(), "Loaded role set");
    Ok(roles)
}

async fn fold_rows(cursor: &mut dyn RowCursor, scope: &CancelScope) -> Result<RoleSet> {
    let mut roles = RoleSet::new();
    while let Some(row) = scope.run(cursor.next_row()).await? {
        roles.add(Role::with_permissions(row.role, row.permissions)?);
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_uses_configured_names() {
        let naming = GraphNaming::prefixed("t");
        let query = traversal_query(&naming);

        assert!(query.text.contains("(r:`t_gorbac_roles`)"));
        assert!(query.text.contains("[:`t_gorbac_roles_permissions`]"));
        assert!(query.text.contains("(p:`t_gorbac_permissions`)"));
        assert!(!query.text.contains('{'));
        assert!(!query.text.contains('$'));
        assert_eq!(query.start_collection, "t_gorbac_roles");
        assert_eq!(query.target_collection, "t_gorbac_permissions");
    }
}
