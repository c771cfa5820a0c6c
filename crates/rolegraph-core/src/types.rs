//! Core RBAC model types.
//!
//! A `RoleSet` is the unit handed to the synchronizer and returned by the
//! loader. Roles carry their directly granted permissions; there is no role
//! inheritance.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RbacError, Result};

/// Longest identifier accepted as a document key.
pub const MAX_KEY_LEN: usize = 254;

// ── Identifiers ───────────────────────────────────────────────────

/// Unique identifier of a role. Doubles as the role vertex key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_key("role", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier of a permission. Doubles as the permission vertex key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionId(String);

impl PermissionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_key("permission", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleId {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionId {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(id: RoleId) -> Self {
        id.0
    }
}

impl From<PermissionId> for String {
    fn from(id: PermissionId) -> Self {
        id.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys end up inside `collection/key` handles, so `/` is reserved.
fn validate_key(kind: &'static str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.len() > MAX_KEY_LEN {
        "longer than 254 bytes"
    } else if value.contains('/') {
        "must not contain '/'"
    } else if value.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };

    Err(RbacError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason,
    })
}

// ── Role ──────────────────────────────────────────────────────────

/// A role and the permissions it grants directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    #[serde(default)]
    pub permissions: BTreeSet<PermissionId>,
}

impl Role {
    pub fn new(id: RoleId) -> Self {
        Self {
            id,
            permissions: BTreeSet::new(),
        }
    }

    /// Build a role from raw identifiers, validating each of them.
    pub fn with_permissions<I, S>(id: impl Into<String>, permissions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut role = Self::new(RoleId::new(id)?);
        for p in permissions {
            role.assign(PermissionId::new(p)?);
        }
        Ok(role)
    }

    /// Grant a permission. Returns false if it was already granted.
    pub fn assign(&mut self, permission: PermissionId) -> bool {
        self.permissions.insert(permission)
    }

    /// Withdraw a permission. Returns false if it was not granted.
    pub fn revoke(&mut self, permission: &PermissionId) -> bool {
        self.permissions.remove(permission)
    }

    pub fn permits(&self, permission: &PermissionId) -> bool {
        self.permissions.contains(permission)
    }
}

// ── RoleSet ───────────────────────────────────────────────────────

/// The top-level aggregate: roles keyed by identifier.
///
/// Iteration is ordered by role id; insertion order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet {
    roles: BTreeMap<RoleId, Role>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role, replacing any existing role with the same id.
    pub fn add(&mut self, role: Role) -> Option<Role> {
        self.roles.insert(role.id.clone(), role)
    }

    pub fn remove(&mut self, id: &RoleId) -> Option<Role> {
        self.roles.remove(id)
    }

    pub fn get(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn get_mut(&mut self, id: &RoleId) -> Option<&mut Role> {
        self.roles.get_mut(id)
    }

    pub fn contains(&self, id: &RoleId) -> bool {
        self.roles.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Distinct permissions referenced by any role.
    pub fn permissions(&self) -> BTreeSet<&PermissionId> {
        self.roles.values().flat_map(|r| r.permissions.iter()).collect()
    }

    /// True if at least one of the named roles exists and grants `permission`.
    pub fn any_granted(&self, role_ids: &[RoleId], permission: &PermissionId) -> bool {
        role_ids
            .iter()
            .filter_map(|id| self.roles.get(id))
            .any(|r| r.permits(permission))
    }

    /// True if every named role exists and grants `permission`.
    ///
    /// Vacuously true for an empty `role_ids` slice.
    pub fn all_granted(&self, role_ids: &[RoleId], permission: &PermissionId) -> bool {
        role_ids
            .iter()
            .all(|id| self.roles.get(id).is_some_and(|r| r.permits(permission)))
    }
}

/// Role keys are unique; a list naming the same role twice is rejected
/// rather than having one entry silently replace the other.
impl TryFrom<Vec<Role>> for RoleSet {
    type Error = RbacError;

    fn try_from(roles: Vec<Role>) -> Result<Self> {
        let mut set = Self::new();
        for role in roles {
            let id = role.id.clone();
            if set.add(role).is_some() {
                return Err(RbacError::DuplicateRole(id.into()));
            }
        }
        Ok(set)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.roles.into_values().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.add(role);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = std::collections::btree_map::Values<'a, RoleId, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(s: &str) -> RoleId {
        RoleId::new(s).unwrap()
    }

    fn pid(s: &str) -> PermissionId {
        PermissionId::new(s).unwrap()
    }

    fn sample() -> RoleSet {
        let foo = Role::with_permissions("foo", ["bar", "quux"]).unwrap();
        let gandalf = Role::with_permissions("gandalf", ["pass", "quux"]).unwrap();
        RoleSet::from_iter([foo, gandalf])
    }

    #[test]
    fn identifiers_reject_bad_keys() {
        assert!(RoleId::new("").is_err());
        assert!(RoleId::new("a/b").is_err());
        assert!(PermissionId::new("x\ny").is_err());
        assert!(PermissionId::new("x".repeat(MAX_KEY_LEN + 1)).is_err());
        assert!(PermissionId::new("orders:read").is_ok());
    }

    #[test]
    fn invalid_identifier_reports_kind() {
        let err = RoleId::new("").unwrap_err();
        assert!(matches!(err, RbacError::InvalidIdentifier { kind: "role", .. }));
    }

    #[test]
    fn assign_and_revoke() {
        let mut role = Role::new(rid("editor"));
        assert!(role.assign(pid("write")));
        assert!(!role.assign(pid("write")));
        assert!(role.permits(&pid("write")));
        assert!(role.revoke(&pid("write")));
        assert!(!role.permits(&pid("write")));
    }

    #[test]
    fn any_granted_semantics() {
        let set = sample();
        assert!(set.any_granted(&[rid("foo")], &pid("bar")));
        assert!(!set.any_granted(&[rid("foo")], &pid("wtf")));
        assert!(set.any_granted(&[rid("foo"), rid("gandalf")], &pid("pass")));
        assert!(!set.any_granted(&[rid("nobody")], &pid("bar")));
    }

    #[test]
    fn all_granted_semantics() {
        let set = sample();
        assert!(set.all_granted(&[rid("foo"), rid("gandalf")], &pid("quux")));
        assert!(!set.all_granted(&[rid("foo"), rid("gandalf")], &pid("pass")));
        assert!(!set.all_granted(&[rid("foo"), rid("nobody")], &pid("bar")));
        assert!(set.all_granted(&[], &pid("bar")));
    }

    #[test]
    fn add_replaces_same_id() {
        let mut set = sample();
        let replaced = set.add(Role::new(rid("foo")));
        assert_eq!(replaced.map(|r| r.permissions.len()), Some(2));
        assert_eq!(set.len(), 2);
        assert!(set.get(&rid("foo")).unwrap().permissions.is_empty());
    }

    #[test]
    fn distinct_permissions() {
        let set = sample();
        let perms: Vec<&str> = set.permissions().into_iter().map(|p| p.as_str()).collect();
        assert_eq!(perms, vec!["bar", "pass", "quux"]);
    }

    #[test]
    fn role_set_json_shape() {
        let json = r#"[
            {"id": "foo", "permissions": ["bar", "quux"]},
            {"id": "empty"}
        ]"#;
        let set: RoleSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get(&rid("empty")).unwrap().permissions.is_empty());

        let back = serde_json::to_value(&set).unwrap();
        assert_eq!(back[0]["id"], "empty");
        assert_eq!(back[1]["permissions"][1], "quux");
    }

    #[test]
    fn role_set_json_rejects_bad_ids() {
        let json = r#"[{"id": "a/b", "permissions": []}]"#;
        assert!(serde_json::from_str::<RoleSet>(json).is_err());
    }

    #[test]
    fn role_set_json_rejects_repeated_role() {
        let json = r#"[
            {"id": "a", "permissions": ["x"]},
            {"id": "a", "permissions": ["y"]}
        ]"#;
        let err = serde_json::from_str::<RoleSet>(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate role \"a\""));
    }

    #[test]
    fn role_list_conversion_rejects_repeated_role() {
        let roles = vec![
            Role::with_permissions("a", ["x"]).unwrap(),
            Role::with_permissions("a", ["y"]).unwrap(),
        ];
        assert_eq!(
            RoleSet::try_from(roles),
            Err(RbacError::DuplicateRole("a".to_string()))
        );
    }
}
