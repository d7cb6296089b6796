// hrx/src/models/principal.rs
use serde::{Deserialize, Serialize};
use crate::permissions::PermissionEntry;

/// The role attached to a principal, as the backend reports it.
///
/// Older endpoints send a bare role ID; newer ones embed the role object
/// together with its permission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Id(i64),
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        name: String,
        #[serde(default)]
        permissions: Vec<PermissionEntry>,
    },
}

impl RoleRef {
    pub fn id(&self) -> Option<i64> {
        match self {
            RoleRef::Id(id) => Some(*id),
            RoleRef::Named { id, .. } => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RoleRef::Id(_) => None,
            RoleRef::Named { name, .. } => Some(name),
        }
    }

    pub fn embedded_permissions(&self) -> &[PermissionEntry] {
        match self {
            RoleRef::Id(_) => &[],
            RoleRef::Named { permissions, .. } => permissions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: RoleRef,
    #[serde(default, rename = "isAdmin", alias = "is_admin")]
    pub is_admin: bool,
}

impl Principal {
    /// Whether this principal carries the admin override, either through the
    /// flag or by holding `admin_role_id`.
    pub fn is_admin(&self, admin_role_id: i64) -> bool {
        self.is_admin || self.role.id() == Some(admin_role_id)
    }

    pub fn role_id(&self) -> Option<i64> {
        self.role.id()
    }
}

/// Public view of a principal for JSON endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub is_admin: bool,
    pub permissions: Vec<String>,
}
