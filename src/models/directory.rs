// hrx/src/models/directory.rs
use async_trait::async_trait;
use bcrypt::verify;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use crate::backend::{AuthBackend, PermissionSource};
use crate::error::HrxError;
use crate::models::principal::{Principal, RoleRef};
use crate::permissions::PermissionEntry;
use crate::registry::ModuleRegistry;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DirectoryUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub status: UserStatus,
    #[serde(default)]
    pub is_admin: bool,
}

impl DirectoryUser {
    pub fn verify_password(&self, plain: &str) -> bool {
        verify(plain, &self.password_hash).unwrap_or(false)
    }

    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: RoleRef::Id(self.role_id),
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DirectoryRole {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    roles: Vec<DirectoryRole>,
    #[serde(default)]
    users: Vec<DirectoryUser>,
}

/// File-backed stand-in for the backend's user and role endpoints.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<DirectoryUser>,
    roles: HashMap<i64, DirectoryRole>,
}

impl Directory {
    pub fn from_json_str(raw: &str, registry: &ModuleRegistry) -> Result<Self, HrxError> {
        let file: DirectoryFile = serde_json::from_str(raw)
            .map_err(|e| HrxError::Config(format!("invalid directory file: {}", e)))?;

        let mut roles = HashMap::new();
        for role in file.roles {
            for entry in &role.permissions {
                registry.validate(&entry.module, entry.action).map_err(|e| {
                    HrxError::Config(format!("role {} '{}': {}", role.id, role.name, e))
                })?;
            }
            if roles.insert(role.id, role.clone()).is_some() {
                return Err(HrxError::Config(format!("duplicate role id {}", role.id)));
            }
        }

        for user in &file.users {
            if !roles.contains_key(&user.role_id) {
                warn!("User {} references unknown role {}", user.email, user.role_id);
            }
        }

        info!("Directory loaded: {} users, {} roles", file.users.len(), roles.len());
        Ok(Self {
            users: file.users,
            roles,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, registry: &ModuleRegistry) -> Result<Self, HrxError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HrxError::Config(format!("cannot read directory file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw, registry)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&DirectoryUser> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
    }

    pub fn role(&self, id: i64) -> Option<&DirectoryRole> {
        self.roles.get(&id)
    }
}

#[async_trait]
impl AuthBackend for Directory {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, HrxError> {
        let user = self.find_by_email(email).ok_or(HrxError::Unauthorized)?;
        if user.status != UserStatus::Active {
            warn!("Login refused for {}: account is {:?}", user.email, user.status);
            return Err(HrxError::Forbidden);
        }
        if !user.verify_password(password) {
            return Err(HrxError::Unauthorized);
        }
        Ok(user.to_principal())
    }
}

#[async_trait]
impl PermissionSource for Directory {
    async fn fetch(&self, principal: &Principal) -> Result<Vec<PermissionEntry>, HrxError> {
        if let RoleRef::Named { permissions, .. } = &principal.role {
            return Ok(permissions.clone());
        }
        let role_id = principal.role_id().ok_or_else(|| {
            HrxError::Backend(format!("principal {} has no role id", principal.email))
        })?;
        match self.roles.get(&role_id) {
            Some(role) => Ok(role.permissions.clone()),
            None => {
                warn!("No role {} in directory; {} gets no permissions", role_id, principal.email);
                Ok(Vec::new())
            }
        }
    }
}
