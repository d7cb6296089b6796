// hrx/src/utils/structs.rs
use serde::{Serialize, Deserialize};
use crate::models::principal::{Principal, RoleRef};

/// JWT payload carrying the principal between requests.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,         // Principal ID
    pub exp: usize,          // Expiration (as timestamp)
    pub email: String,
    pub name: String,
    pub role: RoleRef,
    #[serde(default)]
    pub is_admin: bool,
    /// `module:action` strings; absent while the permission set is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            is_admin: self.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionQuery {
    pub module: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionCheckResponse {
    pub module: String,
    pub action: String,
    pub allowed: bool,
    pub decision: String,
}
