// hrx/src/utils/auth.rs
use actix_session::Session;
use tracing::warn;
use crate::configs::initializer::HrxConfig;
use crate::error::HrxError;
use crate::permissions::PermissionEntry;
use crate::store::PermissionStore;
use crate::utils::{jwt::decode_jwt_token, structs::Claims};

pub const SESSION_TOKEN_KEY: &str = "hrxtoken";

pub fn extract_claims_from_session(session: &Session, config: &HrxConfig) -> Result<Claims, HrxError> {
    let token = session
        .get::<String>(SESSION_TOKEN_KEY)
        .map_err(|_| HrxError::Unauthorized)?
        .ok_or(HrxError::Unauthorized)?;
    decode_jwt_token(&token, config)
}

/// Rebuild the permission store for one request from session claims.
pub fn store_from_claims(claims: &Claims, admin_role_id: i64) -> Result<PermissionStore, HrxError> {
    let store = PermissionStore::new(admin_role_id);
    store.login(claims.principal())?;
    if let Some(raw) = &claims.permissions {
        let entries = raw.iter().filter_map(|p| match p.parse::<PermissionEntry>() {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Dropping unreadable permission '{}' for {}: {}", p, claims.email, err);
                None
            }
        });
        store.load_permissions(entries)?;
    }
    Ok(store)
}

/// Permission store for the current session. An anonymous session yields an
/// empty store that denies everything.
pub fn store_from_session(session: &Session, config: &HrxConfig) -> PermissionStore {
    match extract_claims_from_session(session, config)
        .and_then(|claims| store_from_claims(&claims, config.admin_role_id))
    {
        Ok(store) => store,
        Err(_) => PermissionStore::new(config.admin_role_id),
    }
}

pub fn validate_session_config(config: &HrxConfig) -> Result<(), String> {
    if config.jwt_secret.len() < 32 {
        return Err("JWT_SECRET must be at least 32 characters long".to_string());
    }

    if !config.session_secret.is_empty() && config.session_secret.len() < 64 {
        return Err("SESSION_SECRET must be at least 64 characters long".to_string());
    }

    Ok(())
}
