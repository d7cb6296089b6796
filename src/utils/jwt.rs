// hrx/src/utils/jwt.rs
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use anyhow::{Result, Context};
use crate::configs::initializer::HrxConfig;
use crate::error::HrxError;
use crate::models::principal::Principal;
use crate::permissions::PermissionSet;
use crate::utils::structs::Claims;

/// Sign a session token for `principal`. `permissions` is `None` while the
/// permission fetch has not resolved.
pub fn create_jwt_token(
    principal: &Principal,
    permissions: Option<&PermissionSet>,
    config: &HrxConfig,
) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(config.session_timeout.as_secs() as i64))
        .context("session timeout overflows the clock")?
        .timestamp() as usize;

    let claims = Claims {
        sub: principal.id.clone(),
        exp: expiration,
        email: principal.email.clone(),
        name: principal.name.clone(),
        role: principal.role.clone(),
        is_admin: principal.is_admin,
        permissions: permissions.map(PermissionSet::to_strings),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .context("Failed to encode JWT")?;

    Ok(token)
}

pub fn decode_jwt_token(token: &str, config: &HrxConfig) -> Result<Claims, HrxError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| HrxError::Unauthorized)
}
