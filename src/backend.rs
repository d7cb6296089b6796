// hrx/src/backend.rs
//! Seams to the REST backend that authenticates users and serves role
//! permissions.

use async_trait::async_trait;
use tracing::{info, warn};
use crate::error::HrxError;
use crate::models::principal::Principal;
use crate::permissions::PermissionEntry;
use crate::store::PermissionStore;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, HrxError>;
}

#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch(&self, principal: &Principal) -> Result<Vec<PermissionEntry>, HrxError>;
}

/// Fetch the permission set for the signed-in principal and install it.
///
/// On failure the store keeps answering deny and the error is returned so
/// the caller can retry.
pub async fn refresh_permissions(
    store: &PermissionStore,
    source: &dyn PermissionSource,
) -> Result<usize, HrxError> {
    let principal = store.principal().ok_or(HrxError::Unauthorized)?;
    match source.fetch(&principal).await {
        Ok(entries) => {
            let count = entries.len();
            store.load_permissions(entries)?;
            info!("Permission set refreshed for {} ({} entries)", principal.email, count);
            Ok(count)
        }
        Err(err) => {
            warn!("Permission fetch failed for {}: {}", principal.email, err);
            Err(err)
        }
    }
}
