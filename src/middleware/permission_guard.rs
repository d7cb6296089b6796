// hrx/src/middleware/permission_guard.rs
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, web,
};
use actix_session::SessionExt;
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use tracing::{info, warn};
use crate::configs::initializer::HrxConfig;
use crate::error::HrxError;
use crate::permissions::{Action, Decision};
use crate::utils::auth::{extract_claims_from_session, store_from_claims};

/// Scope middleware that admits only principals allowed `action` on `module`.
///
/// Unauthenticated requests get 401, denied ones 403. On success the
/// session claims are placed in the request extensions.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    pub module: String,
    pub action: Action,
}

impl PermissionGuard {
    pub fn new(module: &str, action: Action) -> Self {
        Self {
            module: module.to_string(),
            action,
        }
    }

    pub fn read(module: &str) -> Self {
        Self::new(module, Action::Read)
    }

    pub fn manage(module: &str) -> Self {
        Self::new(module, Action::Manage)
    }
}

impl<S, B> Transform<S, ServiceRequest> for PermissionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PermissionGuardMiddleware<S>;
    type InitError = ();
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let guard = self.clone();
        Box::pin(async move {
            Ok(PermissionGuardMiddleware {
                service: Rc::new(service),
                guard,
            })
        })
    }
}

pub struct PermissionGuardMiddleware<S> {
    service: Rc<S>,
    guard: PermissionGuard,
}

impl<S, B> Service<ServiceRequest> for PermissionGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = Rc::clone(&self.service);
        let guard = self.guard.clone();

        Box::pin(async move {
            let session = req.get_session();
            let uri = req.uri().to_string();

            let config = req.app_data::<web::Data<HrxConfig>>().cloned().ok_or_else(|| {
                warn!("⚠️  HRX config not found in app data for request: {}", uri);
                HrxError::InternalError
            })?;

            let claims = match extract_claims_from_session(&session, &config) {
                Ok(claims) => claims,
                Err(auth_error) => {
                    warn!("🔐 Authentication failed for request: {} - {}", uri, auth_error);
                    return Err(HrxError::Unauthorized.into());
                }
            };

            let store = store_from_claims(&claims, config.admin_role_id)?;
            match store.check(&guard.module, guard.action) {
                Decision::Allowed => {
                    info!("✅ Access granted to {} for {} ({}:{})",
                          claims.email, uri, guard.module, guard.action);
                    req.extensions_mut().insert(claims);
                    svc.call(req).await
                }
                decision => {
                    warn!("🚫 Access denied to {} for {} - requires {}:{} ({})",
                          claims.email, uri, guard.module, guard.action, decision.as_str());
                    Err(HrxError::Forbidden.into())
                }
            }
        })
    }
}
