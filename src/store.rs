// hrx/src/store.rs
//! The permission store: who is signed in and what they may do.

use std::sync::RwLock;
use tracing::{debug, warn};
use crate::error::HrxError;
use crate::models::principal::{Principal, PrincipalSummary, RoleRef};
use crate::permissions::{Action, Decision, PermissionEntry, PermissionSet};

/// Default role ID that is granted every permission.
pub const DEFAULT_ADMIN_ROLE_ID: i64 = 1;

/// Anything that can answer "may the current principal do `action` on `module`".
///
/// `Err` means the evaluator itself misbehaved; callers must treat it as a
/// denial.
pub trait PermissionEvaluator {
    fn evaluate(&self, module: &str, action: Action) -> Result<Decision, HrxError>;
}

impl<E: PermissionEvaluator + ?Sized> PermissionEvaluator for &E {
    fn evaluate(&self, module: &str, action: Action) -> Result<Decision, HrxError> {
        (**self).evaluate(module, action)
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    principal: Principal,
    // None until the permission fetch resolves.
    permissions: Option<PermissionSet>,
}

/// Holds the authenticated principal and their effective permission set.
///
/// Constructed once and passed by reference to whatever needs to check
/// permissions. Written on login, cleared on logout.
#[derive(Debug)]
pub struct PermissionStore {
    admin_role_id: i64,
    state: RwLock<Option<SessionState>>,
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_ROLE_ID)
    }
}

impl PermissionStore {
    pub fn new(admin_role_id: i64) -> Self {
        Self {
            admin_role_id,
            state: RwLock::new(None),
        }
    }

    pub fn admin_role_id(&self) -> i64 {
        self.admin_role_id
    }

    /// Record a freshly authenticated principal.
    ///
    /// A role object that embeds its permission list counts as a loaded set;
    /// a bare role ID leaves the set pending until `load_permissions`.
    pub fn login(&self, principal: Principal) -> Result<(), HrxError> {
        let permissions = match &principal.role {
            RoleRef::Named { permissions, .. } => Some(permissions.iter().cloned().collect()),
            RoleRef::Id(_) => None,
        };
        let mut state = self
            .state
            .write()
            .map_err(|_| HrxError::Evaluator("permission store lock poisoned".into()))?;
        debug!("Principal {} signed in (role {:?})", principal.email, principal.role_id());
        *state = Some(SessionState {
            principal,
            permissions,
        });
        Ok(())
    }

    /// Install the permission set fetched for the current principal.
    pub fn load_permissions<I>(&self, entries: I) -> Result<(), HrxError>
    where
        I: IntoIterator<Item = PermissionEntry>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| HrxError::Evaluator("permission store lock poisoned".into()))?;
        match state.as_mut() {
            Some(session) => {
                let set: PermissionSet = entries.into_iter().collect();
                debug!("Loaded {} permissions for {}", set.len(), session.principal.email);
                session.permissions = Some(set);
                Ok(())
            }
            None => {
                warn!("Permission set arrived with no principal signed in; ignoring");
                Err(HrxError::Unauthorized)
            }
        }
    }

    /// Drop the principal and their permissions.
    pub fn logout(&self) {
        let mut state = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *state = None;
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.as_ref().map(|s| s.principal.clone()))
    }

    pub fn permissions(&self) -> Option<PermissionSet> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.as_ref().and_then(|s| s.permissions.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.permissions().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.principal()
            .map(|p| p.is_admin(self.admin_role_id))
            .unwrap_or(false)
    }

    /// Typed query. Evaluator failures come back as `Indeterminate`.
    pub fn check(&self, module: &str, action: Action) -> Decision {
        self.evaluate(module, action).unwrap_or_else(|err| {
            warn!("Permission check for {}:{} failed: {}", module, action, err);
            Decision::Indeterminate
        })
    }

    /// String query used by templates and loosely typed callers. An empty
    /// action means `read`; anything unparsable is a denial.
    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        match action.parse::<Action>() {
            Ok(action) => self.check(module, action).is_allowed(),
            Err(_) => false,
        }
    }

    pub fn summary(&self) -> Option<PrincipalSummary> {
        let state = self.state.read().ok()?;
        let session = state.as_ref()?;
        let principal = &session.principal;
        Some(PrincipalSummary {
            id: principal.id.clone(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            role_id: principal.role_id(),
            role_name: principal.role.name().map(str::to_string),
            is_admin: principal.is_admin(self.admin_role_id),
            permissions: session
                .permissions
                .as_ref()
                .map(PermissionSet::to_strings)
                .unwrap_or_default(),
        })
    }
}

impl PermissionEvaluator for PermissionStore {
    fn evaluate(&self, module: &str, action: Action) -> Result<Decision, HrxError> {
        let state = self
            .state
            .read()
            .map_err(|_| HrxError::Evaluator("permission store lock poisoned".into()))?;

        let Some(session) = state.as_ref() else {
            return Ok(Decision::Indeterminate);
        };
        if session.principal.is_admin(self.admin_role_id) {
            return Ok(Decision::Allowed);
        }
        let Some(permissions) = session.permissions.as_ref() else {
            return Ok(Decision::Indeterminate);
        };
        if permissions.contains(module, action) {
            Ok(Decision::Allowed)
        } else {
            Ok(Decision::Denied)
        }
    }
}
