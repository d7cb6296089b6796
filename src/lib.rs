// hrx/src/lib.rs

pub mod backend;
pub mod catalog;
pub mod configs;
pub mod controllers;
pub mod error;
pub mod health;
pub mod helpers;
pub mod menu;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod registry;
pub mod router;
pub mod store;
pub mod utils;

pub use configs::initializer::{
    configure_hrx_services,
    get_hrx_session_middleware,
    hrx_initialize,
    setup_hrx_logging,
    HrxConfig,
    HrxState,
};

pub use backend::{refresh_permissions, AuthBackend, PermissionSource};
pub use error::HrxError;
pub use helpers::guard_helper::{ActionControl, GuardOutcome, RegionGuard};
pub use menu::{filter_menu, filter_menu_by_role, flatten, MenuConfig, MenuEntry, MenuSection};
pub use middleware::permission_guard::PermissionGuard;
pub use models::directory::Directory;
pub use models::principal::{Principal, RoleRef};
pub use permissions::{Action, Decision, ModuleId, PermissionEntry, PermissionSet};
pub use registry::ModuleRegistry;
pub use router::register_all_hrx_routes;
pub use store::{PermissionEvaluator, PermissionStore};
pub use utils::structs::Claims;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub mod prelude {
    pub use crate::{
        filter_menu,
        filter_menu_by_role,
        Action,
        ActionControl,
        Decision,
        HrxConfig,
        MenuEntry,
        PermissionEvaluator,
        PermissionStore,
        Principal,
        RegionGuard,
    };
}

/// Check that the environment carries what `HrxConfig::from_env` requires.
pub fn validate_config() -> anyhow::Result<()> {
    let config = HrxConfig::from_env()?;
    utils::auth::validate_session_config(&config).map_err(anyhow::Error::msg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "hrx");
    }

    #[test]
    fn test_config_validation() {
        env::set_var("JWT_SECRET", "test_secret_that_is_long_enough_for_testing");
        assert!(validate_config().is_ok());

        env::remove_var("JWT_SECRET");
        assert!(validate_config().is_err());
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _store_exists = std::marker::PhantomData::<PermissionStore>;
        let _config_exists = std::marker::PhantomData::<HrxConfig>;
        let _evaluator_exists = std::marker::PhantomData::<Box<dyn PermissionEvaluator>>;
        assert_eq!(Action::default(), Action::Read);
    }
}
