// src/configs/initializer.rs
use log::{info, debug, warn};
use actix_web::web;
use actix_session::{SessionMiddleware, storage::CookieSessionStore, config::PersistentSession};
use actix_web::cookie::{Key, SameSite};
use env_logger::Env;
use std::{env, path::PathBuf, sync::{Arc, Once}, time::Duration};
use crate::backend::{AuthBackend, PermissionSource};
use crate::catalog::{default_menu, default_registry};
use crate::error::HrxError;
use crate::menu::MenuConfig;
use crate::models::directory::Directory;
use crate::registry::ModuleRegistry;
use crate::router::register_all_hrx_routes;
use crate::store::DEFAULT_ADMIN_ROLE_ID;

static LOGGING: Once = Once::new();

#[derive(Debug, Clone)]
pub struct HrxConfig {
    pub jwt_secret: String,
    pub session_secret: String,
    pub environment: String,
    pub log_level: String,
    pub session_timeout: Duration,
    pub admin_role_id: i64,
    pub directory_path: Option<PathBuf>,
    pub menu_path: Option<PathBuf>,
}

impl HrxConfig {
    pub fn from_env() -> Result<Self, HrxError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment != "production" => {
                warn!("⚠️  SESSION_SECRET not set, a generated key will be used - NOT suitable for production!");
                String::new()
            }
            Err(_) => {
                return Err(HrxError::Config("SESSION_SECRET is required in production".into()))
            }
        };

        Ok(Self {
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| HrxError::Config("JWT_SECRET is required".into()))?,
            session_secret,
            environment,
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_timeout: Duration::from_secs(
                env::var("SESSION_TIMEOUT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(86400),
            ),
            admin_role_id: env::var("HRX_ADMIN_ROLE_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ADMIN_ROLE_ID),
            directory_path: env::var("HRX_DIRECTORY").ok().map(PathBuf::from),
            menu_path: env::var("HRX_MENU").ok().map(PathBuf::from),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct HrxState {
    pub registry: Arc<ModuleRegistry>,
    pub menu: Arc<MenuConfig>,
    pub auth: Arc<dyn AuthBackend>,
    pub permissions: Arc<dyn PermissionSource>,
}

impl HrxState {
    /// Build state around a directory that serves both authentication and
    /// permissions.
    pub fn with_directory(registry: ModuleRegistry, menu: MenuConfig, directory: Directory) -> Self {
        let directory = Arc::new(directory);
        Self {
            registry: Arc::new(registry),
            menu: Arc::new(menu),
            auth: directory.clone(),
            permissions: directory,
        }
    }
}

/// Resolve the cookie signing key. Call once per process; every worker must
/// share the same key.
pub fn load_session_key(config: &HrxConfig) -> Result<Key, HrxError> {
    if config.session_secret.is_empty() {
        if config.is_production() {
            return Err(HrxError::Config(
                "SESSION_SECRET environment variable is required in production".into(),
            ));
        }
        warn!("⚠️  Using generated session key - NOT suitable for production!");
        Ok(Key::generate())
    } else {
        if config.session_secret.len() < 64 {
            return Err(HrxError::Config(
                "SESSION_SECRET must be at least 64 characters long".into(),
            ));
        }
        Ok(Key::from(config.session_secret.as_bytes()))
    }
}

pub fn get_hrx_session_middleware(
    config: &HrxConfig,
    secret_key: Key,
) -> SessionMiddleware<CookieSessionStore> {
    let session_ttl =
        actix_web::cookie::time::Duration::seconds(config.session_timeout.as_secs() as i64);

    SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
        .cookie_name("hrx_session".to_string())
        .cookie_secure(config.is_production())
        .cookie_http_only(true)
        .cookie_same_site(if config.is_production() {
            SameSite::Strict
        } else {
            SameSite::Lax
        })
        .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
        .build()
}

pub fn setup_hrx_logging(config: &HrxConfig) {
    LOGGING.call_once(|| {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or(&config.log_level))
            .format_timestamp_millis()
            .try_init();

        info!("✅ HRX logging initialized");
        info!("🔧 HRX environment: {}", config.environment);
        debug!("🔍 HRX debug logging active");
    });
}

/// Load the module registry, menu and directory named by the config.
pub fn hrx_initialize(config: &HrxConfig) -> Result<HrxState, HrxError> {
    let registry = default_registry()?;

    let menu = match &config.menu_path {
        Some(path) => MenuConfig::from_path(path, &registry)?,
        None => default_menu(&registry)?,
    };

    let directory = match &config.directory_path {
        Some(path) => Directory::from_path(path, &registry)?,
        None => {
            warn!("⚠️  HRX_DIRECTORY not set; nobody will be able to sign in");
            Directory::default()
        }
    };

    info!(
        "HRX initialized: {} modules, {} menu entries",
        registry.len(),
        menu.entries().len()
    );
    Ok(HrxState::with_directory(registry, menu, directory))
}

pub fn configure_hrx_services(config: HrxConfig, state: HrxState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(config));
        cfg.app_data(web::Data::new(state));
        cfg.service(register_all_hrx_routes());
    }
}
