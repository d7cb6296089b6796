// hrx/src/router.rs
use actix_web::{web, Scope};
use tracing::info;
use crate::controllers::auth_controller::{api_login_action, login_action, login_form, logout_action};
use crate::controllers::menu_controller::{
    api_check_permission, api_me, api_menu, dashboard_view, module_view,
};
use crate::health::health_check;
use crate::middleware::permission_guard::PermissionGuard;

pub fn register_all_hrx_routes() -> Scope {
    info!("🔧 Starting HRX route registration...");

    let scope = web::scope("/hrx")
        // ===========================
        // AUTHENTICATION ROUTES
        // ===========================
        .route("/login", web::get().to(login_form))
        .route("/login", web::post().to(login_action))
        .route("/logout", web::get().to(logout_action))
        .route("/logout", web::post().to(logout_action))

        // ===========================
        // PAGES
        // ===========================
        .route("", web::get().to(dashboard_view))
        .route("/", web::get().to(dashboard_view))
        .route("/health", web::get().to(health_check))
        .route("/m/{module}", web::get().to(module_view))
        .service(
            web::scope("/admin")
                .wrap(PermissionGuard::manage("users"))
                .route("/{module}", web::get().to(module_view)),
        )

        // ===========================
        // API ROUTES
        // ===========================
        .service(
            web::scope("/api")
                .route("/login", web::post().to(api_login_action))
                .route("/me", web::get().to(api_me))
                .route("/menu", web::get().to(api_menu))
                .route("/permissions/check", web::get().to(api_check_permission)),
        );

    info!("🎉 HRX route registration completed!");
    scope
}
