// hrx/src/helpers/template_helper.rs
use actix_web::HttpResponse;
use chrono::Datelike;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::error;
use crate::menu::MenuSection;
use crate::store::PermissionStore;

const TEMPLATE_FILES: &[(&str, &str)] = &[
    ("layout.html.tera", include_str!("../templates/layout.html.tera")),
    ("login.html.tera", include_str!("../templates/login.html.tera")),
    ("dashboard.html.tera", include_str!("../templates/dashboard.html.tera")),
    ("module.html.tera", include_str!("../templates/module.html.tera")),
    ("partials/nav.html.tera", include_str!("../templates/partials/nav.html.tera")),
    ("partials/redirect.html.tera", include_str!("../templates/partials/redirect.html.tera")),
    ("controls/action_control.html.tera", include_str!("../templates/controls/action_control.html.tera")),
    ("errors/403.html.tera", include_str!("../templates/errors/403.html.tera")),
    ("errors/404.html.tera", include_str!("../templates/errors/404.html.tera")),
    ("errors/500.html.tera", include_str!("../templates/errors/500.html.tera")),
];

pub static HRX_TEMPLATES: Lazy<Arc<Tera>> = Lazy::new(|| {
    let mut tera = Tera::default();
    // Registered together so `extends` and `include` resolve.
    if let Err(e) = tera.add_raw_templates(TEMPLATE_FILES.to_vec()) {
        error!("Failed to load HRX templates: {:?}", e);
    }
    tera.autoescape_on(vec![".html.tera"]);
    Arc::new(tera)
});

pub fn render_html(template_name: &str, ctx: &Context) -> Result<String, tera::Error> {
    HRX_TEMPLATES.render(template_name, ctx)
}

pub fn render_template(template_name: &str, ctx: Context) -> HttpResponse {
    match render_html(template_name, &ctx) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(err) => {
            error!("Template render error for {}: {:?}", template_name, err);
            render_500(Some(&format!("Failed to render template: {}", template_name)))
        }
    }
}

pub fn access_denied_html() -> String {
    let mut ctx = Context::new();
    ctx.insert("error_message", "You don't have permission to access this resource.");
    render_html("errors/403.html.tera", &ctx).unwrap_or_else(|_| {
        "<h1>403 - Access Denied</h1><p>You don't have permission to access this resource.</p>"
            .to_string()
    })
}

pub fn render_403() -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("text/html")
        .body(access_denied_html())
}

pub fn render_404() -> HttpResponse {
    let html = render_html("errors/404.html.tera", &Context::new())
        .unwrap_or_else(|_| "<h1>404 - Page Not Found</h1>".to_string());
    HttpResponse::NotFound().content_type("text/html").body(html)
}

pub fn render_500(error_message: Option<&str>) -> HttpResponse {
    let mut ctx = Context::new();
    ctx.insert("error_message", &error_message.unwrap_or("An internal server error occurred."));
    let html = render_html("errors/500.html.tera", &ctx)
        .unwrap_or_else(|_| "<h1>500 - Internal Server Error</h1>".to_string());
    HttpResponse::InternalServerError()
        .content_type("text/html")
        .body(html)
}

pub fn create_base_context() -> Context {
    let mut ctx = Context::new();
    ctx.insert("app_name", "HRX");
    ctx.insert("app_version", env!("CARGO_PKG_VERSION"));
    ctx.insert("current_year", &chrono::Utc::now().year());
    ctx.insert("is_authenticated", &false);
    ctx.insert("error", &Option::<String>::None);
    ctx
}

/// Base context plus the signed-in principal and their filtered navigation.
pub fn create_authenticated_context(store: &PermissionStore, menus: &[MenuSection]) -> Context {
    let mut ctx = create_base_context();
    if let Some(summary) = store.summary() {
        ctx.insert("is_authenticated", &true);
        ctx.insert("current_user", &summary);
    }
    ctx.insert("menus", menus);
    ctx
}
