// hrx/src/controllers/menu_controller.rs
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;
use crate::configs::initializer::{HrxConfig, HrxState};
use crate::error::HrxError;
use crate::helpers::guard_helper::{render_controls, ActionControl, RegionGuard};
use crate::helpers::template_helper::{create_authenticated_context, render_404, render_template};
use crate::menu::{filter_menu, filter_menu_by_role};
use crate::permissions::{Action, Decision};
use crate::store::PermissionStore;
use crate::utils::auth::{extract_claims_from_session, store_from_claims, store_from_session};
use crate::utils::structs::{ApiResponse, PermissionCheckResponse, PermissionQuery};

fn dashboard_controls() -> Vec<ActionControl> {
    vec![
        ActionControl::new("leave", Action::Create, "Apply for Leave").href("/hrx/m/leave#apply"),
        ActionControl::new("onboarding", Action::Create, "Onboard Employee").href("/hrx/m/onboarding"),
        ActionControl::new("payroll", Action::Manage, "Process Payroll").href("/hrx/m/payroll#process"),
        ActionControl::new("imports", Action::Create, "Import from Excel").href("/hrx/m/imports#import"),
        ActionControl::general("Help").href("/hrx/help"),
    ]
}

fn module_controls(module: &str) -> Vec<ActionControl> {
    vec![
        ActionControl::new(module, Action::Create, "New").class("hrx-btn hrx-btn-primary"),
        ActionControl::new(module, Action::Update, "Edit"),
        ActionControl::new(module, Action::Delete, "Delete").class("hrx-btn hrx-btn-danger"),
        ActionControl::new("imports", Action::Read, "Export to Excel").href("/hrx/m/imports#export"),
    ]
}

fn store_or_unauthorized(session: &Session, config: &HrxConfig) -> Result<PermissionStore, HrxError> {
    let claims = extract_claims_from_session(session, config)?;
    store_from_claims(&claims, config.admin_role_id)
}

/// GET /hrx
pub async fn dashboard_view(
    session: Session,
    config: web::Data<HrxConfig>,
    state: web::Data<HrxState>,
) -> impl Responder {
    let store = match store_or_unauthorized(&session, &config) {
        Ok(store) => store,
        Err(_) => {
            return HttpResponse::Found()
                .append_header(("Location", "/hrx/login"))
                .finish()
        }
    };

    let menus = filter_menu(state.menu.entries(), &store);
    let mut ctx = create_authenticated_context(&store, &menus);
    ctx.insert("page_title", "Dashboard");
    ctx.insert("actions", &render_controls(&dashboard_controls(), &store));
    ctx.insert(
        "payroll_panel",
        &RegionGuard::new("payroll", Action::Read)
            .fallback("<p class=\"hrx-muted\">Payroll figures are visible to payroll staff only.</p>")
            .render(&store, || {
                "<section class=\"hrx-panel\"><h2>Payroll</h2><p>Current cycle is open.</p></section>".to_string()
            }),
    );
    render_template("dashboard.html.tera", ctx)
}

/// GET /hrx/m/{module} and /hrx/admin/{module}
pub async fn module_view(
    path: web::Path<String>,
    session: Session,
    config: web::Data<HrxConfig>,
    state: web::Data<HrxState>,
) -> impl Responder {
    let module = path.into_inner();
    let Some(definition) = state.registry.get(&module) else {
        return render_404();
    };
    let store = match store_or_unauthorized(&session, &config) {
        Ok(store) => store,
        Err(_) => {
            return HttpResponse::Found()
                .append_header(("Location", "/hrx/login"))
                .finish()
        }
    };

    RegionGuard::new(&module, Action::Read)
        .show_access_denied()
        .respond(&store, || {
            let menus = filter_menu(state.menu.entries(), &store);
            let mut ctx = create_authenticated_context(&store, &menus);
            ctx.insert("page_title", &definition.label);
            ctx.insert("module_label", &definition.label);
            ctx.insert("actions", &render_controls(&module_controls(&module), &store));
            render_template("module.html.tera", ctx)
        })
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub mode: Option<String>,
}

/// GET /hrx/api/menu[?mode=role]
pub async fn api_menu(
    query: web::Query<MenuQuery>,
    session: Session,
    config: web::Data<HrxConfig>,
    state: web::Data<HrxState>,
) -> Result<HttpResponse, HrxError> {
    let store = store_or_unauthorized(&session, &config)?;
    let sections = match query.mode.as_deref() {
        Some("role") => {
            let principal = store.principal();
            filter_menu_by_role(state.menu.entries(), principal.as_ref(), config.admin_role_id)
        }
        Some("permission") | None => filter_menu(state.menu.entries(), &store),
        Some(other) => {
            return Err(HrxError::BadRequest(format!("unknown menu mode '{}'", other)));
        }
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(sections)))
}

/// GET /hrx/api/permissions/check?module=..&action=..
///
/// Anonymous callers and unknown actions get a denial, never an error.
pub async fn api_check_permission(
    query: web::Query<PermissionQuery>,
    session: Session,
    config: web::Data<HrxConfig>,
) -> impl Responder {
    let store = store_from_session(&session, &config);
    let decision = match query.action.parse::<Action>() {
        Ok(action) => store.check(&query.module, action),
        Err(_) => Decision::Denied,
    };
    let action = if query.action.is_empty() {
        Action::Read.as_str().to_string()
    } else {
        query.action.clone()
    };
    HttpResponse::Ok().json(PermissionCheckResponse {
        module: query.module.clone(),
        action,
        allowed: decision.is_allowed(),
        decision: decision.as_str().to_string(),
    })
}

/// GET /hrx/api/me
pub async fn api_me(session: Session, config: web::Data<HrxConfig>) -> Result<HttpResponse, HrxError> {
    let store = store_or_unauthorized(&session, &config)?;
    let summary = store.summary().ok_or(HrxError::Unauthorized)?;
    info!("Profile requested by {}", summary.email);
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}
