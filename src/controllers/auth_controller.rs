// hrx/src/controllers/auth_controller.rs
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use tracing::{error, info, warn};
use crate::backend::refresh_permissions;
use crate::configs::initializer::{HrxConfig, HrxState};
use crate::error::HrxError;
use crate::helpers::template_helper::{create_base_context, render_template};
use crate::store::PermissionStore;
use crate::utils::auth::{extract_claims_from_session, SESSION_TOKEN_KEY};
use crate::utils::jwt::create_jwt_token;
use crate::utils::structs::{ApiResponse, LoginForm};

/// Authenticate, fetch permissions and store the signed token in the session.
///
/// A failed permission fetch still signs the principal in; their set stays
/// pending and every check denies until the next login.
async fn establish_session(
    form: &LoginForm,
    session: &Session,
    config: &HrxConfig,
    state: &HrxState,
) -> Result<PermissionStore, HrxError> {
    let email = form.email.trim();
    let password = form.password.trim();

    if email.is_empty() || password.is_empty() {
        return Err(HrxError::BadRequest("Email and password are required".into()));
    }
    if !email.contains('@') {
        return Err(HrxError::BadRequest("Invalid email format".into()));
    }

    let principal = state.auth.authenticate(email, password).await?;
    let store = PermissionStore::new(config.admin_role_id);
    store.login(principal.clone())?;

    if !store.is_loaded() {
        if let Err(err) = refresh_permissions(&store, state.permissions.as_ref()).await {
            warn!("Signing in {} with no permissions: {}", email, err);
        }
    }

    let token = create_jwt_token(&principal, store.permissions().as_ref(), config).map_err(|e| {
        error!("JWT generation failed for {}: {}", email, e);
        HrxError::InternalError
    })?;
    session.insert(SESSION_TOKEN_KEY, &token).map_err(|e| {
        error!("Session insertion failed: {}", e);
        HrxError::InternalError
    })?;

    info!("Login successful for: {}", email);
    Ok(store)
}

fn login_page(error: Option<&str>) -> HttpResponse {
    let mut ctx = create_base_context();
    ctx.insert("page_title", "Sign in");
    ctx.insert("error", &error);
    render_template("login.html.tera", ctx)
}

/// GET /hrx/login
pub async fn login_form(session: Session, config: web::Data<HrxConfig>) -> impl Responder {
    if extract_claims_from_session(&session, &config).is_ok() {
        return HttpResponse::Found()
            .append_header(("Location", "/hrx"))
            .finish();
    }
    login_page(None)
}

/// POST /hrx/login
pub async fn login_action(
    form: web::Form<LoginForm>,
    session: Session,
    config: web::Data<HrxConfig>,
    state: web::Data<HrxState>,
) -> impl Responder {
    match establish_session(&form, &session, &config, &state).await {
        Ok(_) => HttpResponse::Found()
            .append_header(("Location", "/hrx"))
            .finish(),
        Err(HrxError::BadRequest(message)) => login_page(Some(&message)),
        Err(HrxError::Unauthorized) => {
            warn!("Invalid credentials for: {}", form.email.trim());
            login_page(Some("Invalid email or password"))
        }
        Err(HrxError::Forbidden) => login_page(Some("This account is not active")),
        Err(err) => {
            error!("Login failed for {}: {}", form.email.trim(), err);
            login_page(Some("Sign in failed, please try again"))
        }
    }
}

/// POST /hrx/api/login
pub async fn api_login_action(
    form: web::Json<LoginForm>,
    session: Session,
    config: web::Data<HrxConfig>,
    state: web::Data<HrxState>,
) -> Result<HttpResponse, HrxError> {
    let store = establish_session(&form, &session, &config, &state).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(store.summary())))
}

/// GET|POST /hrx/logout
pub async fn logout_action(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Found()
        .append_header(("Location", "/hrx/login"))
        .finish()
}
