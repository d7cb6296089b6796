// hrx/src/helpers/guard_helper.rs
//! Permission-gated rendering: single action controls and whole regions.

use actix_web::HttpResponse;
use tera::Context;
use tracing::{error, warn};
use crate::helpers::template_helper::{access_denied_html, render_403, render_html};
use crate::permissions::{Action, GENERAL_MODULE};
use crate::store::PermissionEvaluator;

fn allowed<E>(evaluator: &E, module: &str, action: Action) -> bool
where
    E: PermissionEvaluator + ?Sized,
{
    match evaluator.evaluate(module, action) {
        Ok(decision) => decision.is_allowed(),
        Err(err) => {
            warn!("Permission check {}:{} failed, treating as denied: {}", module, action, err);
            false
        }
    }
}

/// A button or link that is only rendered when its action is permitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    pub module: String,
    pub action: Action,
    pub label: String,
    pub href: String,
    pub css_class: String,
}

impl ActionControl {
    pub fn new(module: &str, action: Action, label: &str) -> Self {
        Self {
            module: module.to_string(),
            action,
            label: label.to_string(),
            href: "#".to_string(),
            css_class: "hrx-btn".to_string(),
        }
    }

    /// A control not tied to any protected resource; always shown.
    pub fn general(label: &str) -> Self {
        Self::new(GENERAL_MODULE, Action::Read, label)
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = href.to_string();
        self
    }

    pub fn class(mut self, css_class: &str) -> Self {
        self.css_class = css_class.to_string();
        self
    }

    pub fn is_visible<E>(&self, evaluator: &E) -> bool
    where
        E: PermissionEvaluator + ?Sized,
    {
        self.module == GENERAL_MODULE || allowed(evaluator, &self.module, self.action)
    }

    /// Rendered HTML, or `None` when the control must be omitted entirely.
    pub fn render<E>(&self, evaluator: &E) -> Option<String>
    where
        E: PermissionEvaluator + ?Sized,
    {
        if !self.is_visible(evaluator) {
            return None;
        }
        let mut ctx = Context::new();
        ctx.insert("module", &self.module);
        ctx.insert("action", self.action.as_str());
        ctx.insert("label", &self.label);
        ctx.insert("href", &self.href);
        ctx.insert("css_class", &self.css_class);
        let html = render_html("controls/action_control.html.tera", &ctx).unwrap_or_else(|e| {
            error!("Action control template failed: {:?}", e);
            format!(
                "<a class=\"{}\" href=\"{}\">{}</a>",
                tera::escape_html(&self.css_class),
                tera::escape_html(&self.href),
                tera::escape_html(&self.label)
            )
        });
        Some(html)
    }
}

/// Render every visible control, in order.
pub fn render_controls<E>(controls: &[ActionControl], evaluator: &E) -> Vec<String>
where
    E: PermissionEvaluator + ?Sized,
{
    controls.iter().filter_map(|c| c.render(evaluator)).collect()
}

/// What a guarded region turns into for the current principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Granted,
    Redirect(String),
    AccessDenied,
    Fallback(String),
    Nothing,
}

/// Wraps a page region behind a `(module, action)` check.
///
/// On denial the first configured of redirect, access-denied message and
/// fallback wins; with none configured the region renders nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionGuard {
    pub module: String,
    pub action: Action,
    pub redirect_to: Option<String>,
    pub show_access_denied: bool,
    pub fallback: Option<String>,
}

impl RegionGuard {
    pub fn new(module: &str, action: Action) -> Self {
        Self {
            module: module.to_string(),
            action,
            redirect_to: None,
            show_access_denied: false,
            fallback: None,
        }
    }

    pub fn redirect_to(mut self, route: &str) -> Self {
        self.redirect_to = Some(route.to_string());
        self
    }

    pub fn show_access_denied(mut self) -> Self {
        self.show_access_denied = true;
        self
    }

    pub fn fallback(mut self, html: &str) -> Self {
        self.fallback = Some(html.to_string());
        self
    }

    pub fn resolve<E>(&self, evaluator: &E) -> GuardOutcome
    where
        E: PermissionEvaluator + ?Sized,
    {
        if allowed(evaluator, &self.module, self.action) {
            return GuardOutcome::Granted;
        }
        if let Some(route) = &self.redirect_to {
            GuardOutcome::Redirect(route.clone())
        } else if self.show_access_denied {
            GuardOutcome::AccessDenied
        } else if let Some(html) = &self.fallback {
            GuardOutcome::Fallback(html.clone())
        } else {
            GuardOutcome::Nothing
        }
    }

    /// Render the region as an HTML fragment.
    pub fn render<E, F>(&self, evaluator: &E, content: F) -> String
    where
        E: PermissionEvaluator + ?Sized,
        F: FnOnce() -> String,
    {
        match self.resolve(evaluator) {
            GuardOutcome::Granted => content(),
            GuardOutcome::Redirect(location) => {
                let mut ctx = Context::new();
                ctx.insert("location", &location);
                render_html("partials/redirect.html.tera", &ctx).unwrap_or_else(|e| {
                    error!("Redirect template failed: {:?}", e);
                    String::new()
                })
            }
            GuardOutcome::AccessDenied => access_denied_html(),
            GuardOutcome::Fallback(html) => html,
            GuardOutcome::Nothing => String::new(),
        }
    }

    /// Guard a whole page.
    pub fn respond<E, F>(&self, evaluator: &E, content: F) -> HttpResponse
    where
        E: PermissionEvaluator + ?Sized,
        F: FnOnce() -> HttpResponse,
    {
        match self.resolve(evaluator) {
            GuardOutcome::Granted => content(),
            GuardOutcome::Redirect(location) => HttpResponse::Found()
                .append_header(("Location", location))
                .finish(),
            GuardOutcome::AccessDenied => render_403(),
            GuardOutcome::Fallback(html) => HttpResponse::Ok().content_type("text/html").body(html),
            GuardOutcome::Nothing => HttpResponse::NoContent().finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrxError;
    use crate::models::principal::{Principal, RoleRef};
    use crate::permissions::Decision;
    use crate::store::PermissionStore;
    use actix_web::http::StatusCode;

    struct Broken;

    impl PermissionEvaluator for Broken {
        fn evaluate(&self, _module: &str, _action: Action) -> Result<Decision, HrxError> {
            Err(HrxError::Evaluator("caller bug".into()))
        }
    }

    fn store(grants: &[&str]) -> PermissionStore {
        let store = PermissionStore::default();
        store
            .login(Principal {
                id: "5".into(),
                name: "Anu".into(),
                email: "anu@example.com".into(),
                role: RoleRef::Id(4),
                is_admin: false,
            })
            .unwrap();
        store
            .load_permissions(grants.iter().map(|g| g.parse().unwrap()))
            .unwrap();
        store
    }

    #[test]
    fn test_control_rendered_when_allowed() {
        let control = ActionControl::new("leave", Action::Create, "Apply").href("/hrx/leave/apply");
        let html = control.render(&store(&["leave:create"])).unwrap();
        assert!(html.contains("Apply"));
        assert!(html.contains("data-action=\"create\""));
    }

    #[test]
    fn test_control_omitted_when_denied() {
        let control = ActionControl::new("payroll", Action::Manage, "Run payroll");
        assert_eq!(control.render(&store(&["payroll:read"])), None);
        assert_eq!(control.render(&Broken), None);
    }

    #[test]
    fn test_general_control_always_visible() {
        let control = ActionControl::general("Help");
        assert!(control.is_visible(&PermissionStore::default()));
        assert!(control.is_visible(&Broken));
        assert!(control.render(&Broken).is_some());
    }

    #[test]
    fn test_render_controls_keeps_order() {
        let controls = vec![
            ActionControl::new("leave", Action::Read, "View"),
            ActionControl::new("leave", Action::Delete, "Delete"),
            ActionControl::general("Help"),
        ];
        let html = render_controls(&controls, &store(&["leave:read"]));
        assert_eq!(html.len(), 2);
        assert!(html[0].contains("View"));
        assert!(html[1].contains("Help"));
    }

    #[test]
    fn test_region_fallback_priority() {
        let denied = store(&[]);
        let full = RegionGuard::new("payroll", Action::Read)
            .redirect_to("/hrx")
            .show_access_denied()
            .fallback("<p>n/a</p>");
        assert_eq!(full.resolve(&denied), GuardOutcome::Redirect("/hrx".into()));

        let no_redirect = RegionGuard::new("payroll", Action::Read)
            .show_access_denied()
            .fallback("<p>n/a</p>");
        assert_eq!(no_redirect.resolve(&denied), GuardOutcome::AccessDenied);

        let fallback_only = RegionGuard::new("payroll", Action::Read).fallback("<p>n/a</p>");
        assert_eq!(fallback_only.resolve(&denied), GuardOutcome::Fallback("<p>n/a</p>".into()));

        let bare = RegionGuard::new("payroll", Action::Read);
        assert_eq!(bare.resolve(&denied), GuardOutcome::Nothing);
        assert_eq!(bare.render(&denied, || "secret".into()), "");
    }

    #[test]
    fn test_region_granted_renders_content() {
        let guard = RegionGuard::new("payroll", Action::Read).show_access_denied();
        assert_eq!(guard.render(&store(&["payroll:read"]), || "payslips".into()), "payslips");
    }

    #[test]
    fn test_region_evaluator_error_is_denial() {
        let guard = RegionGuard::new("payroll", Action::Read).fallback("<p>hidden</p>");
        assert_eq!(guard.render(&Broken, || "secret".into()), "<p>hidden</p>");
    }

    #[test]
    fn test_region_responses() {
        let denied = store(&[]);
        let ok = || HttpResponse::Ok().finish();

        let redirect = RegionGuard::new("users", Action::Read).redirect_to("/hrx/login");
        let response = redirect.respond(&denied, ok);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get("Location").unwrap(), "/hrx/login");

        let forbidden = RegionGuard::new("users", Action::Read).show_access_denied();
        assert_eq!(forbidden.respond(&denied, ok).status(), StatusCode::FORBIDDEN);

        let nothing = RegionGuard::new("users", Action::Read);
        assert_eq!(nothing.respond(&denied, ok).status(), StatusCode::NO_CONTENT);

        let granted = store(&["users:read"]);
        assert_eq!(nothing.respond(&granted, ok).status(), StatusCode::OK);
    }
}
