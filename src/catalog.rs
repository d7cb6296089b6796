// hrx/src/catalog.rs
//! Built-in modules and navigation of the HR administration console.

use crate::error::HrxError;
use crate::menu::MenuConfig;
use crate::permissions::Action;
use crate::registry::ModuleRegistry;

const DEFAULT_MENU: &str = include_str!("../config/default_menu.json");

const MODULES: &[(&str, &str)] = &[
    ("employees", "Employees"),
    ("onboarding", "Onboarding"),
    ("bank_details", "Bank Details"),
    ("leave", "Leave"),
    ("payroll", "Payroll"),
    ("credit_cards", "Credit Cards"),
    ("loans", "Loans"),
    ("insurance", "Insurance"),
    ("imports", "Excel Import/Export"),
    ("users", "Users"),
    ("roles", "Roles & Permissions"),
    ("calling_admin", "Calling Admin"),
];

pub fn default_registry() -> Result<ModuleRegistry, HrxError> {
    let mut registry = ModuleRegistry::new();
    for (id, label) in MODULES {
        registry.register(id, label)?;
    }
    // Reports are read-only.
    registry.register_with_actions("reports", "Reports", vec![Action::Read])?;
    Ok(registry)
}

pub fn default_menu(registry: &ModuleRegistry) -> Result<MenuConfig, HrxError> {
    MenuConfig::from_json_str(DEFAULT_MENU, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{filter_menu, filter_menu_by_role, MenuEntry};
    use crate::models::principal::{Principal, RoleRef};
    use crate::store::PermissionStore;

    fn principal(role_id: i64) -> Principal {
        Principal {
            id: "7".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role: RoleRef::Id(role_id),
            is_admin: false,
        }
    }

    fn visible_titles(grants: &[&str]) -> Vec<String> {
        let registry = default_registry().unwrap();
        let menu = default_menu(&registry).unwrap();
        let store = PermissionStore::default();
        store.login(principal(6)).unwrap();
        store
            .load_permissions(grants.iter().map(|g| g.parse().unwrap()))
            .unwrap();
        filter_menu(menu.entries(), &store)
            .into_iter()
            .flat_map(|s| s.items.into_iter().map(|i| i.title))
            .collect()
    }

    #[test]
    fn test_default_menu_is_valid() {
        let registry = default_registry().unwrap();
        let menu = default_menu(&registry).unwrap();
        assert!(matches!(menu.entries()[0], MenuEntry::Heading(_)));
        assert!(registry.contains("calling_admin"));
    }

    #[test]
    fn test_employee_role_sees_self_service_only() {
        let registry = default_registry().unwrap();
        let menu = default_menu(&registry).unwrap();
        let employee = principal(4);
        let sections = filter_menu_by_role(menu.entries(), Some(&employee), 1);
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.title.as_str()).collect();
        assert_eq!(headings, vec!["Overview", "Employees", "Leave"]);
    }

    #[test]
    fn test_users_link_needs_the_admin_scope_grant() {
        assert!(!visible_titles(&["users:read"]).contains(&"Users".to_string()));
        assert!(visible_titles(&["users:manage"]).contains(&"Users".to_string()));
    }
}
