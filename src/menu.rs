// hrx/src/menu.rs

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use crate::error::HrxError;
use crate::models::principal::Principal;
use crate::permissions::{Action, ModuleId};
use crate::registry::ModuleRegistry;
use crate::store::PermissionEvaluator;

/// A `(module, action)` pair an entry needs before it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub module: ModuleId,
    #[serde(default)]
    pub action: Action,
}

impl Requirement {
    pub fn new(module: &str, action: Action) -> Result<Self, HrxError> {
        let module = ModuleId::new(module).map_err(|e| HrxError::Config(e.to_string()))?;
        Ok(Self { module, action })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuHeading {
    pub title: String,
    /// Declared alongside the heading but not evaluated by either filter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MenuEntry {
    Heading(MenuHeading),
    Item(MenuItem),
}

impl MenuEntry {
    pub fn heading(title: &str) -> Self {
        MenuEntry::Heading(MenuHeading {
            title: title.to_string(),
            requires: Vec::new(),
        })
    }

    pub fn item(title: &str, path: &str) -> Self {
        MenuEntry::Item(MenuItem {
            title: title.to_string(),
            path: path.to_string(),
            icon: None,
            requires: None,
            roles: None,
        })
    }

    /// Attach a permission requirement to an item. Headings are returned as-is.
    pub fn requiring(mut self, module: &str, action: Action) -> Result<Self, HrxError> {
        if let MenuEntry::Item(item) = &mut self {
            item.requires = Some(Requirement::new(module, action)?);
        }
        Ok(self)
    }

    /// Restrict an item to the given role IDs. Headings are returned as-is.
    pub fn for_roles(mut self, roles: &[i64]) -> Self {
        if let MenuEntry::Item(item) = &mut self {
            item.roles = Some(roles.to_vec());
        }
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        if let MenuEntry::Item(item) = &mut self {
            item.icon = Some(icon.to_string());
        }
        self
    }

    pub fn title(&self) -> &str {
        match self {
            MenuEntry::Heading(h) => &h.title,
            MenuEntry::Item(i) => &i.title,
        }
    }
}

/// A heading together with the items that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub heading: MenuHeading,
    pub items: Vec<MenuItem>,
}

/// Turn filtered sections back into a flat, declaration-ordered entry list.
pub fn flatten(sections: &[MenuSection]) -> Vec<MenuEntry> {
    sections
        .iter()
        .flat_map(|section| {
            std::iter::once(MenuEntry::Heading(section.heading.clone()))
                .chain(section.items.iter().cloned().map(MenuEntry::Item))
        })
        .collect()
}

fn group_visible<F>(entries: &[MenuEntry], mut include: F) -> Vec<MenuSection>
where
    F: FnMut(&MenuItem) -> bool,
{
    let mut sections = Vec::new();
    let mut current: Option<MenuSection> = None;

    for entry in entries {
        match entry {
            MenuEntry::Heading(heading) => {
                if let Some(section) = current.take() {
                    if !section.items.is_empty() {
                        sections.push(section);
                    }
                }
                current = Some(MenuSection {
                    heading: heading.clone(),
                    items: Vec::new(),
                });
            }
            MenuEntry::Item(item) => match current.as_mut() {
                Some(section) => {
                    if include(item) {
                        section.items.push(item.clone());
                    }
                }
                None => debug!("Dropping menu item '{}' declared before any heading", item.title),
            },
        }
    }

    if let Some(section) = current {
        if !section.items.is_empty() {
            sections.push(section);
        }
    }

    sections
}

/// Permission-aware filter: items with a requirement are kept only when the
/// evaluator allows it; items without one are always kept.
pub fn filter_menu<E>(entries: &[MenuEntry], evaluator: &E) -> Vec<MenuSection>
where
    E: PermissionEvaluator + ?Sized,
{
    group_visible(entries, |item| match &item.requires {
        None => true,
        Some(req) => match evaluator.evaluate(req.module.as_str(), req.action) {
            Ok(decision) => decision.is_allowed(),
            Err(err) => {
                warn!(
                    "Hiding menu item '{}': permission check {}:{} failed: {}",
                    item.title, req.module, req.action, err
                );
                false
            }
        },
    })
}

/// Role-list filter: items with a `roles` list are kept only when the
/// principal's role is in it. Admins, by role or by flag, see everything.
pub fn filter_menu_by_role(
    entries: &[MenuEntry],
    principal: Option<&Principal>,
    admin_role_id: i64,
) -> Vec<MenuSection> {
    let is_admin = principal.is_some_and(|p| p.is_admin(admin_role_id));
    let role_id = principal.and_then(Principal::role_id);
    group_visible(entries, |item| {
        if is_admin {
            return true;
        }
        match (&item.roles, role_id) {
            (None, _) => true,
            (Some(roles), Some(role)) => roles.contains(&role),
            (Some(_), None) => false,
        }
    })
}

/// Ordered menu declaration, validated against a module registry on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuConfig {
    entries: Vec<MenuEntry>,
}

impl MenuConfig {
    pub fn new(entries: Vec<MenuEntry>, registry: &ModuleRegistry) -> Result<Self, HrxError> {
        let config = Self { entries };
        config.validate(registry)?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str, registry: &ModuleRegistry) -> Result<Self, HrxError> {
        let entries: Vec<MenuEntry> = serde_json::from_str(raw)
            .map_err(|e| HrxError::Config(format!("invalid menu definition: {}", e)))?;
        Self::new(entries, registry)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, registry: &ModuleRegistry) -> Result<Self, HrxError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HrxError::Config(format!("cannot read menu file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw, registry)
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    fn validate(&self, registry: &ModuleRegistry) -> Result<(), HrxError> {
        for (index, entry) in self.entries.iter().enumerate() {
            let requirements: Vec<&Requirement> = match entry {
                MenuEntry::Heading(h) => h.requires.iter().collect(),
                MenuEntry::Item(i) => {
                    if !i.path.starts_with('/') {
                        return Err(HrxError::Config(format!(
                            "menu entry #{} '{}': path '{}' must start with '/'",
                            index, i.title, i.path
                        )));
                    }
                    i.requires.iter().collect()
                }
            };
            for req in requirements {
                registry.validate(&req.module, req.action).map_err(|e| {
                    HrxError::Config(format!("menu entry #{} '{}': {}", index, entry.title(), e))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principal::RoleRef;
    use crate::permissions::Decision;
    use crate::store::PermissionStore;

    struct Broken;

    impl PermissionEvaluator for Broken {
        fn evaluate(&self, _module: &str, _action: Action) -> Result<Decision, HrxError> {
            Err(HrxError::Evaluator("backend exploded".into()))
        }
    }

    fn sample_entries() -> Vec<MenuEntry> {
        vec![
            MenuEntry::heading("A"),
            MenuEntry::item("A1", "/a1").requiring("users", Action::Read).unwrap(),
            MenuEntry::item("A2", "/a2").requiring("roles", Action::Read).unwrap(),
            MenuEntry::heading("B"),
            MenuEntry::item("B1", "/b1"),
        ]
    }

    fn principal(role: RoleRef, is_admin: bool) -> Principal {
        Principal {
            id: "1".into(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role,
            is_admin,
        }
    }

    fn store_with(role: i64, grants: &[&str]) -> PermissionStore {
        let store = PermissionStore::default();
        store.login(principal(RoleRef::Id(role), false)).unwrap();
        store
            .load_permissions(grants.iter().map(|g| g.parse().unwrap()))
            .unwrap();
        store
    }

    fn titles(entries: &[MenuEntry]) -> Vec<&str> {
        entries.iter().map(MenuEntry::title).collect()
    }

    #[test]
    fn test_partial_grant_keeps_heading() {
        let store = store_with(5, &["users:read"]);
        let visible = flatten(&filter_menu(&sample_entries(), &store));
        assert_eq!(titles(&visible), vec!["A", "A1", "B", "B1"]);
    }

    #[test]
    fn test_no_grant_drops_heading() {
        let store = store_with(5, &[]);
        let visible = flatten(&filter_menu(&sample_entries(), &store));
        assert_eq!(titles(&visible), vec!["B", "B1"]);
    }

    #[test]
    fn test_admin_sees_full_menu() {
        let store = store_with(1, &[]);
        let entries = sample_entries();
        assert_eq!(flatten(&filter_menu(&entries, &store)), entries);
    }

    #[test]
    fn test_unauthenticated_sees_only_open_items() {
        let store = PermissionStore::default();
        let visible = flatten(&filter_menu(&sample_entries(), &store));
        assert_eq!(titles(&visible), vec!["B", "B1"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let store = store_with(5, &["roles:read"]);
        let entries = sample_entries();
        let first = filter_menu(&entries, &store);
        let second = filter_menu(&entries, &store);
        assert_eq!(first, second);
        assert_eq!(filter_menu(&flatten(&first), &store), first);
    }

    #[test]
    fn test_order_preserved() {
        let entries = vec![
            MenuEntry::heading("Z"),
            MenuEntry::item("z2", "/z2"),
            MenuEntry::item("z1", "/z1"),
            MenuEntry::heading("A"),
            MenuEntry::item("a9", "/a9"),
        ];
        let store = store_with(5, &[]);
        let visible = flatten(&filter_menu(&entries, &store));
        assert_eq!(titles(&visible), vec!["Z", "z2", "z1", "A", "a9"]);
    }

    #[test]
    fn test_item_before_heading_dropped() {
        let mut entries = vec![MenuEntry::item("orphan", "/orphan")];
        entries.extend(sample_entries());
        let store = store_with(1, &[]);
        let visible = flatten(&filter_menu(&entries, &store));
        assert!(!titles(&visible).contains(&"orphan"));
        assert_eq!(visible.len(), 5);
    }

    #[test]
    fn test_evaluator_error_hides_item() {
        let visible = flatten(&filter_menu(&sample_entries(), &Broken));
        assert_eq!(titles(&visible), vec!["B", "B1"]);
    }

    #[test]
    fn test_role_filter() {
        let entries = vec![
            MenuEntry::heading("Payroll"),
            MenuEntry::item("Run payroll", "/payroll/run").for_roles(&[2, 3]),
            MenuEntry::item("Payslips", "/payroll/slips").for_roles(&[3, 4]),
            MenuEntry::heading("Admin"),
            MenuEntry::item("Roles", "/roles").for_roles(&[1]),
        ];

        let two = principal(RoleRef::Id(2), false);
        let for_two = flatten(&filter_menu_by_role(&entries, Some(&two), 1));
        assert_eq!(titles(&for_two), vec!["Payroll", "Run payroll"]);

        let admin = principal(RoleRef::Id(1), false);
        let for_admin = flatten(&filter_menu_by_role(&entries, Some(&admin), 1));
        assert_eq!(for_admin, entries);

        let anonymous = filter_menu_by_role(&entries, None, 1);
        assert!(anonymous.is_empty());
    }

    #[test]
    fn test_admin_flag_sees_full_menu_in_both_modes() {
        let entries = vec![
            MenuEntry::heading("Admin"),
            MenuEntry::item("Roles", "/roles")
                .requiring("roles", Action::Manage)
                .unwrap()
                .for_roles(&[]),
        ];
        let flagged = principal(RoleRef::Id(5), true);

        let store = PermissionStore::default();
        store.login(flagged.clone()).unwrap();
        assert_eq!(flatten(&filter_menu(&entries, &store)), entries);

        let by_role = flatten(&filter_menu_by_role(&entries, Some(&flagged), 1));
        assert_eq!(by_role, entries);
    }

    #[test]
    fn test_role_filter_without_role_id() {
        let entries = vec![
            MenuEntry::heading("Leave"),
            MenuEntry::item("My Leave", "/leave"),
            MenuEntry::item("Approvals", "/leave/approvals").for_roles(&[2]),
        ];
        let unnumbered = principal(
            RoleRef::Named { id: None, name: "Contractor".into(), permissions: vec![] },
            false,
        );
        let visible = flatten(&filter_menu_by_role(&entries, Some(&unnumbered), 1));
        assert_eq!(titles(&visible), vec!["Leave", "My Leave"]);
    }

    #[test]
    fn test_role_filter_ignores_heading_requirements() {
        let entries = vec![
            MenuEntry::Heading(MenuHeading {
                title: "Finance".into(),
                requires: vec![Requirement::new("loans", Action::Manage).unwrap()],
            }),
            MenuEntry::item("Loans", "/loans").for_roles(&[4]),
        ];
        let employee = principal(RoleRef::Id(4), false);
        let visible = filter_menu_by_role(&entries, Some(&employee), 1);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].heading.title, "Finance");
    }

    #[test]
    fn test_config_from_json() {
        let mut registry = ModuleRegistry::new();
        registry.register("users", "Users").unwrap();
        let raw = r#"[
            {"kind": "heading", "title": "Administration"},
            {"kind": "item", "title": "Users", "path": "/users",
             "requires": {"module": "users", "action": "read"}},
            {"kind": "item", "title": "Help", "path": "/help", "roles": [2, 3]}
        ]"#;
        let config = MenuConfig::from_json_str(raw, &registry).unwrap();
        assert_eq!(config.entries().len(), 3);
        match &config.entries()[1] {
            MenuEntry::Item(item) => {
                assert_eq!(item.requires.as_ref().unwrap().module.as_str(), "users");
            }
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_unknown_module() {
        let registry = ModuleRegistry::new();
        let raw = r#"[
            {"kind": "heading", "title": "Finance"},
            {"kind": "item", "title": "Loans", "path": "/loans",
             "requires": {"module": "loans", "action": "read"}}
        ]"#;
        let err = MenuConfig::from_json_str(raw, &registry).unwrap_err();
        assert!(err.to_string().contains("menu entry #1 'Loans'"));
    }

    #[test]
    fn test_config_rejects_unknown_action() {
        let mut registry = ModuleRegistry::new();
        registry.register("loans", "Loans").unwrap();
        let raw = r#"[
            {"kind": "heading", "title": "Finance"},
            {"kind": "item", "title": "Loans", "path": "/loans",
             "requires": {"module": "loans", "action": "approve"}}
        ]"#;
        assert!(MenuConfig::from_json_str(raw, &registry).is_err());
    }

    #[test]
    fn test_config_from_path() {
        use std::io::Write;

        let mut registry = ModuleRegistry::new();
        registry.register("leave", "Leave").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"kind": "heading", "title": "Leave"}},
               {{"kind": "item", "title": "Apply", "path": "/leave/apply",
                 "requires": {{"module": "leave", "action": "create"}}}}]"#
        )
        .unwrap();

        let config = MenuConfig::from_path(file.path(), &registry).unwrap();
        assert_eq!(config.entries().len(), 2);
        assert!(MenuConfig::from_path("/definitely/not/here.json", &registry).is_err());
    }
}
