// hrx/src/registry.rs
use crate::error::HrxError;
use crate::permissions::{Action, ModuleId, GENERAL_MODULE};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub id: ModuleId,
    pub label: String,
    pub actions: Vec<Action>,
}

/// Known modules and the actions each one exposes. Menu and role
/// configuration is checked against this when it is loaded.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleDefinition>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module with every action.
    pub fn register(&mut self, id: &str, label: &str) -> Result<(), HrxError> {
        self.register_with_actions(id, label, Action::ALL.to_vec())
    }

    pub fn register_with_actions(
        &mut self,
        id: &str,
        label: &str,
        actions: Vec<Action>,
    ) -> Result<(), HrxError> {
        let module = ModuleId::new(id).map_err(|e| HrxError::Config(e.to_string()))?;
        self.modules.insert(
            id.to_string(),
            ModuleDefinition {
                id: module,
                label: label.to_string(),
                actions,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDefinition> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        id == GENERAL_MODULE || self.modules.contains_key(id)
    }

    /// Check that `module` is registered and exposes `action`.
    pub fn validate(&self, module: &ModuleId, action: Action) -> Result<(), HrxError> {
        if module.is_general() {
            return Ok(());
        }
        let definition = self
            .modules
            .get(module.as_str())
            .ok_or_else(|| HrxError::Config(format!("unknown module '{}'", module)))?;
        if !definition.actions.contains(&action) {
            return Err(HrxError::Config(format!(
                "module '{}' has no action '{}'",
                module, action
            )));
        }
        Ok(())
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_registered_module() {
        let mut registry = ModuleRegistry::new();
        registry.register("users", "Users").unwrap();
        registry
            .register_with_actions("reports", "Reports", vec![Action::Read])
            .unwrap();

        let users = ModuleId::new("users").unwrap();
        let reports = ModuleId::new("reports").unwrap();
        assert!(registry.validate(&users, Action::Delete).is_ok());
        assert!(registry.validate(&reports, Action::Read).is_ok());
        assert!(registry.validate(&reports, Action::Delete).is_err());
    }

    #[test]
    fn test_unknown_module_rejected() {
        let registry = ModuleRegistry::new();
        let loans = ModuleId::new("loans").unwrap();
        let err = registry.validate(&loans, Action::Read).unwrap_err();
        assert_eq!(err, HrxError::Config("unknown module 'loans'".into()));
    }

    #[test]
    fn test_general_always_known() {
        let registry = ModuleRegistry::new();
        assert!(registry.contains("general"));
        let general = ModuleId::new("general").unwrap();
        assert!(registry.validate(&general, Action::Manage).is_ok());
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.register("Bank Details", "Bank").is_err());
        assert!(registry.is_empty());
    }
}
