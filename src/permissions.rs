// hrx/src/permissions.rs
//! Typed permission vocabulary: modules, actions, entries and decisions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Module value that bypasses permission checks on action controls.
pub const GENERAL_MODULE: &str = "general";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionParseError {
    #[error("unknown action '{0}' (expected read, create, update, delete or manage)")]
    UnknownAction(String),
    #[error("invalid module identifier '{0}'")]
    InvalidModule(String),
    #[error("malformed permission '{0}' (expected module:action)")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Action {
    #[default]
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "manage" => Ok(Action::Manage),
            other => Err(PermissionParseError::UnknownAction(other.to_string())),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A protected resource category such as `users` or `calling_admin`.
///
/// Identifiers are lowercase ascii letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(raw: &str) -> Result<Self, PermissionParseError> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(PermissionParseError::InvalidModule(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_general(&self) -> bool {
        self.0 == GENERAL_MODULE
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleId {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleId::new(s.trim())
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One granted `(module, action)` pair. Textual form is `module:action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PermissionEntry {
    pub module: ModuleId,
    pub action: Action,
}

impl PermissionEntry {
    pub fn new(module: ModuleId, action: Action) -> Self {
        Self { module, action }
    }
}

impl fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

impl FromStr for PermissionEntry {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once(':')
            .ok_or_else(|| PermissionParseError::Malformed(s.to_string()))?;
        Ok(Self {
            module: module.parse()?,
            action: action.parse()?,
        })
    }
}

// Backends send either "users:read" or {"module": "users", "action": "read"}.
impl<'de> Deserialize<'de> for PermissionEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Pair { module: ModuleId, #[serde(default)] action: Action },
        }

        match Wire::deserialize(deserializer)? {
            Wire::Text(raw) => raw.parse().map_err(serde::de::Error::custom),
            Wire::Pair { module, action } => Ok(PermissionEntry { module, action }),
        }
    }
}

/// Outcome of a single permission query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allowed,
    Denied,
    /// No principal yet, or the permission set has not loaded.
    Indeterminate,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Denied => "denied",
            Decision::Indeterminate => "indeterminate",
        }
    }
}

/// The effective permission set of one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    entries: HashSet<PermissionEntry>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: PermissionEntry) -> bool {
        self.entries.insert(entry)
    }

    /// Strings that are not valid module identifiers are never contained.
    pub fn contains(&self, module: &str, action: Action) -> bool {
        match ModuleId::new(module) {
            Ok(module) => self.entries.contains(&PermissionEntry { module, action }),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as sorted `module:action` strings, used for session claims.
    pub fn to_strings(&self) -> Vec<String> {
        let mut sorted: Vec<&PermissionEntry> = self.entries.iter().collect();
        sorted.sort();
        sorted.into_iter().map(|e| e.to_string()).collect()
    }
}

impl FromIterator<PermissionEntry> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("read".parse::<Action>().unwrap(), Action::Read);
        assert_eq!("MANAGE".parse::<Action>().unwrap(), Action::Manage);
        assert_eq!("".parse::<Action>().unwrap(), Action::Read);
        assert!("approve".parse::<Action>().is_err());
    }

    #[test]
    fn test_module_id_validation() {
        assert!(ModuleId::new("calling_admin").is_ok());
        assert!(ModuleId::new("users2").is_ok());
        assert!(ModuleId::new("").is_err());
        assert!(ModuleId::new("Users").is_err());
        assert!(ModuleId::new("bank-details").is_err());
    }

    #[test]
    fn test_entry_wire_forms() {
        let text: PermissionEntry = serde_json::from_str("\"users:create\"").unwrap();
        let pair: PermissionEntry =
            serde_json::from_str(r#"{"module": "users", "action": "create"}"#).unwrap();
        assert_eq!(text, pair);
        assert_eq!(text.to_string(), "users:create");

        let defaulted: PermissionEntry = serde_json::from_str(r#"{"module": "loans"}"#).unwrap();
        assert_eq!(defaulted.action, Action::Read);

        assert!(serde_json::from_str::<PermissionEntry>("\"users\"").is_err());
    }

    #[test]
    fn test_duplicate_entries_are_idempotent() {
        let mut set = PermissionSet::new();
        let entry: PermissionEntry = "payroll:read".parse().unwrap();
        assert!(set.insert(entry.clone()));
        assert!(!set.insert(entry));
        assert_eq!(set.len(), 1);
        assert!(set.contains("payroll", Action::Read));
        assert!(!set.contains("payroll", Action::Update));
    }

    #[test]
    fn test_contains_looks_up_exact_entry() {
        let set: PermissionSet = vec!["loans:read".parse().unwrap(), "leave:manage".parse().unwrap()]
            .into_iter()
            .collect();
        assert!(set.contains("loans", Action::Read));
        assert!(!set.contains("loans", Action::Manage));
        assert!(!set.contains("leave", Action::Read));
        assert!(!set.contains("Loans", Action::Read));
        assert!(!set.contains("", Action::Read));
        assert!(!set.contains("loans:read", Action::Read));
    }
}
