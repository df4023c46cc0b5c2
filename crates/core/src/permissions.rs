//! Admin roles and the per-module capability map.
//!
//! The backend sends permissions as a list of
//! `{ module, read, create, update, delete }` objects. They are folded into
//! a [`CapabilityMap`] keyed by [`Module`] so every check goes through
//! [`CapabilityMap::authorize`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_SUPER_ADMIN: &str = "superAdmin";
pub const ROLE_ADMIN: &str = "admin";

/// Dashboard areas that carry their own permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Cars,
    Brands,
    Models,
    ModelTypes,
    Specs,
    Locations,
    News,
    Notifications,
    Admins,
}

impl Module {
    pub const ALL: [Module; 9] = [
        Self::Cars,
        Self::Brands,
        Self::Models,
        Self::ModelTypes,
        Self::Specs,
        Self::Locations,
        Self::News,
        Self::Notifications,
        Self::Admins,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cars => "cars",
            Self::Brands => "brands",
            Self::Models => "models",
            Self::ModelTypes => "model_types",
            Self::Specs => "specs",
            Self::Locations => "locations",
            Self::News => "news",
            Self::Notifications => "notifications",
            Self::Admins => "admins",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = CoreError;

    /// Accepts the snake_case name plus the backend's historical spellings
    /// (`brand`, `modelTypes`, `location`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "car" | "cars" => Ok(Self::Cars),
            "brand" | "brands" => Ok(Self::Brands),
            "model" | "models" => Ok(Self::Models),
            "modeltype" | "modeltypes" => Ok(Self::ModelTypes),
            "spec" | "specs" | "specifications" | "variants" => Ok(Self::Specs),
            "location" | "locations" => Ok(Self::Locations),
            "news" => Ok(Self::News),
            "notification" | "notifications" => Ok(Self::Notifications),
            "admin" | "admins" => Ok(Self::Admins),
            _ => Err(CoreError::Validation(format!("Unknown permission module '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Flags for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
}

impl Capabilities {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

/// Wire entry: `{ module, read, create, update, delete }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub module: String,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

/// Capabilities of the signed-in admin, per module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PermissionEntry>", into = "Vec<PermissionEntry>")]
pub struct CapabilityMap {
    modules: HashMap<Module, Capabilities>,
}

impl From<Vec<PermissionEntry>> for CapabilityMap {
    /// Unknown modules are skipped. Repeated modules are merged (any grant wins).
    fn from(entries: Vec<PermissionEntry>) -> Self {
        let mut modules: HashMap<Module, Capabilities> = HashMap::new();
        for entry in entries {
            let Ok(module) = entry.module.parse::<Module>() else {
                continue;
            };
            let caps = modules.entry(module).or_default();
            caps.read |= entry.capabilities.read;
            caps.create |= entry.capabilities.create;
            caps.update |= entry.capabilities.update;
            caps.delete |= entry.capabilities.delete;
        }
        Self { modules }
    }
}

impl From<CapabilityMap> for Vec<PermissionEntry> {
    fn from(map: CapabilityMap) -> Self {
        let mut entries: Vec<(Module, Capabilities)> = map.modules.into_iter().collect();
        entries.sort_by_key(|(module, _)| *module);
        entries
            .into_iter()
            .map(|(module, capabilities)| PermissionEntry {
                module: module.as_str().to_string(),
                capabilities,
            })
            .collect()
    }
}

impl CapabilityMap {
    pub fn grant(&mut self, module: Module, capabilities: Capabilities) {
        self.modules.insert(module, capabilities);
    }

    pub fn get(&self, module: Module) -> Capabilities {
        self.modules.get(&module).copied().unwrap_or_default()
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.get(module).allows(action)
    }

    /// The single authorization check used by every screen.
    pub fn authorize(&self, module: Module, action: Action) -> Result<(), CoreError> {
        if self.allows(module, action) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "You do not have permission to {action} {module}"
            )))
        }
    }

    /// Modules the admin can at least read, for navigation.
    pub fn readable_modules(&self) -> Vec<Module> {
        Module::ALL
            .into_iter()
            .filter(|m| self.allows(*m, Action::Read))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_list_becomes_typed_map() {
        let map: CapabilityMap = serde_json::from_value(json!([
            {"module": "brand", "read": true, "create": true, "update": false, "delete": false},
            {"module": "modelTypes", "read": true},
            {"module": "dealerships", "read": true}
        ]))
        .unwrap();
        assert!(map.allows(Module::Brands, Action::Create));
        assert!(!map.allows(Module::Brands, Action::Delete));
        assert!(map.allows(Module::ModelTypes, Action::Read));
        assert!(!map.allows(Module::Cars, Action::Read));
        assert_eq!(map.readable_modules(), vec![Module::Brands, Module::ModelTypes]);
    }

    #[test]
    fn authorize_names_action_and_module() {
        let map = CapabilityMap::default();
        let err = map.authorize(Module::News, Action::Delete).unwrap_err();
        assert_eq!(
            err,
            CoreError::Forbidden("You do not have permission to delete news".into())
        );
    }

    #[test]
    fn repeated_modules_merge_grants() {
        let map = CapabilityMap::from(vec![
            PermissionEntry {
                module: "cars".into(),
                capabilities: Capabilities {
                    read: true,
                    ..Capabilities::default()
                },
            },
            PermissionEntry {
                module: "car".into(),
                capabilities: Capabilities {
                    delete: true,
                    ..Capabilities::default()
                },
            },
        ]);
        assert!(map.allows(Module::Cars, Action::Read));
        assert!(map.allows(Module::Cars, Action::Delete));
    }

    #[test]
    fn serializes_back_to_sorted_list() {
        let mut map = CapabilityMap::default();
        map.grant(Module::Specs, Capabilities { read: true, ..Default::default() });
        map.grant(Module::Cars, Capabilities { read: true, ..Default::default() });
        let wire = serde_json::to_value(&map).unwrap();
        assert_eq!(wire[0]["module"], "cars");
        assert_eq!(wire[1]["module"], "specs");
        assert_eq!(wire[1]["read"], true);
    }
}
