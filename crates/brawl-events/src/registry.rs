//! Action registry — maps action kind names to factories.
//!
//! An explicit object, constructed once at startup and passed by reference
//! wherever lookups happen. Lookups run at config-load time only; resolved
//! instances are cached in the scheduler catalogs, never re-resolved at
//! fire time. Registering an existing name overwrites silently — embedders
//! adding kinds must police their own names.

use std::collections::HashMap;
use std::sync::Arc;

use brawl_core::Result;

use crate::action::EventAction;
use crate::types;

/// Builds an action instance from its parsed parameters.
pub type ActionFactory =
    Box<dyn Fn(HashMap<String, String>) -> Result<Arc<dyn EventAction>> + Send + Sync>;

/// Registry of all known action kinds.
pub struct ActionRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in action catalog.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        types::register_builtins(&mut reg);
        reg
    }

    /// Register a factory for an action kind.
    pub fn register(&mut self, name: impl Into<String>, factory: ActionFactory) {
        let name = name.into();
        tracing::debug!("🧩 Registered action kind: {name}");
        self.factories.insert(name, factory);
    }

    /// Look up a factory by kind name.
    pub fn get(&self, name: &str) -> Option<&ActionFactory> {
        self.factories.get(name)
    }

    /// All registered kind names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered kinds.
    pub fn count(&self) -> usize {
        self.factories.len()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
