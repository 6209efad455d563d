//! Name-keyed enchantment store.
//!
//! Keys are lowercased names. Registration builds a per-category listener
//! index once, so dispatch never asks a handler whether it cares about an
//! action.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use super::{EnchantmentDefinition, EnchantmentHandler, InertHandler};
use crate::codec::is_valid_name;
use crate::dispatch::ActionCategory;
use crate::error::RegistryError;

type RegistrationHook = Box<dyn FnMut(&EnchantmentDefinition) + Send>;

struct Entry {
    definition: Arc<EnchantmentDefinition>,
    handler: Box<dyn EnchantmentHandler>,
}

#[derive(Default)]
pub struct EnchantmentRegistry {
    entries: HashMap<String, Entry>,
    listeners: HashMap<ActionCategory, HashSet<String>>,
    on_register: Option<RegistrationHook>,
}

impl std::fmt::Debug for EnchantmentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("EnchantmentRegistry")
            .field("entries", &names)
            .finish_non_exhaustive()
    }
}

impl EnchantmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a callback run exactly once per successful registration.
    pub fn set_registration_hook(
        &mut self,
        hook: impl FnMut(&EnchantmentDefinition) + Send + 'static,
    ) {
        self.on_register = Some(Box::new(hook));
    }

    // ─── Mutation ───────────────────────────────────────────────────────────

    /// Register a handler. Returns false (and logs) on an empty, duplicate
    /// or unstorable name.
    pub fn register(&mut self, handler: Box<dyn EnchantmentHandler>) -> bool {
        match self.try_register(handler) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Enchantment registration rejected");
                false
            }
        }
    }

    pub fn try_register(
        &mut self,
        handler: Box<dyn EnchantmentHandler>,
    ) -> Result<(), RegistryError> {
        let definition = Arc::clone(handler.definition());
        let key = definition.key().to_string();
        if key.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if !is_valid_name(definition.name()) {
            return Err(RegistryError::InvalidName(definition.name().to_string()));
        }
        if self.entries.contains_key(&key) {
            return Err(RegistryError::RegistrationConflict(definition.name().to_string()));
        }

        for category in handler.categories() {
            self.listeners
                .entry(*category)
                .or_default()
                .insert(key.clone());
        }
        if let Some(hook) = self.on_register.as_mut() {
            hook(&definition);
        }
        tracing::info!(
            name = %definition.name(),
            max_level = definition.max_level(),
            "Registered enchantment"
        );
        self.entries.insert(key, Entry { definition, handler });
        Ok(())
    }

    /// Register a lore-only enchantment with no behavior.
    pub fn register_definition(&mut self, definition: EnchantmentDefinition) -> bool {
        self.register(Box::new(InertHandler::new(definition)))
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<EnchantmentDefinition>> {
        let key = name.trim().to_lowercase();
        let entry = self.entries.remove(&key)?;
        for keys in self.listeners.values_mut() {
            keys.remove(&key);
        }
        tracing::info!(name = %entry.definition.name(), "Unregistered enchantment");
        Some(entry.definition)
    }

    // ─── Lookup ─────────────────────────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<&Arc<EnchantmentDefinition>> {
        self.entries
            .get(name.trim().to_lowercase().as_str())
            .map(|e| &e.definition)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Snapshot of every definition, sorted by key.
    pub fn all(&self) -> Vec<Arc<EnchantmentDefinition>> {
        let mut defs: Vec<_> = self.entries.values().map(|e| Arc::clone(&e.definition)).collect();
        defs.sort_by(|a, b| a.key().cmp(b.key()));
        defs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display names starting with `partial` (case-insensitive), sorted.
    pub fn suggest(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        let mut names: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.definition.key().starts_with(partial.as_str()))
            .map(|e| e.definition.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Valid levels for `name`, or empty if unknown.
    pub fn levels_for(&self, name: &str) -> Vec<u32> {
        self.get(name)
            .map(|d| (1..=d.max_level()).collect())
            .unwrap_or_default()
    }

    pub fn listens(&self, key: &str, category: ActionCategory) -> bool {
        self.listeners
            .get(&category)
            .is_some_and(|keys| keys.contains(key))
    }

    pub(crate) fn handler_mut(
        &mut self,
        key: &str,
    ) -> Option<&mut (dyn EnchantmentHandler + 'static)> {
        self.entries.get_mut(key).map(|e| e.handler.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use enchantry_types::ItemKind;

    use super::*;

    fn def(name: &str, max: u32) -> EnchantmentDefinition {
        EnchantmentDefinition::new(name, max, [ItemKind::Sword])
    }

    #[test]
    fn test_duplicate_name_rejected_case_insensitively() {
        let mut registry = EnchantmentRegistry::new();
        assert!(registry.register_definition(def("Inferno", 3)));
        assert!(!registry.register_definition(def("INFERNO", 1)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("inferno").unwrap().max_level(), 3);
    }

    #[test]
    fn test_try_register_reports_reason() {
        let mut registry = EnchantmentRegistry::new();
        registry.register_definition(def("Swift", 3));
        assert_eq!(
            registry.try_register(Box::new(InertHandler::new(def("swift", 1)))),
            Err(RegistryError::RegistrationConflict("swift".into()))
        );
        assert_eq!(
            registry.try_register(Box::new(InertHandler::new(def("   ", 1)))),
            Err(RegistryError::EmptyName)
        );
    }

    #[test]
    fn test_names_outside_lore_grammar_rejected() {
        let mut registry = EnchantmentRegistry::new();
        for name in ["Fire-Aspect", "Éclair", "Ink%"] {
            assert_eq!(
                registry.try_register(Box::new(InertHandler::new(def(name, 2)))),
                Err(RegistryError::InvalidName(name.into()))
            );
        }
        assert!(registry.is_empty());
        assert!(registry.register_definition(def("Fire_Aspect", 2)));
    }

    #[test]
    fn test_hook_runs_once_per_successful_registration() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut registry = EnchantmentRegistry::new();
        registry.set_registration_hook(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        });
        registry.register_definition(def("A", 1));
        registry.register_definition(def("a", 1));
        registry.register_definition(def("B", 1));
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregister_then_reregister() {
        let mut registry = EnchantmentRegistry::new();
        registry.register_definition(def("Inferno", 3));
        assert_eq!(registry.unregister("inferno").unwrap().name(), "Inferno");
        assert!(registry.unregister("inferno").is_none());
        assert!(registry.is_empty());
        assert!(registry.register_definition(def("Inferno", 2)));
    }

    #[test]
    fn test_suggest_and_levels() {
        let mut registry = EnchantmentRegistry::new();
        for name in ["Soul Siphon", "Swift", "Seeker Strike", "Inferno"] {
            registry.register_definition(def(name, 3));
        }
        assert_eq!(
            registry.suggest("s"),
            vec!["Seeker Strike", "Soul Siphon", "Swift"]
        );
        assert_eq!(registry.suggest("SW"), vec!["Swift"]);
        assert_eq!(registry.levels_for("swift"), vec![1, 2, 3]);
        assert!(registry.levels_for("nope").is_empty());
    }

    #[test]
    fn test_all_sorted_snapshot() {
        let mut registry = EnchantmentRegistry::new();
        registry.register_definition(def("Zeta", 1));
        registry.register_definition(def("alpha", 1));
        let names: Vec<String> = registry.all().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["alpha", "Zeta"]);
    }

    #[test]
    fn test_inert_handlers_listen_to_nothing() {
        let mut registry = EnchantmentRegistry::new();
        registry.register_definition(def("Inferno", 3));
        for category in ActionCategory::ALL {
            assert!(!registry.listens("inferno", category));
        }
    }
}
