use std::collections::BTreeMap;

use cmdkit_core::CommandsetRegistry;

/// Source of declared dependency edges.
pub trait DependencyGraph {
    /// Declared dependencies of `name`. Unknown names have none.
    fn dependencies_of(&self, name: &str) -> Vec<String>;
}

impl DependencyGraph for CommandsetRegistry {
    fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.definition(name)
            .map(|definition| definition.dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl DependencyGraph for BTreeMap<String, Vec<String>> {
    fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.get(name).cloned().unwrap_or_default()
    }
}
