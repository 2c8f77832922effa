//! Name-keyed plugin registry

use super::errors::RegistryError;
use super::traits::PluginSpec;
use std::collections::HashMap;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn PluginSpec>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn PluginSpec>) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(RegistryError::DuplicatePlugin { name });
        }
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&dyn PluginSpec, RegistryError> {
        self.plugins
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| RegistryError::PluginNotFound {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish_non_exhaustive()
    }
}
