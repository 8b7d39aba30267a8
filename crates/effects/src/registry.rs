//! Effect registry — by-name lookup of fullscreen programs.

use std::collections::HashMap;

use tracing::info;

use crate::afterimage::AfterimageShader;
use crate::copy::CopyShader;
use crate::error::EffectError;
use crate::traits::Effect;

/// Registry holding the shader programs available to passes.
///
/// Passes look their programs up here at construction; a missing entry is
/// how an unavailable shader resource surfaces.
pub struct EffectRegistry {
    effects: HashMap<String, Box<dyn Effect>>,
}

impl EffectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    /// Create a registry with the afterimage and copy programs registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(AfterimageShader::new()));
        registry.register(Box::new(CopyShader::new()));

        info!(
            count = registry.effects.len(),
            "Registered built-in effects"
        );

        registry
    }

    /// Register a new effect. Overwrites any previous effect with the same name.
    pub fn register(&mut self, effect: Box<dyn Effect>) {
        let name = effect.name().to_string();
        self.effects.insert(name, effect);
    }

    /// Look up an effect by name.
    pub fn get(&self, name: &str) -> Option<&dyn Effect> {
        self.effects.get(name).map(|e| e.as_ref())
    }

    /// Look up an effect by name, reporting a missing entry as an error.
    pub fn require(&self, name: &str) -> Result<&dyn Effect, EffectError> {
        self.get(name).ok_or_else(|| EffectError::NotFound {
            name: name.to_string(),
        })
    }

    /// Remove an effect, returning it if it was registered.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Effect>> {
        self.effects.remove(name)
    }

    /// List all registered effects, sorted by name.
    pub fn list(&self) -> Vec<&dyn Effect> {
        let mut effects: Vec<_> = self.effects.values().map(|e| e.as_ref()).collect();
        effects.sort_by(|a, b| a.name().cmp(b.name()));
        effects
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::afterimage::AFTERIMAGE;
    use crate::copy::COPY;

    #[test]
    fn empty_registry() {
        let reg = EffectRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.get(AFTERIMAGE).is_none());
        assert!(reg.list().is_empty());
    }

    #[test]
    fn with_builtins_has_all_effects() {
        let reg = EffectRegistry::with_builtins();
        assert_eq!(reg.len(), 2);
        assert!(reg.get(AFTERIMAGE).is_some());
        assert!(reg.get(COPY).is_some());
    }

    #[test]
    fn list_sorted_by_name() {
        let reg = EffectRegistry::with_builtins();
        let names: Vec<&str> = reg.list().iter().map(|e| e.name()).collect();
        assert_eq!(names, [AFTERIMAGE, COPY]);
    }

    #[test]
    fn require_missing_is_not_found() {
        let mut reg = EffectRegistry::with_builtins();
        assert!(reg.unregister(AFTERIMAGE).is_some());
        let err = reg.require(AFTERIMAGE).err().unwrap();
        assert!(matches!(err, EffectError::NotFound { .. }));
        assert!(reg.require(COPY).is_ok());
    }

    #[test]
    fn register_overwrites() {
        let mut reg = EffectRegistry::new();
        reg.register(Box::new(AfterimageShader::new()));
        reg.register(Box::new(AfterimageShader::new()));
        assert_eq!(reg.len(), 1);
    }
}
