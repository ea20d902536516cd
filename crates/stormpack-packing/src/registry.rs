//! Packing algorithm registry.
//!
//! Maps string identifiers to factory functions. The configured
//! `packing.class` is looked up here at run time.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{PackingError, PackingResult, PluginError};
use crate::instance_per_container::InstancePerContainerPacking;
use crate::plugin::PackingPlugin;
use crate::round_robin::RoundRobinPacking;

/// Constructs a fresh, uninitialized plugin.
pub type PluginFactory = fn() -> Result<Box<dyn PackingPlugin>, PluginError>;

#[derive(Debug, Clone, Default)]
pub struct PackingRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PackingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in algorithms under their full identifiers
    /// and short aliases.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (identifier, factory) in [
            (RoundRobinPacking::IDENTIFIER, RoundRobinPacking::factory as PluginFactory),
            (RoundRobinPacking::ALIAS, RoundRobinPacking::factory),
            (InstancePerContainerPacking::IDENTIFIER, InstancePerContainerPacking::factory),
            (InstancePerContainerPacking::ALIAS, InstancePerContainerPacking::factory),
        ] {
            registry.register(identifier, factory);
        }
        registry
    }

    /// Register a factory, returning the one it replaced.
    pub fn register(&mut self, identifier: impl Into<String>, factory: PluginFactory) -> Option<PluginFactory> {
        self.factories.insert(identifier.into(), factory)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct the plugin registered under `identifier`.
    pub fn create(&self, identifier: &str) -> PackingResult<Box<dyn PackingPlugin>> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| PackingError::UnknownPlugin {
                identifier: identifier.to_string(),
            })?;
        debug!(identifier, "constructing packing algorithm");
        factory().map_err(|source| PackingError::Construction {
            identifier: identifier.to_string(),
            source,
        })
    }
}
