#![deny(missing_docs)]

//! # Descriptor Registry
//!
//! Stores named resource descriptors so relationships can include a
//! descriptor by type name. Named references are only looked up when a
//! relationship path is first compiled, which is what lets descriptor graphs
//! refer back to themselves.

use crate::descriptor::{DescriptorRef, ResourceDescriptor};
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// On-disk form of a registry file.
#[derive(Deserialize)]
struct RegistryFile {
    resources: Vec<ResourceDescriptor>,
}

/// Registry of resource descriptors keyed by type tag.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<String, Arc<ResourceDescriptor>>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under its type tag. Type tags must be unique.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> AppResult<Arc<ResourceDescriptor>> {
        if self.descriptors.contains_key(&descriptor.resource_type) {
            return Err(AppError::General(format!(
                "Descriptor for type '{}' is already registered",
                descriptor.resource_type
            )));
        }
        let descriptor = Arc::new(descriptor);
        self.descriptors
            .insert(descriptor.resource_type.clone(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Registers every descriptor of a YAML registry document.
    pub fn register_yaml(&mut self, yaml: &str) -> AppResult<()> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        self.register_all(file.resources)
    }

    /// Registers every descriptor of a JSON registry document.
    pub fn register_json(&mut self, raw: JsonValue) -> AppResult<()> {
        let file: RegistryFile = serde_json::from_value(raw)?;
        self.register_all(file.resources)
    }

    /// Loads a registry file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut registry = Self::new();
        if path.extension().is_some_and(|ext| ext == "json") {
            registry.register_json(serde_json::from_str(&content)?)?;
        } else {
            registry.register_yaml(&content)?;
        }
        tracing::debug!(
            path = %path.display(),
            descriptors = registry.len(),
            "loaded descriptor registry"
        );
        Ok(registry)
    }

    fn register_all(&mut self, descriptors: Vec<ResourceDescriptor>) -> AppResult<()> {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Looks up a descriptor by type tag.
    pub fn get(&self, resource_type: &str) -> Option<Arc<ResourceDescriptor>> {
        self.descriptors.get(resource_type).cloned()
    }

    /// Looks up a descriptor by type tag, failing if it is missing.
    pub fn require(&self, resource_type: &str) -> AppResult<Arc<ResourceDescriptor>> {
        self.get(resource_type)
            .ok_or_else(|| AppError::UnknownDescriptor(resource_type.to_string()))
    }

    /// Resolves an include target to a concrete descriptor.
    pub fn resolve(&self, target: &DescriptorRef) -> AppResult<Arc<ResourceDescriptor>> {
        match target {
            DescriptorRef::Inline(descriptor) => Ok(Arc::clone(descriptor)),
            DescriptorRef::Named(name) => self.require(name),
        }
    }

    /// Registered type tags, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
