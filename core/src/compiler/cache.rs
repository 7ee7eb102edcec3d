#![deny(missing_docs)]

//! # Validator Cache
//!
//! Compiled validators for included resources, keyed by the relationship path
//! from the document root (`author`, `author.profile`, ...).
//!
//! Keying by path rather than by type means a path is only compiled when a
//! resource is actually found there, so self-referential descriptors never
//! expand eagerly. The cache lives as long as the selector that owns it and is
//! shared by all of its parse calls.

use crate::compiler::{compile_resource_validator, ResourceValidator};
use crate::descriptor::{DescriptorRef, DescriptorRegistry};
use crate::error::AppResult;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Path-keyed cache of compiled resource validators.
#[derive(Debug)]
pub struct ValidatorCache {
    registry: Arc<DescriptorRegistry>,
    by_path: RwLock<HashMap<String, Arc<ResourceValidator>>>,
}

impl ValidatorCache {
    /// Creates an empty cache resolving named includes against `registry`.
    pub fn new(registry: Arc<DescriptorRegistry>) -> Self {
        Self {
            registry,
            by_path: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the validator for `path`, compiling it from `target` on first use.
    ///
    /// Two callers racing on the same path may both compile; the first insert is kept.
    pub fn get_or_compile(
        &self,
        path: &str,
        target: &DescriptorRef,
    ) -> AppResult<Arc<ResourceValidator>> {
        if let Some(found) = self
            .by_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(Arc::clone(found));
        }

        let descriptor = self.registry.resolve(target)?;
        let compiled = Arc::new(compile_resource_validator(&descriptor));
        tracing::debug!(path, resource_type = %descriptor.resource_type, "compiled validator");

        let mut by_path = self
            .by_path
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            by_path.entry(path.to_string()).or_insert(compiled),
        ))
    }

    /// Paths compiled so far, sorted.
    pub fn compiled_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .by_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort_unstable();
        paths
    }
}
