#![deny(missing_docs)]

//! # Resource Resolver
//!
//! Flattens validated resources into `{ id, ...attributes, $links?, $meta?,
//! [relationship]: ... }` objects, substituting side-loaded resources for
//! identifiers of included relationships.
//!
//! Resolution state is per call: the [`IncludedIndex`] memoizes every
//! resolved side-loaded resource, and a set of `(type, id)` pairs in progress
//! turns cyclic `included` graphs into [`AppError::Cycle`] instead of
//! unbounded recursion. The memo slot is only filled once a resource is fully
//! resolved, so the in-progress set is what catches re-entry.

use crate::compiler::{
    Identifier, RelationshipData, ValidatedRelationship, ValidatedResource, ValidatorCache,
};
use crate::descriptor::{DescriptorRef, RelationshipDescriptor};
use crate::error::{AppError, AppResult};
use crate::index::{index_key, IncludedIndex};
use crate::shape::child_path;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Counters describing one resolution call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Included resources validated and flattened.
    pub validated: usize,
    /// Lookups answered from the memo.
    pub memo_hits: usize,
    /// Reference identifiers emitted without a lookup.
    pub references: usize,
}

/// Resolves resources of one document.
pub struct Resolver<'a> {
    cache: &'a ValidatorCache,
    index: IncludedIndex,
    in_progress: HashSet<String>,
    max_depth: Option<usize>,
    depth: usize,
    stats: ResolutionStats,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `index`, compiling nested validators through `cache`.
    pub fn new(cache: &'a ValidatorCache, index: IncludedIndex, max_depth: Option<usize>) -> Self {
        Self {
            cache,
            index,
            in_progress: HashSet::new(),
            max_depth,
            depth: 0,
            stats: ResolutionStats::default(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }

    /// Flattens `resource`. `parent` is the relationship path that led here,
    /// `None` for primary data.
    pub fn resolve(&mut self, resource: ValidatedResource, parent: Option<&str>) -> AppResult<Value> {
        let mut flat = Map::new();
        flat.insert("id".to_string(), Value::String(resource.id));

        if let Some(Value::Object(attributes)) = resource.attributes {
            flat.extend(attributes);
        }
        if let Some(links) = resource.links.filter(|v| !v.is_null()) {
            flat.insert("$links".to_string(), links);
        }
        if let Some(meta) = resource.meta.filter(|v| !v.is_null()) {
            flat.insert("$meta".to_string(), meta);
        }

        for (field, relationship) in resource.relationships {
            let path = match parent {
                Some(parent) => child_path(parent, &field),
                None => field.clone(),
            };
            let value = self.resolve_relationship(relationship, &path)?;
            flat.insert(field, value);
        }

        Ok(Value::Object(flat))
    }

    fn resolve_relationship(
        &mut self,
        relationship: ValidatedRelationship,
        path: &str,
    ) -> AppResult<Value> {
        match (relationship.descriptor, relationship.data) {
            (_, RelationshipData::Null) => Ok(Value::Null),
            (RelationshipDescriptor::Reference { .. }, RelationshipData::One(identifier)) => {
                self.stats.references += 1;
                Ok(reference_value(identifier))
            }
            (RelationshipDescriptor::Reference { .. }, RelationshipData::Many(identifiers)) => {
                self.stats.references += identifiers.len();
                Ok(Value::Array(
                    identifiers.into_iter().map(reference_value).collect(),
                ))
            }
            (RelationshipDescriptor::Included { include, .. }, RelationshipData::One(identifier)) => {
                self.include_resource(&identifier, path, &include)
            }
            (
                RelationshipDescriptor::Included { include, .. },
                RelationshipData::Many(identifiers),
            ) => {
                let mut resolved = Vec::with_capacity(identifiers.len());
                for identifier in &identifiers {
                    resolved.push(self.include_resource(identifier, path, &include)?);
                }
                Ok(Value::Array(resolved))
            }
        }
    }

    fn include_resource(
        &mut self,
        identifier: &Identifier,
        path: &str,
        target: &DescriptorRef,
    ) -> AppResult<Value> {
        let resource_type = target.resource_type();
        let key = index_key(resource_type, &identifier.id);

        let entry = self
            .index
            .get_mut(resource_type, &identifier.id)
            .ok_or_else(|| AppError::Lookup {
                resource_type: resource_type.to_string(),
                id: identifier.id.clone(),
            })?;

        if let Some(done) = &entry.processed {
            self.stats.memo_hits += 1;
            tracing::trace!(%key, path, "included resource memo hit");
            return Ok(done.clone());
        }
        if self.in_progress.contains(&key) {
            return Err(AppError::Cycle {
                resource_type: resource_type.to_string(),
                id: identifier.id.clone(),
            });
        }
        if let Some(limit) = self.max_depth {
            if self.depth >= limit {
                return Err(AppError::DepthExceeded {
                    path: path.to_string(),
                    limit,
                });
            }
        }

        // Only needed until the memo slot is filled; a re-entry fails above.
        let raw = std::mem::take(&mut entry.raw);

        let validator = self.cache.get_or_compile(path, target)?;
        let validated = validator.validate(&raw, path)?;
        self.stats.validated += 1;

        self.in_progress.insert(key.clone());
        self.depth += 1;
        let result = self.resolve(validated, Some(path));
        self.depth -= 1;
        self.in_progress.remove(&key);
        let resolved = result?;

        if let Some(entry) = self.index.get_mut(resource_type, &identifier.id) {
            entry.processed = Some(resolved.clone());
        }
        Ok(resolved)
    }
}

fn reference_value(identifier: Identifier) -> Value {
    let mut flat = Map::new();
    flat.insert("id".to_string(), Value::String(identifier.id));
    if let Some(meta) = identifier.meta {
        flat.insert("$meta".to_string(), Value::Object(meta));
    }
    Value::Object(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_resource_validator;
    use crate::descriptor::{Cardinality, DescriptorRegistry, ResourceDescriptor};
    use crate::shape::Shape;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn person() -> ResourceDescriptor {
        ResourceDescriptor::new("person").with_attributes(Shape::object([("name", Shape::string())]))
    }

    fn resolve_with(
        descriptor: &ResourceDescriptor,
        registry: DescriptorRegistry,
        data: Value,
        included: Vec<Value>,
        max_depth: Option<usize>,
    ) -> (AppResult<Value>, ResolutionStats, Vec<String>) {
        let cache = ValidatorCache::new(Arc::new(registry));
        let resource = compile_resource_validator(descriptor)
            .validate(&data, "data")
            .unwrap();
        let mut resolver = Resolver::new(&cache, IncludedIndex::build(included), max_depth);
        let result = resolver.resolve(resource, None);
        (result, resolver.stats(), cache.compiled_paths())
    }

    #[test]
    fn test_reference_relationship_has_no_lookup() {
        let descriptor = ResourceDescriptor::new("article").with_relationship(
            "author",
            RelationshipDescriptor::reference(Cardinality::One, "person"),
        );
        let (result, stats, paths) = resolve_with(
            &descriptor,
            DescriptorRegistry::new(),
            json!({"id": "1", "type": "article", "relationships": {
                "author": {"data": {"id": "9", "type": "person", "meta": {"x": 1}}}
            }}),
            vec![],
            None,
        );
        assert_eq!(
            result.unwrap(),
            json!({"id": "1", "author": {"id": "9", "$meta": {"x": 1}}})
        );
        assert_eq!(stats.references, 1);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_shared_included_resource_validated_once() {
        let descriptor = ResourceDescriptor::new("article")
            .with_relationship("author", RelationshipDescriptor::included(Cardinality::One, person()))
            .with_relationship(
                "reviewers",
                RelationshipDescriptor::included(Cardinality::Many, person()),
            );
        let (result, stats, paths) = resolve_with(
            &descriptor,
            DescriptorRegistry::new(),
            json!({"id": "1", "type": "article", "relationships": {
                "author": {"data": {"id": "9", "type": "person"}},
                "reviewers": {"data": [{"id": "9", "type": "person"}, {"id": "9", "type": "person"}]}
            }}),
            vec![json!({"id": "9", "type": "person", "attributes": {"name": "Ada"}})],
            None,
        );
        let result = result.unwrap();
        assert_eq!(result["author"], json!({"id": "9", "name": "Ada"}));
        assert_eq!(result["reviewers"][0], result["author"]);
        assert_eq!(result["reviewers"][1], result["author"]);
        assert_eq!(stats.validated, 1);
        assert_eq!(stats.memo_hits, 2);
        assert_eq!(paths, vec!["author"]);
    }

    #[test]
    fn test_missing_included_resource() {
        let descriptor = ResourceDescriptor::new("article")
            .with_relationship("author", RelationshipDescriptor::included(Cardinality::One, person()));
        let (result, _, _) = resolve_with(
            &descriptor,
            DescriptorRegistry::new(),
            json!({"id": "1", "type": "article", "relationships": {
                "author": {"data": {"id": "9", "type": "person"}}
            }}),
            vec![],
            None,
        );
        match result.unwrap_err() {
            AppError::Lookup { resource_type, id } => {
                assert_eq!(resource_type, "person");
                assert_eq!(id, "9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn cyclic_registry() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(ResourceDescriptor::new("person").with_relationship(
                "articles",
                RelationshipDescriptor::included(Cardinality::Many, "article"),
            ))
            .unwrap();
        registry
            .register(ResourceDescriptor::new("article").with_relationship(
                "author",
                RelationshipDescriptor::included(Cardinality::One, "person"),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_cyclic_included_graph_is_rejected() {
        let registry = cyclic_registry();
        let root = registry.require("article").unwrap();
        let (result, _, _) = resolve_with(
            &root,
            registry,
            json!({"id": "1", "type": "article", "relationships": {
                "author": {"data": {"id": "9", "type": "person"}}
            }}),
            vec![
                json!({"id": "9", "type": "person", "relationships": {
                    "articles": {"data": [{"id": "2", "type": "article"}]}
                }}),
                json!({"id": "2", "type": "article", "relationships": {
                    "author": {"data": {"id": "9", "type": "person"}}
                }}),
            ],
            None,
        );
        match result.unwrap_err() {
            AppError::Cycle { resource_type, id } => {
                assert_eq!(resource_type, "person");
                assert_eq!(id, "9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_referential_descriptors_compile_per_path() {
        let registry = cyclic_registry();
        let root = registry.require("article").unwrap();
        let (result, _, paths) = resolve_with(
            &root,
            registry,
            json!({"id": "1", "type": "article", "relationships": {
                "author": {"data": {"id": "9", "type": "person"}}
            }}),
            vec![json!({"id": "9", "type": "person", "relationships": {
                "articles": {"data": []}
            }})],
            None,
        );
        assert_eq!(
            result.unwrap(),
            json!({"id": "1", "author": {"id": "9", "articles": []}})
        );
        assert_eq!(paths, vec!["author"]);
    }

    #[test]
    fn test_depth_limit() {
        let profile = ResourceDescriptor::new("profile");
        let author = ResourceDescriptor::new("person")
            .with_relationship("profile", RelationshipDescriptor::included(Cardinality::One, profile));
        let descriptor = ResourceDescriptor::new("article")
            .with_relationship("author", RelationshipDescriptor::included(Cardinality::One, author));
        let data = json!({"id": "1", "type": "article", "relationships": {
            "author": {"data": {"id": "9", "type": "person"}}
        }});
        let included = vec![
            json!({"id": "9", "type": "person", "relationships": {
                "profile": {"data": {"id": "p", "type": "profile"}}
            }}),
            json!({"id": "p", "type": "profile"}),
        ];

        let (result, _, _) = resolve_with(
            &descriptor,
            DescriptorRegistry::new(),
            data.clone(),
            included.clone(),
            Some(1),
        );
        assert!(matches!(
            result.unwrap_err(),
            AppError::DepthExceeded { ref path, limit: 1 } if path == "author.profile"
        ));

        let (result, _, _) =
            resolve_with(&descriptor, DescriptorRegistry::new(), data, included, Some(2));
        assert_eq!(
            result.unwrap(),
            json!({"id": "1", "author": {"id": "9", "profile": {"id": "p"}}})
        );
    }

    #[test]
    fn test_links_and_meta_flattened() {
        let descriptor = ResourceDescriptor::new("article")
            .with_attributes(Shape::object([("title", Shape::string())]))
            .with_links(Shape::object([("self", Shape::string())]))
            .with_meta(Shape::open_object());
        let (result, _, _) = resolve_with(
            &descriptor,
            DescriptorRegistry::new(),
            json!({"id": "1", "type": "article", "attributes": {"title": "T"},
                   "links": {"self": "/articles/1"}, "meta": {"views": 3}}),
            vec![],
            None,
        );
        assert_eq!(
            result.unwrap(),
            json!({"id": "1", "title": "T", "$links": {"self": "/articles/1"}, "$meta": {"views": 3}})
        );
    }
}
