#![deny(missing_docs)]

//! # Validator Compiler
//!
//! Turns a [`ResourceDescriptor`] into a [`ResourceValidator`] for one
//! resource object, with one relationship validator per declared field.
//!
//! - **cache**: path-keyed cache of validators for nested included resources.
//!
//! Compilation is shallow: a relationship only needs the type tag of its
//! target, so an included descriptor is compiled when a resource is actually
//! encountered at that relationship path (see [`ValidatorCache`]).

pub mod cache;

pub use cache::ValidatorCache;

use crate::descriptor::{Cardinality, RelationshipDescriptor, ResourceDescriptor};
use crate::error::{AppError, AppResult};
use crate::links::parse_links_map;
use crate::shape::{child_path, expect_object, expect_str, type_mismatch, Shape};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A resource identifier object found in relationship data.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// Resource id.
    pub id: String,
    /// Resource type, already checked against the relationship target.
    pub resource_type: String,
    /// Identifier meta.
    pub meta: Option<Map<String, Value>>,
}

/// Validated `data` member of a relationship object.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipData {
    /// `null` for a nullable relationship.
    Null,
    /// A single identifier.
    One(Identifier),
    /// An array of identifiers.
    Many(Vec<Identifier>),
}

/// Relationship data that passed validation, with its descriptor.
///
/// Relationship `links` and `meta` are checked but not carried over; the
/// flattened output has no place for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRelationship {
    /// Relationship data.
    pub data: RelationshipData,
    /// How the relationship is resolved.
    pub descriptor: RelationshipDescriptor,
}

/// A resource object that passed its validator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResource {
    /// Resource id.
    pub id: String,
    /// Resource type tag.
    pub resource_type: String,
    /// Validated attributes.
    pub attributes: Option<Value>,
    /// Validated relationships, in descriptor order.
    pub relationships: IndexMap<String, ValidatedRelationship>,
    /// Validated resource links.
    pub links: Option<Value>,
    /// Validated resource meta.
    pub meta: Option<Value>,
}

/// Validator for the relationship object of one field.
#[derive(Debug, Clone)]
pub struct RelationshipValidator {
    descriptor: RelationshipDescriptor,
}

impl RelationshipValidator {
    /// Compiles the relationship envelope for `descriptor`.
    pub fn new(descriptor: RelationshipDescriptor) -> Self {
        Self { descriptor }
    }

    /// Validates a relationship object found at `path`.
    pub fn validate(&self, value: &Value, path: &str) -> AppResult<ValidatedRelationship> {
        let obj = expect_object(value, path)?;
        let data_path = child_path(path, "data");

        let data = match (self.descriptor.cardinality(), obj.get("data")) {
            (_, None) => return Err(AppError::validation(&data_path, "Required")),
            (Cardinality::OneNullable, Some(Value::Null)) => RelationshipData::Null,
            (Cardinality::One | Cardinality::OneNullable, Some(data)) => {
                RelationshipData::One(self.identifier(data, &data_path)?)
            }
            (Cardinality::Many, Some(Value::Array(items))) => RelationshipData::Many(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.identifier(item, &child_path(&data_path, &i.to_string())))
                    .collect::<AppResult<_>>()?,
            ),
            (Cardinality::Many, Some(other)) => {
                return Err(type_mismatch(&data_path, "array", other))
            }
        };

        if let Some(links) = obj.get("links") {
            parse_links_map(links, &child_path(path, "links"))?;
        }
        if let Some(meta) = obj.get("meta") {
            Shape::open_object().parse(meta, &child_path(path, "meta"))?;
        }

        Ok(ValidatedRelationship {
            data,
            descriptor: self.descriptor.clone(),
        })
    }

    fn identifier(&self, value: &Value, path: &str) -> AppResult<Identifier> {
        let obj = expect_object(value, path)?;
        let id = required_str(obj, "id", path)?;
        let resource_type = required_str(obj, "type", path)?;
        let expected = self.descriptor.target_type();
        if resource_type != expected {
            return Err(AppError::validation(
                &child_path(path, "type"),
                format!("Invalid literal value, expected \"{expected}\", received \"{resource_type}\""),
            ));
        }
        let meta = match obj.get("meta") {
            Some(meta) => Some(expect_object(meta, &child_path(path, "meta"))?.clone()),
            None => None,
        };
        Ok(Identifier {
            id: id.to_string(),
            resource_type: resource_type.to_string(),
            meta,
        })
    }
}

/// Validator for one resource object.
#[derive(Debug, Clone)]
pub struct ResourceValidator {
    resource_type: String,
    attributes: Option<Shape>,
    relationships: Option<IndexMap<String, RelationshipValidator>>,
    links: Option<Shape>,
    meta: Option<Shape>,
}

/// Compiles the validator for resources described by `descriptor`.
pub fn compile_resource_validator(descriptor: &ResourceDescriptor) -> ResourceValidator {
    ResourceValidator {
        resource_type: descriptor.resource_type.clone(),
        attributes: descriptor.attributes.clone(),
        relationships: descriptor.relationships.as_ref().map(|rels| {
            rels.iter()
                .map(|(field, rel)| (field.clone(), RelationshipValidator::new(rel.clone())))
                .collect()
        }),
        links: descriptor.links.clone(),
        meta: descriptor.meta.clone(),
    }
}

impl ResourceValidator {
    /// The type tag this validator requires.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Validates a raw resource object found at `path`.
    pub fn validate(&self, value: &Value, path: &str) -> AppResult<ValidatedResource> {
        let obj = expect_object(value, path)?;
        let id = required_str(obj, "id", path)?;
        let resource_type = required_str(obj, "type", path)?;
        if resource_type != self.resource_type {
            return Err(AppError::validation(
                &child_path(path, "type"),
                format!(
                    "Invalid literal value, expected \"{}\", received \"{resource_type}\"",
                    self.resource_type
                ),
            ));
        }

        let attributes = optional_member(&self.attributes, obj, "attributes", path)?;
        let links = optional_member(&self.links, obj, "links", path)?;
        let meta = optional_member(&self.meta, obj, "meta", path)?;

        let mut relationships = IndexMap::new();
        if let Some(validators) = &self.relationships {
            let rel_path = child_path(path, "relationships");
            let raw = obj
                .get("relationships")
                .ok_or_else(|| AppError::validation(&rel_path, "Required"))?;
            let raw = expect_object(raw, &rel_path)?;
            for (field, validator) in validators {
                let field_path = child_path(&rel_path, field);
                let value = raw
                    .get(field)
                    .ok_or_else(|| AppError::validation(&field_path, "Required"))?;
                relationships.insert(field.clone(), validator.validate(value, &field_path)?);
            }
        }

        Ok(ValidatedResource {
            id: id.to_string(),
            resource_type: resource_type.to_string(),
            attributes,
            relationships,
            links,
            meta,
        })
    }
}

fn optional_member(
    shape: &Option<Shape>,
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> AppResult<Option<Value>> {
    match shape {
        Some(shape) => shape.validate(obj.get(key), &child_path(path, key)),
        None => Ok(None),
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> AppResult<&'a str> {
    let field_path = child_path(path, key);
    let value = obj
        .get(key)
        .ok_or_else(|| AppError::validation(&field_path, "Required"))?;
    expect_str(value, &field_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResourceDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn article() -> ResourceDescriptor {
        ResourceDescriptor::new("article")
            .with_attributes(Shape::object([("title", Shape::string())]))
            .with_relationship(
                "author",
                RelationshipDescriptor::reference(Cardinality::One, "person"),
            )
            .with_relationship(
                "editor",
                RelationshipDescriptor::reference(Cardinality::OneNullable, "person"),
            )
            .with_relationship(
                "tags",
                RelationshipDescriptor::included(Cardinality::Many, ResourceDescriptor::new("tag")),
            )
    }

    fn raw_article() -> Value {
        json!({
            "id": "1",
            "type": "article",
            "attributes": {"title": "Hello", "ignored": true},
            "relationships": {
                "author": {"data": {"id": "9", "type": "person", "meta": {"role": "lead"}}},
                "editor": {"data": null},
                "tags": {"data": [{"id": "t1", "type": "tag"}], "links": {"related": "/tags"}}
            }
        })
    }

    #[test]
    fn test_validate_full_resource() {
        let validator = compile_resource_validator(&article());
        let resource = validator.validate(&raw_article(), "data").unwrap();

        assert_eq!(resource.id, "1");
        assert_eq!(resource.attributes, Some(json!({"title": "Hello"})));
        let fields: Vec<_> = resource.relationships.keys().cloned().collect();
        assert_eq!(fields, vec!["author", "editor", "tags"]);

        match &resource.relationships["author"].data {
            RelationshipData::One(identifier) => {
                assert_eq!(identifier.id, "9");
                assert_eq!(
                    identifier.meta.as_ref().unwrap().get("role"),
                    Some(&json!("lead"))
                );
            }
            other => panic!("unexpected data {other:?}"),
        }
        assert_eq!(resource.relationships["editor"].data, RelationshipData::Null);
        assert!(matches!(
            resource.relationships["tags"].data,
            RelationshipData::Many(ref ids) if ids.len() == 1
        ));
    }

    #[test]
    fn test_relationship_links_still_checked() {
        let validator = RelationshipValidator::new(RelationshipDescriptor::reference(
            Cardinality::Many,
            "tag",
        ));
        let err = validator
            .validate(&json!({"data": [], "links": {"related": 3}}), "tags")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "tags.links.related"));
    }

    #[test]
    fn test_type_tag_mismatch() {
        let validator = compile_resource_validator(&ResourceDescriptor::new("article"));
        let err = validator
            .validate(&json!({"id": "1", "type": "person"}), "data")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "data.type"));
    }

    #[test]
    fn test_identifier_type_checked_at_parse_time() {
        let validator = compile_resource_validator(&article());
        let mut raw = raw_article();
        raw["relationships"]["author"]["data"]["type"] = json!("robot");
        let err = validator.validate(&raw, "data").unwrap_err();
        match err {
            AppError::Validation { path, message } => {
                assert_eq!(path, "data.relationships.author.data.type");
                assert!(message.contains("expected \"person\""));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_rejects_null() {
        let validator = compile_resource_validator(&article());
        let mut raw = raw_article();
        raw["relationships"]["author"]["data"] = Value::Null;
        assert!(validator.validate(&raw, "data").is_err());
    }

    #[test]
    fn test_many_requires_array() {
        let validator = compile_resource_validator(&article());
        let mut raw = raw_article();
        raw["relationships"]["tags"]["data"] = json!({"id": "t1", "type": "tag"});
        let err = validator.validate(&raw, "data").unwrap_err();
        assert!(err.to_string().contains("Expected array, received object"));
    }

    #[test]
    fn test_declared_relationships_are_required() {
        let validator = compile_resource_validator(&article());
        let mut raw = raw_article();
        raw["relationships"].as_object_mut().unwrap().remove("editor");
        let err = validator.validate(&raw, "data").unwrap_err();
        assert!(
            matches!(err, AppError::Validation { ref path, .. } if path == "data.relationships.editor")
        );
    }

    #[test]
    fn test_undeclared_members_ignored() {
        let validator = compile_resource_validator(&ResourceDescriptor::new("article"));
        let resource = validator
            .validate(
                &json!({"id": "1", "type": "article", "attributes": {"x": 1}, "meta": {"y": 2}}),
                "data",
            )
            .unwrap();
        assert_eq!(resource.attributes, None);
        assert_eq!(resource.meta, None);
        assert!(resource.relationships.is_empty());
    }
}
