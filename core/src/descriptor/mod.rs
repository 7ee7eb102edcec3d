#![deny(missing_docs)]

//! # Resource Descriptors
//!
//! Caller-authored declarations of a resource type: its type tag, attribute
//! shape, relationships, links/meta shapes and document-level options.
//!
//! - **registry**: named descriptors loaded from YAML / JSON configuration.
//!
//! Descriptors are immutable once built. A relationship either leaves the
//! identifier as a bare reference or resolves it against the document's
//! `included` list; in the latter case the target descriptor is given inline
//! or by registered type name, which allows cyclic descriptor graphs such as
//! `article -> author -> articles`.

pub mod registry;

pub use registry::DescriptorRegistry;

use crate::shape::Shape;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cardinality and nullability of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one identifier.
    One,
    /// One identifier or `null`.
    OneNullable,
    /// An array of identifiers, possibly empty.
    Many,
}

/// Where the descriptor of an included relationship comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorRef {
    /// The name of a descriptor in a [`DescriptorRegistry`]; equal to its type tag.
    Named(String),
    /// A descriptor given in place.
    Inline(Arc<ResourceDescriptor>),
}

impl DescriptorRef {
    /// The resource type the reference resolves to.
    pub fn resource_type(&self) -> &str {
        match self {
            DescriptorRef::Named(name) => name,
            DescriptorRef::Inline(descriptor) => &descriptor.resource_type,
        }
    }
}

impl From<ResourceDescriptor> for DescriptorRef {
    fn from(descriptor: ResourceDescriptor) -> Self {
        DescriptorRef::Inline(Arc::new(descriptor))
    }
}

impl From<Arc<ResourceDescriptor>> for DescriptorRef {
    fn from(descriptor: Arc<ResourceDescriptor>) -> Self {
        DescriptorRef::Inline(descriptor)
    }
}

impl From<&str> for DescriptorRef {
    fn from(name: &str) -> Self {
        DescriptorRef::Named(name.to_string())
    }
}

/// How one relationship field is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationship", into = "RawRelationship")]
pub enum RelationshipDescriptor {
    /// Resolves to `{ id, $meta? }` without looking at `included`.
    Reference {
        /// Cardinality of the relationship.
        cardinality: Cardinality,
        /// Type tag every identifier must carry.
        resource_type: String,
    },
    /// Resolves by substituting the side-loaded resource.
    Included {
        /// Cardinality of the relationship.
        cardinality: Cardinality,
        /// Descriptor of the side-loaded resource.
        include: DescriptorRef,
    },
}

impl RelationshipDescriptor {
    /// A bare reference relationship.
    pub fn reference(cardinality: Cardinality, resource_type: impl Into<String>) -> Self {
        RelationshipDescriptor::Reference {
            cardinality,
            resource_type: resource_type.into(),
        }
    }

    /// A relationship resolved against `included`.
    pub fn included(cardinality: Cardinality, include: impl Into<DescriptorRef>) -> Self {
        RelationshipDescriptor::Included {
            cardinality,
            include: include.into(),
        }
    }

    /// Cardinality of the relationship.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationshipDescriptor::Reference { cardinality, .. }
            | RelationshipDescriptor::Included { cardinality, .. } => *cardinality,
        }
    }

    /// Type tag of the related resources.
    pub fn target_type(&self) -> &str {
        match self {
            RelationshipDescriptor::Reference { resource_type, .. } => resource_type,
            RelationshipDescriptor::Included { include, .. } => include.resource_type(),
        }
    }
}

/// Configuration form of a relationship: `include` wins over `resourceType`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    relationship_type: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    include: Option<DescriptorRef>,
}

impl TryFrom<RawRelationship> for RelationshipDescriptor {
    type Error = String;

    fn try_from(raw: RawRelationship) -> Result<Self, Self::Error> {
        match (raw.include, raw.resource_type) {
            (Some(include), _) => Ok(RelationshipDescriptor::Included {
                cardinality: raw.relationship_type,
                include,
            }),
            (None, Some(resource_type)) => Ok(RelationshipDescriptor::Reference {
                cardinality: raw.relationship_type,
                resource_type,
            }),
            (None, None) => {
                Err("relationship needs either `include` or `resourceType`".to_string())
            }
        }
    }
}

impl From<RelationshipDescriptor> for RawRelationship {
    fn from(descriptor: RelationshipDescriptor) -> Self {
        match descriptor {
            RelationshipDescriptor::Reference {
                cardinality,
                resource_type,
            } => RawRelationship {
                relationship_type: cardinality,
                resource_type: Some(resource_type),
                include: None,
            },
            RelationshipDescriptor::Included {
                cardinality,
                include,
            } => RawRelationship {
                relationship_type: cardinality,
                resource_type: None,
                include: Some(include),
            },
        }
    }
}

/// Handling of the document's top-level `meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentMetaRepr", into = "DocumentMetaRepr")]
pub enum DocumentMeta {
    /// An optional open object map.
    #[default]
    Default,
    /// `meta` is neither validated nor returned.
    Disabled,
    /// `meta` must match the shape.
    Shape(Shape),
}

impl DocumentMeta {
    /// The shape `meta` is validated with, if any.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            DocumentMeta::Default => Some(Shape::open_object().optional()),
            DocumentMeta::Disabled => None,
            DocumentMeta::Shape(shape) => Some(shape.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DocumentMetaRepr {
    Keyword(String),
    Shape(Shape),
}

impl TryFrom<DocumentMetaRepr> for DocumentMeta {
    type Error = String;

    fn try_from(repr: DocumentMetaRepr) -> Result<Self, Self::Error> {
        match repr {
            DocumentMetaRepr::Keyword(word) => match word.as_str() {
                "default" => Ok(DocumentMeta::Default),
                "disabled" => Ok(DocumentMeta::Disabled),
                other => Err(format!(
                    "unknown documentMeta '{other}', expected `default`, `disabled` or a shape"
                )),
            },
            DocumentMetaRepr::Shape(shape) => Ok(DocumentMeta::Shape(shape)),
        }
    }
}

impl From<DocumentMeta> for DocumentMetaRepr {
    fn from(meta: DocumentMeta) -> Self {
        match meta {
            DocumentMeta::Default => DocumentMetaRepr::Keyword("default".into()),
            DocumentMeta::Disabled => DocumentMetaRepr::Keyword("disabled".into()),
            DocumentMeta::Shape(shape) => DocumentMetaRepr::Shape(shape),
        }
    }
}

/// Declaration of one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// The JSON:API `type` tag.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Shape of `attributes`; when set, `attributes` is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Shape>,
    /// Declared relationships; when set, `relationships` is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<IndexMap<String, RelationshipDescriptor>>,
    /// Shape of the resource `links`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Shape>,
    /// Shape of the resource `meta`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Shape>,
    /// Handling of the top-level `meta` of documents parsed with this descriptor.
    #[serde(default)]
    pub document_meta: DocumentMeta,
    /// Copy the top-level `links` into the result.
    #[serde(default)]
    pub include_document_links: bool,
}

impl ResourceDescriptor {
    /// A descriptor with only a type tag.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: None,
            relationships: None,
            links: None,
            meta: None,
            document_meta: DocumentMeta::Default,
            include_document_links: false,
        }
    }

    /// Sets the attributes shape.
    pub fn with_attributes(mut self, shape: Shape) -> Self {
        self.attributes = Some(shape);
        self
    }

    /// Adds a relationship field.
    pub fn with_relationship(
        mut self,
        field: impl Into<String>,
        relationship: RelationshipDescriptor,
    ) -> Self {
        self.relationships
            .get_or_insert_with(IndexMap::new)
            .insert(field.into(), relationship);
        self
    }

    /// Sets the resource links shape.
    pub fn with_links(mut self, shape: Shape) -> Self {
        self.links = Some(shape);
        self
    }

    /// Sets the resource meta shape.
    pub fn with_meta(mut self, shape: Shape) -> Self {
        self.meta = Some(shape);
        self
    }

    /// Sets the document meta handling.
    pub fn with_document_meta(mut self, document_meta: DocumentMeta) -> Self {
        self.document_meta = document_meta;
        self
    }

    /// Enables or disables copying the top-level links.
    pub fn include_document_links(mut self, enabled: bool) -> Self {
        self.include_document_links = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_include_wins_over_resource_type() {
        let yaml = r#"
relationshipType: one
resourceType: person
include: person
"#;
        let rel: RelationshipDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rel,
            RelationshipDescriptor::included(Cardinality::One, "person")
        );
    }

    #[test]
    fn test_relationship_requires_target() {
        let err = serde_yaml::from_str::<RelationshipDescriptor>("relationshipType: many")
            .unwrap_err();
        assert!(err.to_string().contains("either `include` or `resourceType`"));
    }

    #[test]
    fn test_inline_include_from_yaml() {
        let yaml = r#"
type: article
attributes:
  type: object
  properties:
    title: { type: string }
relationships:
  author:
    relationshipType: one
    include:
      type: person
      attributes:
        type: object
        properties:
          name: { type: string }
  tags:
    relationshipType: many
    resourceType: tag
documentMeta: disabled
includeDocumentLinks: true
"#;
        let descriptor: ResourceDescriptor = serde_yaml::from_str(yaml).unwrap();
        let rels = descriptor.relationships.as_ref().unwrap();
        assert_eq!(rels["author"].target_type(), "person");
        assert!(matches!(
            rels["author"],
            RelationshipDescriptor::Included {
                include: DescriptorRef::Inline(_),
                ..
            }
        ));
        assert_eq!(rels["tags"].cardinality(), Cardinality::Many);
        assert_eq!(descriptor.document_meta, DocumentMeta::Disabled);
        assert!(descriptor.include_document_links);
    }

    #[test]
    fn test_builder_keeps_relationship_order() {
        let descriptor = ResourceDescriptor::new("article")
            .with_relationship("b", RelationshipDescriptor::reference(Cardinality::One, "x"))
            .with_relationship("a", RelationshipDescriptor::reference(Cardinality::One, "y"));
        let fields: Vec<_> = descriptor.relationships.unwrap().into_keys().collect();
        assert_eq!(fields, vec!["b", "a"]);
    }

    #[test]
    fn test_document_meta_default_shape_is_optional_record() {
        assert_eq!(
            DocumentMeta::Default.shape(),
            Some(Shape::open_object().optional())
        );
        assert_eq!(DocumentMeta::Disabled.shape(), None);
    }
}
