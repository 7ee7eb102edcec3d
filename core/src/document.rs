#![deny(missing_docs)]

//! # Document Envelope
//!
//! Validates the top level of a JSON:API document: primary `data` (checked by
//! the root resource validator), `included`, `links` and `meta`.
//!
//! Included resources are only checked for a string `id` and `type` here;
//! their full validation happens lazily when a relationship reaches them.

use crate::compiler::{ResourceValidator, ValidatedResource};
use crate::descriptor::DocumentMeta;
use crate::error::{AppError, AppResult};
use crate::links::{parse_root_links, RootLinks};
use crate::shape::{child_path, expect_object, expect_str, type_mismatch};
use serde_json::Value;

/// Which form of primary data a selector accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `data` is one resource object.
    Single,
    /// `data` is one resource object or `null`.
    Nullable,
    /// `data` is an array of resource objects.
    Collection,
}

/// Validated primary data.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryData {
    /// `null` data of a nullable document.
    Null,
    /// A single resource.
    One(ValidatedResource),
    /// A collection of resources.
    Many(Vec<ValidatedResource>),
}

/// A document whose envelope passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    /// Primary data.
    pub data: PrimaryData,
    /// Raw included resources, each with a string `id` and `type`.
    pub included: Vec<Value>,
    /// Top-level links.
    pub links: Option<RootLinks>,
    /// Top-level meta, after the document meta shape.
    pub meta: Option<Value>,
}

/// Validates a raw document.
pub fn validate_document(
    raw: &Value,
    kind: DocumentKind,
    validator: &ResourceValidator,
    document_meta: &DocumentMeta,
) -> AppResult<ValidatedDocument> {
    let obj = expect_object(raw, "")?;

    let data = match (kind, obj.get("data")) {
        (_, None) => return Err(AppError::validation("data", "Required")),
        (DocumentKind::Nullable, Some(Value::Null)) => PrimaryData::Null,
        (DocumentKind::Single | DocumentKind::Nullable, Some(value)) => {
            PrimaryData::One(validator.validate(value, "data")?)
        }
        (DocumentKind::Collection, Some(Value::Array(items))) => PrimaryData::Many(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| validator.validate(item, &child_path("data", &i.to_string())))
                .collect::<AppResult<_>>()?,
        ),
        (DocumentKind::Collection, Some(other)) => {
            return Err(type_mismatch("data", "array", other))
        }
    };

    let included = match obj.get("included") {
        Some(value) => validate_included(value)?,
        None => Vec::new(),
    };

    let links = obj
        .get("links")
        .map(|links| parse_root_links(links, "links"))
        .transpose()?;

    let meta = match document_meta.shape() {
        Some(shape) => shape
            .validate(obj.get("meta"), "meta")?
            .filter(|meta| !meta.is_null()),
        None => None,
    };

    Ok(ValidatedDocument {
        data,
        included,
        links,
        meta,
    })
}

fn validate_included(value: &Value) -> AppResult<Vec<Value>> {
    let items = value
        .as_array()
        .ok_or_else(|| type_mismatch("included", "array", value))?;
    for (i, item) in items.iter().enumerate() {
        let path = child_path("included", &i.to_string());
        let resource = expect_object(item, &path)?;
        for key in ["id", "type"] {
            let key_path = child_path(&path, key);
            let member = resource
                .get(key)
                .ok_or_else(|| AppError::validation(&key_path, "Required"))?;
            expect_str(member, &key_path)?;
        }
    }
    Ok(items.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_resource_validator;
    use crate::descriptor::ResourceDescriptor;
    use crate::shape::Shape;
    use serde_json::json;

    fn validator() -> ResourceValidator {
        compile_resource_validator(&ResourceDescriptor::new("article"))
    }

    #[test]
    fn test_single_requires_data() {
        let err = validate_document(&json!({}), DocumentKind::Single, &validator(), &DocumentMeta::Default)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "data"));
    }

    #[test]
    fn test_single_rejects_null_data() {
        let result = validate_document(
            &json!({"data": null}),
            DocumentKind::Single,
            &validator(),
            &DocumentMeta::Default,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nullable_accepts_null_data() {
        let doc = validate_document(
            &json!({"data": null}),
            DocumentKind::Nullable,
            &validator(),
            &DocumentMeta::Default,
        )
        .unwrap();
        assert_eq!(doc.data, PrimaryData::Null);
    }

    #[test]
    fn test_collection_error_path() {
        let err = validate_document(
            &json!({"data": [{"id": "1", "type": "article"}, {"id": 2, "type": "article"}]}),
            DocumentKind::Collection,
            &validator(),
            &DocumentMeta::Default,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "data.1.id"));
    }

    #[test]
    fn test_included_needs_string_id() {
        let err = validate_document(
            &json!({"data": {"id": "1", "type": "article"}, "included": [{"id": 5, "type": "person"}]}),
            DocumentKind::Single,
            &validator(),
            &DocumentMeta::Default,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "included.0.id"));
    }

    #[test]
    fn test_meta_modes() {
        let raw = json!({"data": {"id": "1", "type": "article"}, "meta": {"total": 3}});

        let doc = validate_document(&raw, DocumentKind::Single, &validator(), &DocumentMeta::Default)
            .unwrap();
        assert_eq!(doc.meta, Some(json!({"total": 3})));

        let doc = validate_document(&raw, DocumentKind::Single, &validator(), &DocumentMeta::Disabled)
            .unwrap();
        assert_eq!(doc.meta, None);

        let strict = DocumentMeta::Shape(Shape::object([("total", Shape::string())]));
        assert!(validate_document(&raw, DocumentKind::Single, &validator(), &strict).is_err());
    }

    #[test]
    fn test_null_meta_is_dropped() {
        let raw = json!({"data": {"id": "1", "type": "article"}, "meta": null});
        let nullable = DocumentMeta::Shape(Shape::open_object().nullable());
        let doc = validate_document(&raw, DocumentKind::Single, &validator(), &nullable).unwrap();
        assert_eq!(doc.meta, None);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = validate_document(&json!([]), DocumentKind::Single, &validator(), &DocumentMeta::Default)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation Error at '<root>': Expected object, received array"
        );
    }
}
