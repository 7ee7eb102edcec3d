#![deny(missing_docs)]

//! # Shapes
//!
//! A small structural validation language for the free-form parts of a
//! JSON:API document (attributes, links, meta).
//!
//! A [`Shape`] accepts or rejects a `serde_json::Value` and returns the
//! narrowed value: unknown object keys are stripped unless the object shape
//! says otherwise, missing values are only accepted by `optional` and `any`.
//!
//! Shapes are plain data and round-trip through serde, so they can be authored
//! in YAML next to the resource descriptors:
//!
//! ```yaml
//! type: object
//! properties:
//!   title: { type: string }
//!   tags: { type: array, items: { type: string } }
//!   subtitle: { type: optional, inner: { type: string } }
//! ```

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// What an object shape does with keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    /// Drop undeclared keys from the output.
    #[default]
    Strip,
    /// Copy undeclared keys to the output unchanged.
    Passthrough,
    /// Reject objects with undeclared keys.
    Strict,
}

/// A structural description of a JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Any value, including a missing one.
    Any,
    /// A JSON string.
    String,
    /// A string holding an absolute URL.
    Url,
    /// Any JSON number.
    Number,
    /// A JSON number without a fractional part.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// Exactly `null`.
    Null,
    /// A value equal to the given literal.
    Literal {
        /// The literal value.
        value: Value,
    },
    /// An array whose items all match `items`.
    Array {
        /// Shape of each item.
        items: Box<Shape>,
    },
    /// An object with declared properties.
    Object {
        /// Declared properties, validated in order.
        #[serde(default)]
        properties: IndexMap<String, Shape>,
        /// Handling of undeclared keys.
        #[serde(default, rename = "unknownKeys", alias = "unknown_keys")]
        unknown_keys: UnknownKeys,
    },
    /// An object with arbitrary keys whose values all match `values`.
    Record {
        /// Shape of each value.
        values: Box<Shape>,
    },
    /// `null` or a value matching `inner`.
    Nullable {
        /// The non-null shape.
        inner: Box<Shape>,
    },
    /// A missing value or a value matching `inner`.
    Optional {
        /// The shape of a present value.
        inner: Box<Shape>,
    },
    /// The first matching variant wins.
    Union {
        /// Candidate shapes.
        variants: Vec<Shape>,
    },
}

impl Shape {
    /// A string shape.
    pub fn string() -> Self {
        Shape::String
    }

    /// An absolute URL shape.
    pub fn url() -> Self {
        Shape::Url
    }

    /// A number shape.
    pub fn number() -> Self {
        Shape::Number
    }

    /// An integer shape.
    pub fn integer() -> Self {
        Shape::Integer
    }

    /// A boolean shape.
    pub fn boolean() -> Self {
        Shape::Boolean
    }

    /// Accepts anything.
    pub fn any() -> Self {
        Shape::Any
    }

    /// A literal shape.
    pub fn literal(value: impl Into<Value>) -> Self {
        Shape::Literal {
            value: value.into(),
        }
    }

    /// An array of `items`.
    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
        }
    }

    /// An object with the given properties; undeclared keys are stripped.
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Shape)>,
    {
        Shape::Object {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
            unknown_keys: UnknownKeys::Strip,
        }
    }

    /// An object map with values of the given shape.
    pub fn record(values: Shape) -> Self {
        Shape::Record {
            values: Box::new(values),
        }
    }

    /// The open object map used for `meta` members.
    pub fn open_object() -> Self {
        Shape::record(Shape::Any)
    }

    /// Any of the given shapes.
    pub fn union(variants: impl IntoIterator<Item = Shape>) -> Self {
        Shape::Union {
            variants: variants.into_iter().collect(),
        }
    }

    /// Allows `null` in addition to this shape.
    pub fn nullable(self) -> Self {
        Shape::Nullable {
            inner: Box::new(self),
        }
    }

    /// Allows the value to be missing.
    pub fn optional(self) -> Self {
        Shape::Optional {
            inner: Box::new(self),
        }
    }

    /// Switches an object shape to keep undeclared keys. Other shapes are returned unchanged.
    pub fn passthrough(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Passthrough)
    }

    /// Switches an object shape to reject undeclared keys. Other shapes are returned unchanged.
    pub fn strict(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Strict)
    }

    fn with_unknown_keys(self, mode: UnknownKeys) -> Self {
        match self {
            Shape::Object { properties, .. } => Shape::Object {
                properties,
                unknown_keys: mode,
            },
            other => other,
        }
    }

    /// Validates a present value, failing if it is missing.
    pub fn parse(&self, value: &Value, path: &str) -> AppResult<Value> {
        self.validate(Some(value), path)?
            .ok_or_else(|| AppError::validation(path, "Required"))
    }

    /// Validates a possibly missing value.
    ///
    /// Returns `Ok(None)` when the value is missing and the shape allows that.
    pub fn validate(&self, value: Option<&Value>, path: &str) -> AppResult<Option<Value>> {
        let value = match (self, value) {
            (Shape::Optional { .. }, None) | (Shape::Any, None) => return Ok(None),
            (_, None) => return Err(AppError::validation(path, "Required")),
            (_, Some(v)) => v,
        };

        let out = match self {
            Shape::Any => value.clone(),
            Shape::String => Value::String(expect_str(value, path)?.to_string()),
            Shape::Url => {
                let s = expect_str(value, path)?;
                Url::parse(s).map_err(|e| AppError::validation(path, format!("Invalid url: {e}")))?;
                Value::String(s.to_string())
            }
            Shape::Number => match value {
                Value::Number(_) => value.clone(),
                other => return Err(type_mismatch(path, "number", other)),
            },
            Shape::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => value.clone(),
                Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => value.clone(),
                other => return Err(type_mismatch(path, "integer", other)),
            },
            Shape::Boolean => match value {
                Value::Bool(_) => value.clone(),
                other => return Err(type_mismatch(path, "boolean", other)),
            },
            Shape::Null => match value {
                Value::Null => Value::Null,
                other => return Err(type_mismatch(path, "null", other)),
            },
            Shape::Literal { value: expected } => {
                if value != expected {
                    return Err(AppError::validation(
                        path,
                        format!("Invalid literal value, expected {expected}"),
                    ));
                }
                value.clone()
            }
            Shape::Array { items } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| type_mismatch(path, "array", value))?;
                let mut out = Vec::with_capacity(arr.len());
                for (i, item) in arr.iter().enumerate() {
                    out.push(items.parse(item, &child_path(path, &i.to_string()))?);
                }
                Value::Array(out)
            }
            Shape::Object {
                properties,
                unknown_keys,
            } => {
                let obj = expect_object(value, path)?;
                Value::Object(validate_object(obj, properties, *unknown_keys, path)?)
            }
            Shape::Record { values } => {
                let obj = expect_object(value, path)?;
                let mut out = Map::with_capacity(obj.len());
                for (k, v) in obj {
                    out.insert(k.clone(), values.parse(v, &child_path(path, k))?);
                }
                Value::Object(out)
            }
            Shape::Nullable { inner } => {
                if value.is_null() {
                    Value::Null
                } else {
                    inner.parse(value, path)?
                }
            }
            Shape::Optional { inner } => inner.parse(value, path)?,
            Shape::Union { variants } => {
                let mut last_err = None;
                for variant in variants {
                    match variant.parse(value, path) {
                        Ok(v) => return Ok(Some(v)),
                        Err(e) => last_err = Some(e),
                    }
                }
                return Err(last_err
                    .unwrap_or_else(|| AppError::validation(path, "Invalid input, empty union")));
            }
        };

        Ok(Some(out))
    }
}

fn validate_object(
    obj: &Map<String, Value>,
    properties: &IndexMap<String, Shape>,
    unknown_keys: UnknownKeys,
    path: &str,
) -> AppResult<Map<String, Value>> {
    let mut out = Map::with_capacity(properties.len());
    for (key, shape) in properties {
        if let Some(v) = shape.validate(obj.get(key), &child_path(path, key))? {
            out.insert(key.clone(), v);
        }
    }

    match unknown_keys {
        UnknownKeys::Strip => {}
        UnknownKeys::Passthrough => {
            for (k, v) in obj {
                if !properties.contains_key(k) {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
        UnknownKeys::Strict => {
            if let Some(extra) = obj.keys().find(|k| !properties.contains_key(*k)) {
                return Err(AppError::validation(
                    path,
                    format!("Unrecognized key '{extra}'"),
                ));
            }
        }
    }

    Ok(out)
}

/// Joins a dotted path with a child segment.
pub(crate) fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

/// Human-readable JSON type name used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn type_mismatch(path: &str, expected: &str, got: &Value) -> AppError {
    AppError::validation(
        path,
        format!("Expected {expected}, received {}", json_type_name(got)),
    )
}

pub(crate) fn expect_str<'a>(value: &'a Value, path: &str) -> AppResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| type_mismatch(path, "string", value))
}

pub(crate) fn expect_object<'a>(value: &'a Value, path: &str) -> AppResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| type_mismatch(path, "object", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_strips_unknown_keys() {
        let shape = Shape::object([("title", Shape::string())]);
        let out = shape
            .parse(&json!({"title": "foo", "extra": 1}), "attributes")
            .unwrap();
        assert_eq!(out, json!({"title": "foo"}));
    }

    #[test]
    fn test_object_passthrough_keeps_unknown_keys() {
        let shape = Shape::object([("title", Shape::string())]).passthrough();
        let out = shape.parse(&json!({"title": "foo", "extra": 1}), "").unwrap();
        assert_eq!(out, json!({"title": "foo", "extra": 1}));
    }

    #[test]
    fn test_strict_object_rejects_unknown_keys() {
        let shape = Shape::object([("title", Shape::string())]).strict();
        let err = shape
            .parse(&json!({"title": "foo", "extra": 1}), "attributes")
            .unwrap_err();
        assert!(err.to_string().contains("Unrecognized key 'extra'"));
    }

    #[test]
    fn test_missing_required_property_reports_path() {
        let shape = Shape::object([("title", Shape::string())]);
        let err = shape.parse(&json!({}), "data.attributes").unwrap_err();
        match err {
            AppError::Validation { path, message } => {
                assert_eq!(path, "data.attributes.title");
                assert_eq!(message, "Required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_property_is_omitted() {
        let shape = Shape::object([
            ("title", Shape::string()),
            ("subtitle", Shape::string().optional()),
        ]);
        let out = shape.parse(&json!({"title": "a"}), "").unwrap();
        assert_eq!(out, json!({"title": "a"}));
    }

    #[test]
    fn test_nullable_and_literal() {
        let shape = Shape::literal("article").nullable();
        assert_eq!(shape.parse(&json!(null), "").unwrap(), json!(null));
        assert_eq!(shape.parse(&json!("article"), "").unwrap(), json!("article"));
        assert!(shape.parse(&json!("person"), "").is_err());
    }

    #[test]
    fn test_array_error_path_includes_index() {
        let shape = Shape::array(Shape::integer());
        let err = shape.parse(&json!([1, 2, "x"]), "tags").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref path, .. } if path == "tags.2"));
    }

    #[test]
    fn test_url_requires_absolute_url() {
        assert!(Shape::url().parse(&json!("https://example.com/"), "").is_ok());
        assert!(Shape::url().parse(&json!("/relative"), "").is_err());
    }

    #[test]
    fn test_union_takes_first_match() {
        let shape = Shape::union([Shape::string(), Shape::number()]);
        assert_eq!(shape.parse(&json!(3), "").unwrap(), json!(3));
        assert!(shape.parse(&json!(true), "").is_err());
    }

    #[test]
    fn test_shape_from_yaml() {
        let yaml = r#"
type: object
unknownKeys: passthrough
properties:
  title: { type: string }
  count: { type: optional, inner: { type: integer } }
"#;
        let shape: Shape = serde_yaml::from_str(yaml).unwrap();
        let expected = Shape::object([
            ("title", Shape::string()),
            ("count", Shape::integer().optional()),
        ])
        .passthrough();
        assert_eq!(shape, expected);
    }
}
