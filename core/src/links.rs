#![deny(missing_docs)]

//! # Links
//!
//! JSON:API link values and the top-level links object.

use crate::error::{AppError, AppResult};
use crate::shape::{child_path, expect_object, json_type_name};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// A link: either a bare URL string or a link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    /// A bare URL (absolute or relative).
    Url(String),
    /// A link object with an `href`.
    Object(LinkObject),
}

impl Link {
    /// The target of the link.
    pub fn href(&self) -> &str {
        match self {
            Link::Url(url) => url,
            Link::Object(obj) => &obj.href,
        }
    }
}

/// A JSON:API link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkObject {
    /// Link target.
    pub href: String,
    /// Link relation type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Link to a description document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describedby: Option<String>,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media type of the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Language(s) of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
    /// Non-standard meta information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Top-level `links` of a document. Unrecognized members are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootLinks {
    /// The link that generated the document.
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
    /// Related resource link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Link>,
    /// Description document link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describedby: Option<Link>,
    /// First page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
    /// Previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    /// Next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    /// Last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
}

/// Parses the top-level links object found at `path`.
///
/// Only the recognized members are validated; anything else is dropped.
pub fn parse_root_links(value: &Value, path: &str) -> AppResult<RootLinks> {
    let obj = expect_object(value, path)?;
    let member = |name: &str| -> AppResult<Option<Link>> {
        match obj.get(name) {
            Some(link) => check_link(link, &child_path(path, name)),
            None => Ok(None),
        }
    };
    Ok(RootLinks {
        self_link: member("self")?,
        related: member("related")?,
        describedby: member("describedby")?,
        first: member("first")?,
        prev: member("prev")?,
        next: member("next")?,
        last: member("last")?,
    })
}

/// Parses a map of links (resource or relationship `links`).
pub fn parse_links_map(value: &Value, path: &str) -> AppResult<IndexMap<String, Option<Link>>> {
    let obj = expect_object(value, path)?;
    let mut out = IndexMap::with_capacity(obj.len());
    for (rel, link) in obj {
        out.insert(rel.clone(), check_link(link, &child_path(path, rel))?);
    }
    Ok(out)
}

fn check_link(value: &Value, path: &str) -> AppResult<Option<Link>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Link::Url(s.clone()))),
        Value::Object(obj) => {
            if !obj.get("href").is_some_and(Value::is_string) {
                return Err(AppError::validation(
                    &child_path(path, "href"),
                    "Expected string",
                ));
            }
            let link: LinkObject = serde_json::from_value(value.clone())
                .map_err(|e| AppError::validation(path, e.to_string()))?;
            if let Some(describedby) = &link.describedby {
                Url::parse(describedby).map_err(|_| {
                    AppError::validation(&child_path(path, "describedby"), "Invalid url")
                })?;
            }
            Ok(Some(Link::Object(link)))
        }
        other => Err(AppError::validation(
            path,
            format!("Expected link, received {}", json_type_name(other)),
        )),
    }
}
