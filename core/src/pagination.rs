#![deny(missing_docs)]

//! # Pagination
//!
//! Reads and writes `page[<key>]` query parameters.
//!
//! A pagination link handed out by the server must carry at least one page
//! parameter; a link without any is reported as an error rather than treated
//! as an empty page.

use crate::error::{AppError, AppResult};
use crate::links::{Link, RootLinks};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use url::Url;

/// Base used to parse relative links. Never appears in results.
const RELATIVE_BASE: &str = "http://example.invalid/";

const PAGE_PARAM_PATTERN: &str = r"^page\[([a-zA-Z0-9]+)]$";

/// Page parameters by key (`page[number]=2` → `number: "2"`).
pub type PageParams = BTreeMap<String, String>;

/// Page parameters of the four pagination links of a collection document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPageParams {
    /// From `links.first`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<PageParams>,
    /// From `links.prev`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageParams>,
    /// From `links.next`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageParams>,
    /// From `links.last`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<PageParams>,
}

impl CollectionPageParams {
    /// Extracts page parameters from the pagination links, if any.
    pub fn from_links(links: Option<&RootLinks>) -> AppResult<Self> {
        let Some(links) = links else {
            return Ok(Self::default());
        };
        Ok(Self {
            first: extract_page_params(links.first.as_ref())?,
            prev: extract_page_params(links.prev.as_ref())?,
            next: extract_page_params(links.next.as_ref())?,
            last: extract_page_params(links.last.as_ref())?,
        })
    }
}

fn page_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PAGE_PARAM_PATTERN).expect("Invalid regex"))
}

fn parse_link_url(href: &str) -> AppResult<Url> {
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Url::parse(RELATIVE_BASE)?.join(href)?),
        Err(e) => Err(e.into()),
    }
}

/// Extracts page parameters from a link.
///
/// Returns `Ok(None)` when there is no link, and fails when the link carries
/// no `page[...]` parameter.
pub fn extract_page_params(link: Option<&Link>) -> AppResult<Option<PageParams>> {
    let Some(link) = link else {
        return Ok(None);
    };

    let href = link.href();
    let url = parse_link_url(href)?;
    let re = page_param_regex();

    let params: PageParams = url
        .query_pairs()
        .filter_map(|(key, value)| {
            re.captures(&key)
                .map(|caps| (caps[1].to_string(), value.into_owned()))
        })
        .collect();

    if params.is_empty() {
        return Err(AppError::Pagination(format!(
            "No page params found in link {href}"
        )));
    }

    Ok(Some(params))
}

/// Unwraps page parameters that must be present.
pub fn require_page_params(params: Option<PageParams>) -> AppResult<PageParams> {
    params.ok_or_else(|| AppError::Pagination("Missing page params".to_string()))
}

/// Writes each parameter onto `url` as `page[key]=value`.
///
/// An existing parameter of the same name is replaced in place (later
/// duplicates removed); new ones are appended. Does nothing without params.
pub fn inject_page_params(url: &mut Url, params: Option<&PageParams>) {
    let Some(params) = params else {
        return;
    };
    if params.is_empty() {
        return;
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in params {
        let name = format!("page[{key}]");
        let mut seen = false;
        pairs.retain_mut(|(k, v)| {
            if *k != name {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.clone();
            true
        });
        if !seen {
            pairs.push((name, value.clone()));
        }
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}
