#![deny(missing_docs)]

//! # HTTP Error Translation
//!
//! Turns a non-successful JSON:API response into an [`AppError::Server`]
//! carrying the response status and the decoded error objects.

use crate::error::{AppError, AppResult, ErrorObject, ServerError};
use http::header::CONTENT_TYPE;
use http::Response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The JSON:API media type.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Body of a JSON:API error response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// The error objects.
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
    /// Top-level meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Checks a response received for `request_url`.
///
/// Succeeds for 2xx statuses. Otherwise the response must declare the
/// JSON:API media type; its body is decoded into a [`ServerError`]. A body
/// that is not a valid error document yields a server error without error
/// objects.
pub fn handle_error_response<B: AsRef<[u8]>>(
    request_url: &str,
    response: &Response<B>,
) -> AppResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if !is_json_api(content_type) {
        return Err(AppError::ContentType {
            expected: JSON_API_MEDIA_TYPE.to_string(),
            actual: content_type.unwrap_or("<missing>").to_string(),
        });
    }

    let document = match serde_json::from_slice::<ErrorDocument>(response.body().as_ref()) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(request_url, status = status.as_u16(), error = %e, "unreadable error document");
            ErrorDocument::default()
        }
    };

    Err(AppError::Server(ServerError {
        message: format!("Failed to perform request to {request_url}"),
        status: status.as_u16(),
        errors: document.errors,
        meta: document.meta,
    }))
}

/// Whether a `Content-Type` value names the JSON:API media type, ignoring
/// parameters and case.
pub fn is_json_api(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_API_MEDIA_TYPE))
}
