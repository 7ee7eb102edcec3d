//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single JSON:API error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Unique identifier for this occurrence of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Links describing the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ErrorLinks>,
    /// HTTP status code as a string.
    pub status: String,
    /// Application-specific error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short summary of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Human-readable explanation of this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// References to the source of the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    /// Non-standard meta information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// `links` member of an error object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorLinks {
    /// Link to further details about this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    /// Link identifying the type of error.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// `source` member of an error object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON Pointer to the offending value in the request document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Offending URI query parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Offending request header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// Structured error produced from a non-successful JSON:API response.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("{message} (status {status})")]
pub struct ServerError {
    /// Human readable summary, naming the request URL.
    pub message: String,
    /// HTTP status code of the response.
    pub status: u16,
    /// Error objects from the response body (empty if the body was unusable).
    pub errors: Vec<ErrorObject>,
    /// Top-level `meta` of the error document.
    pub meta: Option<Map<String, Value>>,
}

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Input does not match the compiled shape.
    #[from(ignore)]
    #[display("Validation Error at '{path}': {message}")]
    Validation {
        /// Dotted path of the offending value (e.g. `data.attributes.title`).
        path: String,
        /// What was expected.
        message: String,
    },

    /// An included relationship points at a resource missing from `included`.
    #[from(ignore)]
    #[display("No included resource with type {resource_type} and ID {id} found")]
    Lookup {
        /// Resource type of the missing resource.
        resource_type: String,
        /// Resource id of the missing resource.
        id: String,
    },

    /// An included resource references itself through a chain of relationships.
    #[from(ignore)]
    #[display("Included resource with type {resource_type} and ID {id} is part of a relationship cycle")]
    Cycle {
        /// Resource type where the cycle was detected.
        resource_type: String,
        /// Resource id where the cycle was detected.
        id: String,
    },

    /// Relationship nesting went deeper than the configured limit.
    #[from(ignore)]
    #[display("Relationship depth limit of {limit} exceeded at '{path}'")]
    DepthExceeded {
        /// Relationship path being resolved.
        path: String,
        /// Configured limit.
        limit: usize,
    },

    /// A link was present but carried no usable page parameters.
    #[from(ignore)]
    #[display("Pagination Error: {_0}")]
    Pagination(String),

    /// Non-successful response translated into a structured error.
    #[display("Server Error: {_0}")]
    Server(ServerError),

    /// An error response did not declare the JSON:API media type.
    #[from(ignore)]
    #[display("Failed to parse error response, invalid content type (expected {expected}, got {actual})")]
    ContentType {
        /// Expected media type.
        expected: String,
        /// Declared content type, or `<missing>`.
        actual: String,
    },

    /// A relationship includes a descriptor name that is not registered.
    #[from(ignore)]
    #[display("Unknown resource descriptor '{_0}'")]
    UnknownDescriptor(String),

    /// Wrapper for JSON errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for URL parse errors.
    #[display("URL Error: {_0}")]
    Url(url::ParseError),

    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a [`AppError::Validation`] at `path`.
    pub fn validation(path: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }
}
