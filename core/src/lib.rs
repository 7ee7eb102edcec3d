#![deny(missing_docs)]

//! # JSON:API Core
//!
//! Parses JSON:API documents against declared resource descriptors and
//! flattens them: attributes are lifted next to `id`, included relationships
//! are replaced by their resolved resources, and reference relationships
//! become `{ id }` objects.

/// Shared error types.
pub mod error;

/// Value shapes used for attributes, links and meta.
pub mod shape;

/// JSON:API link objects.
pub mod links;

/// Resource descriptors and their registry.
pub mod descriptor;

/// Descriptor to validator compilation.
pub mod compiler;

/// Top-level document validation.
pub mod document;

/// Lookup of side-loaded resources.
pub mod index;

/// Relationship resolution.
pub mod resolver;

/// Result document assembly.
pub mod assembler;

/// Page parameter extraction and injection.
pub mod pagination;

/// Selector construction and execution.
pub mod selector;

/// Translation of HTTP error responses.
pub mod http_error;

pub use assembler::{CollectionDocument, Document};
pub use compiler::{compile_resource_validator, ResourceValidator, ValidatorCache};
pub use descriptor::{
    Cardinality, DescriptorRef, DescriptorRegistry, DocumentMeta, RelationshipDescriptor,
    ResourceDescriptor,
};
pub use error::{AppError, AppResult, ErrorObject, ServerError};
pub use http_error::{handle_error_response, JSON_API_MEDIA_TYPE};
pub use links::{Link, LinkObject, RootLinks};
pub use pagination::{
    extract_page_params, inject_page_params, require_page_params, CollectionPageParams,
    PageParams,
};
pub use selector::{
    create_data_selector, create_nullable_resource_selector, create_resource_collection_selector,
    create_resource_selector, DataSelector, NullableResourceSelector, ResourceCollectionSelector,
    ResourceSelector, Selector, SelectorOptions,
};
pub use shape::{Shape, UnknownKeys};
