#![deny(missing_docs)]

//! # Document Assembler
//!
//! Wraps resolved primary data with the document-level `meta` and `links`.

use crate::descriptor::ResourceDescriptor;
use crate::error::AppResult;
use crate::links::RootLinks;
use crate::pagination::CollectionPageParams;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A flattened document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document<T> {
    /// Resolved primary data.
    pub data: T,
    /// Top-level meta, unless absent or disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Top-level links, only when the descriptor asks for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<RootLinks>,
}

/// A flattened collection document with extracted page parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDocument<T> {
    /// The document itself.
    #[serde(flatten)]
    pub document: Document<Vec<T>>,
    /// Page parameters of `first` / `prev` / `next` / `last`.
    pub page_params: CollectionPageParams,
}

/// Composes the result document for `descriptor`.
pub fn assemble<T>(
    data: T,
    meta: Option<Value>,
    links: Option<RootLinks>,
    descriptor: &ResourceDescriptor,
) -> Document<T> {
    Document {
        data,
        meta,
        links: links.filter(|_| descriptor.include_document_links),
    }
}

impl Document<Value> {
    /// Deserializes the flattened resource into a caller type.
    pub fn into_typed<R: DeserializeOwned>(self) -> AppResult<Document<R>> {
        let data = serde_json::from_value(self.data)?;
        Ok(Document {
            data,
            meta: self.meta,
            links: self.links,
        })
    }
}

impl Document<Option<Value>> {
    /// Deserializes the flattened resource, if any, into a caller type.
    pub fn into_typed<R: DeserializeOwned>(self) -> AppResult<Document<Option<R>>> {
        let data = self.data.map(serde_json::from_value).transpose()?;
        Ok(Document {
            data,
            meta: self.meta,
            links: self.links,
        })
    }
}

impl CollectionDocument<Value> {
    /// Deserializes every flattened resource into a caller type.
    pub fn into_typed<R: DeserializeOwned>(self) -> AppResult<CollectionDocument<R>> {
        let data = self
            .document
            .data
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<R>, _>>()?;
        Ok(CollectionDocument {
            document: Document {
                data,
                meta: self.document.meta,
                links: self.document.links,
            },
            page_params: self.page_params,
        })
    }
}
