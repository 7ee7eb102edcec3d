#![deny(missing_docs)]

//! # Selectors
//!
//! Callable parsers built once from a [`ResourceDescriptor`]:
//!
//! - [`ResourceSelector`]: `data` is a single resource.
//! - [`NullableResourceSelector`]: `data` is a single resource or `null`.
//! - [`ResourceCollectionSelector`]: `data` is an array; page parameters of
//!   the pagination links are extracted as well.
//! - [`DataSelector`]: wraps any of the above and keeps only `data`.
//!
//! Each selector owns its validator cache, which is shared between calls.
//! Everything else (the included index, memoized results, the cycle guard) is
//! built fresh for each call.

use crate::assembler::{assemble, CollectionDocument, Document};
use crate::compiler::{compile_resource_validator, ResourceValidator, ValidatorCache};
use crate::descriptor::{DescriptorRegistry, ResourceDescriptor};
use crate::document::{validate_document, DocumentKind, PrimaryData};
use crate::error::{AppError, AppResult};
use crate::index::IncludedIndex;
use crate::links::RootLinks;
use crate::pagination::CollectionPageParams;
use crate::resolver::Resolver;
use serde_json::Value;
use std::sync::Arc;

/// Options shared by all selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorOptions {
    /// Maximum nesting of included relationships; `None` for no limit.
    pub max_depth: Option<usize>,
}

/// A parser from a raw JSON:API document to a flattened result.
pub trait Selector {
    /// The flattened result.
    type Output;

    /// Parses an already decoded document.
    fn select(&self, raw: &Value) -> AppResult<Self::Output>;

    /// Decodes and parses a JSON document.
    fn select_str(&self, raw: &str) -> AppResult<Self::Output> {
        let value: Value = serde_json::from_str(raw)?;
        self.select(&value)
    }
}

/// Results that carry primary data.
pub trait IntoData {
    /// The primary data.
    type Data;

    /// Drops everything but the primary data.
    fn into_data(self) -> Self::Data;
}

impl<T> IntoData for Document<T> {
    type Data = T;

    fn into_data(self) -> T {
        self.data
    }
}

impl<T> IntoData for CollectionDocument<T> {
    type Data = Vec<T>;

    fn into_data(self) -> Vec<T> {
        self.document.data
    }
}

struct Resolved<D> {
    data: D,
    meta: Option<Value>,
    links: Option<RootLinks>,
}

fn kind_mismatch(kind: DocumentKind) -> AppError {
    AppError::General(format!("Primary data does not match document kind {kind:?}"))
}

fn resolve_one(resolver: &mut Resolver<'_>, data: PrimaryData) -> AppResult<Value> {
    match data {
        PrimaryData::One(resource) => resolver.resolve(resource, None),
        _ => Err(kind_mismatch(DocumentKind::Single)),
    }
}

fn resolve_nullable(resolver: &mut Resolver<'_>, data: PrimaryData) -> AppResult<Option<Value>> {
    match data {
        PrimaryData::Null => Ok(None),
        PrimaryData::One(resource) => resolver.resolve(resource, None).map(Some),
        PrimaryData::Many(_) => Err(kind_mismatch(DocumentKind::Nullable)),
    }
}

fn resolve_many(resolver: &mut Resolver<'_>, data: PrimaryData) -> AppResult<Vec<Value>> {
    match data {
        PrimaryData::Many(resources) => resources
            .into_iter()
            .map(|resource| resolver.resolve(resource, None))
            .collect(),
        _ => Err(kind_mismatch(DocumentKind::Collection)),
    }
}

/// State shared by the three selector kinds.
#[derive(Debug)]
struct SelectorCore {
    descriptor: Arc<ResourceDescriptor>,
    root: ResourceValidator,
    cache: ValidatorCache,
    options: SelectorOptions,
}

impl SelectorCore {
    fn new(descriptor: Arc<ResourceDescriptor>, registry: Arc<DescriptorRegistry>) -> Self {
        let root = compile_resource_validator(&descriptor);
        Self {
            descriptor,
            root,
            cache: ValidatorCache::new(registry),
            options: SelectorOptions::default(),
        }
    }

    fn from_registry(registry: Arc<DescriptorRegistry>, resource_type: &str) -> AppResult<Self> {
        let descriptor = registry.require(resource_type)?;
        Ok(Self::new(descriptor, registry))
    }

    fn run<D>(
        &self,
        raw: &Value,
        kind: DocumentKind,
        resolve: fn(&mut Resolver<'_>, PrimaryData) -> AppResult<D>,
    ) -> AppResult<Resolved<D>> {
        let document = validate_document(raw, kind, &self.root, &self.descriptor.document_meta)?;
        let index = IncludedIndex::build(document.included);
        let included = index.len();
        let mut resolver = Resolver::new(&self.cache, index, self.options.max_depth);

        let data = resolve(&mut resolver, document.data)?;

        let stats = resolver.stats();
        tracing::debug!(
            resource_type = %self.descriptor.resource_type,
            ?kind,
            included,
            validated = stats.validated,
            memo_hits = stats.memo_hits,
            references = stats.references,
            "resolved document"
        );

        Ok(Resolved {
            data,
            meta: document.meta,
            links: document.links,
        })
    }

    fn compiled_paths(&self) -> Vec<String> {
        self.cache.compiled_paths()
    }
}

macro_rules! selector_common {
    ($name:ident) => {
        impl $name {
            /// Creates a selector for `descriptor`; named includes cannot be resolved.
            pub fn new(descriptor: impl Into<Arc<ResourceDescriptor>>) -> Self {
                Self::with_registry(descriptor, Arc::new(DescriptorRegistry::new()))
            }

            /// Creates a selector resolving named includes against `registry`.
            pub fn with_registry(
                descriptor: impl Into<Arc<ResourceDescriptor>>,
                registry: Arc<DescriptorRegistry>,
            ) -> Self {
                Self {
                    core: SelectorCore::new(descriptor.into(), registry),
                }
            }

            /// Creates a selector for the registered descriptor of `resource_type`.
            pub fn from_registry(
                registry: Arc<DescriptorRegistry>,
                resource_type: &str,
            ) -> AppResult<Self> {
                Ok(Self {
                    core: SelectorCore::from_registry(registry, resource_type)?,
                })
            }

            /// Replaces the selector options.
            pub fn with_options(mut self, options: SelectorOptions) -> Self {
                self.core.options = options;
                self
            }

            /// Relationship paths whose validators have been compiled so far.
            pub fn compiled_paths(&self) -> Vec<String> {
                self.core.compiled_paths()
            }
        }
    };
}

/// Selector for documents whose `data` is one resource.
#[derive(Debug)]
pub struct ResourceSelector {
    core: SelectorCore,
}

/// Selector for documents whose `data` is one resource or `null`.
#[derive(Debug)]
pub struct NullableResourceSelector {
    core: SelectorCore,
}

/// Selector for documents whose `data` is an array of resources.
#[derive(Debug)]
pub struct ResourceCollectionSelector {
    core: SelectorCore,
}

selector_common!(ResourceSelector);
selector_common!(NullableResourceSelector);
selector_common!(ResourceCollectionSelector);

impl Selector for ResourceSelector {
    type Output = Document<Value>;

    fn select(&self, raw: &Value) -> AppResult<Self::Output> {
        let resolved = self.core.run(raw, DocumentKind::Single, resolve_one)?;
        Ok(assemble(
            resolved.data,
            resolved.meta,
            resolved.links,
            &self.core.descriptor,
        ))
    }
}

impl Selector for NullableResourceSelector {
    type Output = Document<Option<Value>>;

    fn select(&self, raw: &Value) -> AppResult<Self::Output> {
        let resolved = self.core.run(raw, DocumentKind::Nullable, resolve_nullable)?;
        Ok(assemble(
            resolved.data,
            resolved.meta,
            resolved.links,
            &self.core.descriptor,
        ))
    }
}

impl Selector for ResourceCollectionSelector {
    type Output = CollectionDocument<Value>;

    fn select(&self, raw: &Value) -> AppResult<Self::Output> {
        let resolved = self.core.run(raw, DocumentKind::Collection, resolve_many)?;
        let page_params = CollectionPageParams::from_links(resolved.links.as_ref())?;
        Ok(CollectionDocument {
            document: assemble(resolved.data, resolved.meta, resolved.links, &self.core.descriptor),
            page_params,
        })
    }
}

/// Keeps only the primary data of another selector's result.
#[derive(Debug)]
pub struct DataSelector<S> {
    inner: S,
}

impl<S> Selector for DataSelector<S>
where
    S: Selector,
    S::Output: IntoData,
{
    type Output = <S::Output as IntoData>::Data;

    fn select(&self, raw: &Value) -> AppResult<Self::Output> {
        Ok(self.inner.select(raw)?.into_data())
    }
}

/// Creates a selector for single-resource documents.
pub fn create_resource_selector(
    descriptor: impl Into<Arc<ResourceDescriptor>>,
) -> ResourceSelector {
    ResourceSelector::new(descriptor)
}

/// Creates a selector for documents whose resource may be `null`.
pub fn create_nullable_resource_selector(
    descriptor: impl Into<Arc<ResourceDescriptor>>,
) -> NullableResourceSelector {
    NullableResourceSelector::new(descriptor)
}

/// Creates a selector for collection documents.
pub fn create_resource_collection_selector(
    descriptor: impl Into<Arc<ResourceDescriptor>>,
) -> ResourceCollectionSelector {
    ResourceCollectionSelector::new(descriptor)
}

/// Wraps a selector so it returns only the primary data.
pub fn create_data_selector<S>(selector: S) -> DataSelector<S>
where
    S: Selector,
    S::Output: IntoData,
{
    DataSelector { inner: selector }
}
