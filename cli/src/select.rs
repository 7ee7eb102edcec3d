#![deny(missing_docs)]

//! # Select Command
//!
//! Parses a JSON:API document with a descriptor from a registry file and
//! prints the flattened result.

use crate::error::CliResult;
use jsonapi_core::selector::IntoData;
use jsonapi_core::{
    create_data_selector, DescriptorRegistry, NullableResourceSelector,
    ResourceCollectionSelector, ResourceSelector, Selector, SelectorOptions,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Form of the document's primary data.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A single resource.
    Single,
    /// A single resource or `null`.
    Nullable,
    /// An array of resources.
    Collection,
}

/// Arguments for the select command.
#[derive(clap::Args, Debug, Clone)]
pub struct SelectArgs {
    /// Descriptor registry file (YAML, or JSON with a `.json` extension).
    #[clap(long, env = "JSONAPI_REGISTRY")]
    pub registry: PathBuf,

    /// Resource type of the primary data.
    #[clap(long = "type")]
    pub resource_type: String,

    /// Form of the primary data.
    #[clap(long, value_enum, default_value_t = Kind::Single)]
    pub kind: Kind,

    /// Document to parse. Reads stdin when omitted.
    #[clap(long)]
    pub input: Option<PathBuf>,

    /// Print only the primary data.
    #[clap(long)]
    pub data_only: bool,

    /// Maximum nesting of included relationships.
    #[clap(long)]
    pub max_depth: Option<usize>,

    /// Pretty-print the output.
    #[clap(long)]
    pub pretty: bool,
}

/// Executes the select command.
pub fn execute(args: &SelectArgs) -> CliResult<()> {
    let raw = read_input(args.input.as_deref())?;
    let output = run(args, &raw)?;
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

/// Parses `raw` as described by `args`.
pub fn run(args: &SelectArgs, raw: &str) -> CliResult<Value> {
    let registry = Arc::new(DescriptorRegistry::from_path(&args.registry)?);
    tracing::info!(
        registry = %args.registry.display(),
        resource_type = %args.resource_type,
        kind = ?args.kind,
        "selecting"
    );

    let options = SelectorOptions {
        max_depth: args.max_depth,
    };
    let name = args.resource_type.as_str();

    match args.kind {
        Kind::Single => select_with(
            ResourceSelector::from_registry(registry, name)?.with_options(options),
            raw,
            args.data_only,
        ),
        Kind::Nullable => select_with(
            NullableResourceSelector::from_registry(registry, name)?.with_options(options),
            raw,
            args.data_only,
        ),
        Kind::Collection => select_with(
            ResourceCollectionSelector::from_registry(registry, name)?.with_options(options),
            raw,
            args.data_only,
        ),
    }
}

fn select_with<S>(selector: S, raw: &str, data_only: bool) -> CliResult<Value>
where
    S: Selector,
    S::Output: IntoData + Serialize,
    <S::Output as IntoData>::Data: Serialize,
{
    let value = if data_only {
        serde_json::to_value(create_data_selector(selector).select_str(raw)?)?
    } else {
        serde_json::to_value(selector.select_str(raw)?)?
    };
    Ok(value)
}

fn read_input(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
