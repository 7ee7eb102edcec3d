#![deny(missing_docs)]

//! # Page Commands
//!
//! - `page-params`: prints the `page[...]` parameters of a link as JSON.
//! - `page-url`: writes `page[...]` parameters onto a URL.

use crate::error::CliResult;
use jsonapi_core::{extract_page_params, inject_page_params, require_page_params, Link, PageParams};
use url::Url;

/// Arguments for the page-params command.
#[derive(clap::Args, Debug, Clone)]
pub struct PageParamsArgs {
    /// Pagination link, absolute or relative.
    #[clap(long)]
    pub link: String,
}

/// Arguments for the page-url command.
#[derive(clap::Args, Debug, Clone)]
pub struct PageUrlArgs {
    /// Absolute URL to add the parameters to.
    #[clap(long)]
    pub url: String,

    /// Page parameter as `key=value` (e.g. `number=2`). Repeatable.
    #[clap(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

/// Helper to parse "key=value" arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Executes the page-params command.
pub fn execute_params(args: &PageParamsArgs) -> CliResult<()> {
    let params = page_params(&args.link)?;
    println!("{}", serde_json::to_string(&params)?);
    Ok(())
}

/// Executes the page-url command.
pub fn execute_url(args: &PageUrlArgs) -> CliResult<()> {
    println!("{}", page_url(&args.url, &args.params)?);
    Ok(())
}

/// Extracts the page parameters of `link`, failing when there are none.
pub fn page_params(link: &str) -> CliResult<PageParams> {
    let params = extract_page_params(Some(&Link::Url(link.to_string())))?;
    Ok(require_page_params(params)?)
}

/// Returns `url` with `params` written onto it.
pub fn page_url(url: &str, params: &[(String, String)]) -> CliResult<String> {
    let mut url = Url::parse(url)?;
    let params: PageParams = params.iter().cloned().collect();
    inject_page_params(&mut url, Some(&params));
    tracing::debug!(%url, "injected page params");
    Ok(url.to_string())
}
