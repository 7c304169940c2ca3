use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `api_url` along with default settings
/// - Copies `token_file` into its default location in the data dir.
///
/// # Arguments
/// - `trends_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/ynab-trends`
/// - `token_file` - A file holding a YNAB personal access token. This will be copied from the
///   `token_file` path to its default location and name in the data directory.
/// - `api_url` - The base URL of the YNAB API, e.g. https://api.ynab.com/v1
///
/// # Errors
/// - Returns an error if any file operations fail or if `api_url` is not a valid URL.
pub async fn init(trends_home: &Path, token_file: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(trends_home, token_file, api_url)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the ynab-trends directory at {}",
        config.root().display()
    )
    .into())
}
