//! Configuration file handling.
//!
//! The configuration file is stored at `$YNAB_TRENDS_HOME/config.json` and contains the Budgeting
//! API base URL and the location of the access token. The preference store lives next to it in
//! `$YNAB_TRENDS_HOME/preferences.json`.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "ynab-trends";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const API_TOKEN: &str = "api_token";
const CONFIG_JSON: &str = "config.json";
const PREFERENCES_JSON: &str = "preferences.json";

/// The default base URL of the YNAB API.
pub const DEFAULT_API_URL: &str = "https://api.ynab.com/v1";

/// When set, this environment variable takes precedence over the token file.
pub const ACCESS_TOKEN_ENV: &str = "YNAB_ACCESS_TOKEN";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$YNAB_TRENDS_HOME` and from there it loads `$YNAB_TRENDS_HOME/config.json`. It
/// provides paths to other items that are either configurable or are expected in a certain
/// location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `api_url` along with default settings
    /// - Copies `token_file` into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/ynab-trends`
    /// - `token_file` - A file holding a YNAB personal access token.
    /// - `api_url` - The base URL of the Budgeting API, e.g. `https://api.ynab.com/v1`
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if `api_url` is not a valid URL.
    pub async fn create(dir: impl Into<PathBuf>, token_file: &Path, api_url: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        utils::copy(token_file, secrets_dir.join(API_TOKEN)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: api_url.to_string(),
            token_path: None,
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The home directory is missing, run 'trends init' first")?;
        let _ = utils::read_dir(&root).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_JSON)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Reads the access token from `YNAB_ACCESS_TOKEN`, falling back to the token file.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            return Ok(token.trim().to_string());
        }
        let path = self.token_path();
        let token = utils::read(&path)
            .await
            .context("Unable to read the API access token")?;
        let token = token.trim();
        if token.is_empty() {
            bail!("The API access token file is empty '{}'", path.display());
        }
        Ok(token.to_string())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ynab-trends",
///   "config_version": 1,
///   "api_url": "https://api.ynab.com/v1",
///   "token_path": ".secrets/api_token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ynab-trends"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the Budgeting API
    #[serde(default = "default_api_url")]
    api_url: String,

    /// Path to the access token file (optional, relative to config.json or absolute)
    /// Defaults to $YNAB_TRENDS_HOME/.secrets/api_token if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: default_api_url(),
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the token path.
    ///
    /// If None, defaults to $YNAB_TRENDS_HOME/.secrets/api_token
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_TOKEN))
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Parses the API base URL. A trailing slash is removed so that endpoint paths can be appended.
fn parse_api_url(s: &str) -> Result<Url> {
    let trimmed = s.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("Invalid API URL '{s}'"))?;
    if url.cannot_be_a_base() {
        bail!("The API URL '{s}' cannot be used as a base URL");
    }
    Ok(url)
}
