//! These structs provide the CLI interface for the trends CLI.

use crate::config::DEFAULT_API_URL;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// trends: Year-over-year spending analysis for your YNAB budgets.
///
/// The program downloads a year of transactions and the year before it from the YNAB API
/// (see https://api.ynab.com), totals your spending per category and per category group, converts
/// the totals into monthly averages and shows how each average changed against the previous year.
///
/// You will need a YNAB personal access token. Create one under Account Settings > Developer
/// Settings in the YNAB web app, save it to a file and pass that file to `trends init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass it as --trends-home. By default it will be $HOME/ynab-trends.
    Init(InitArgs),
    /// List the budgets of your YNAB account. Selects the first one if none is selected yet.
    Budgets,
    /// Select the budget that `trends analyze` uses by default.
    Select(SelectArgs),
    /// Compare the monthly spending averages of a year against the previous year.
    Analyze(AnalyzeArgs),
    /// Show or toggle the color theme preference.
    Theme(ThemeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and preferences are held. Defaults to ~/ynab-trends
    #[arg(long, env = "YNAB_TRENDS_HOME", default_value_t = default_trends_home())]
    trends_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, trends_home: PathBuf) -> Self {
        Self {
            log_level,
            trends_home: trends_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn trends_home(&self) -> &DisplayPath {
        &self.trends_home
    }
}

/// (Not shown): Args for the `trends init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// A file holding your YNAB personal access token. It will be copied to the secrets directory
    /// inside the data directory.
    #[arg(long)]
    api_token_file: PathBuf,

    /// The base URL of the YNAB API.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_token_file: impl Into<PathBuf>, api_url: impl Into<String>) -> Self {
        Self {
            api_token_file: api_token_file.into(),
            api_url: api_url.into(),
        }
    }

    pub fn api_token_file(&self) -> &Path {
        &self.api_token_file
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// (Not shown): Args for the `trends select` command.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// The id of the budget, as listed by `trends budgets`.
    budget_id: String,
}

impl SelectArgs {
    pub fn new(budget_id: impl Into<String>) -> Self {
        Self {
            budget_id: budget_id.into(),
        }
    }

    pub fn budget_id(&self) -> &str {
        &self.budget_id
    }
}

/// (Not shown): Args for the `trends analyze` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct AnalyzeArgs {
    /// The year to analyze. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,

    /// The budget to analyze. Defaults to the selected budget.
    #[arg(long)]
    budget: Option<String>,

    /// Show category groups instead of categories.
    #[arg(long)]
    groups: bool,

    /// Print the full report as JSON to stdout.
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    pub fn new(year: Option<i32>, budget: Option<String>, groups: bool, json: bool) -> Self {
        Self {
            year,
            budget,
            groups,
            json,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn budget(&self) -> Option<&str> {
        self.budget.as_deref()
    }

    pub fn groups(&self) -> bool {
        self.groups
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

/// (Not shown): Args for the `trends theme` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ThemeArgs {
    /// Switch between the dark and the light theme.
    #[arg(long)]
    toggle: bool,
}

impl ThemeArgs {
    pub fn new(toggle: bool) -> Self {
        Self { toggle }
    }

    pub fn toggle(&self) -> bool {
        self.toggle
    }
}

fn default_trends_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ynab-trends"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --trends-home or YNAB_TRENDS_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ynab-trends")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let args = Args::try_parse_from([
            "trends",
            "--trends-home",
            "/tmp/x",
            "analyze",
            "--year",
            "2023",
            "--groups",
        ])
        .unwrap();
        assert_eq!(args.common().trends_home().path(), Path::new("/tmp/x"));
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        let Command::Analyze(analyze) = args.command() else {
            panic!("expected analyze, got {:?}", args.command());
        };
        assert_eq!(analyze.year(), Some(2023));
        assert!(analyze.groups());
        assert!(!analyze.json());
        assert!(analyze.budget().is_none());
    }

    #[test]
    fn test_parse_init_default_url() {
        let args = Args::try_parse_from([
            "trends",
            "--log-level",
            "debug",
            "init",
            "--api-token-file",
            "token.txt",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        let Command::Init(init) = args.command() else {
            panic!("expected init, got {:?}", args.command());
        };
        assert_eq!(init.api_url(), DEFAULT_API_URL);
        assert_eq!(init.api_token_file(), Path::new("token.txt"));
    }

    #[test]
    fn test_select_requires_budget_id() {
        assert!(Args::try_parse_from(["trends", "select"]).is_err());
    }
}
