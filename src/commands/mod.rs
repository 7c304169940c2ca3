//! Command handlers for the trends CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod analyze;
mod budgets;
mod init;
mod select;
mod theme;

use crate::prefs::JsonPreferences;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use analyze::{analyze, Grouping, Report, ReportRow};
pub use budgets::{budgets, BudgetListing};
pub use init::init;
pub use select::select;
pub use theme::theme;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data that can be printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }

    /// Print the structured data as pretty JSON to stdout. Prints `null` when there is none.
    pub fn print_json(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.structure)
            .context("Unable to serialize the command output")?;
        println!("{json}");
        Ok(())
    }
}

/// The preference store in the home directory.
fn preference_store(config: &Config) -> JsonPreferences {
    JsonPreferences::new(config.preferences_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_out_serializes_structure() {
        let out = Out::new("two", vec![1, 2]);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["message"], "two");
        assert_eq!(json["structure"], serde_json::json!([1, 2]));
    }
}
