//! Error types shared across the crate.
//!
//! Internally everything is an `anyhow::Error`. Command handlers classify the failures they return
//! with an `ErrorType` so that callers can tell a configuration problem apart from a failed fetch.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an error that is returned from a public command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// One of the required Budgeting API calls failed.
    Fetch,
    /// The preference store could not be read or written.
    Preferences,
    /// The request itself was unusable, e.g. no budget is selected.
    Request,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// Attaches an `ErrorType` to the error of a `Result`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(Classified(error_type)))
    }
}

/// Returns the `ErrorType` that was attached with `pub_result`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<Classified>().map(|c| c.0)
}

#[derive(Debug, Clone, Copy)]
struct Classified(ErrorType);

impl Display for Classified {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.0 {
            ErrorType::Config => "Configuration error",
            ErrorType::Fetch => "Unable to fetch budget data",
            ErrorType::Preferences => "Preference store error",
            ErrorType::Request => "Invalid request",
        };
        f.write_str(label)
    }
}
