//! ynab-trends: year-over-year spending analysis for YNAB budgets.
//!
//! The analysis engine lives in `analysis`. It reads budgets, category trees and transactions
//! through the `api::BudgetApi` seam and stores preferences through `prefs::PreferenceStore`.

pub mod analysis;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod prefs;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{error_type, Error, ErrorType, IntoResult, Result};
pub use model::Milliunits;
