//! The Budgeting API seam.
//!
//! `BudgetApi` is implemented by `YnabClient`, which talks to the remote API over HTTP, and by
//! `TestApi`, which serves in-memory data. `Mode` decides which one the program uses.

mod test_client;
mod ynab;

use crate::model::{Budget, CategoryGroup, Transaction};
use crate::{Config, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

pub use test_client::{Endpoint, TestApi, SEED_BUDGET_ID};
pub use ynab::YnabClient;

/// When this environment variable is set and non-empty, `Mode::Test` is used.
pub const TEST_MODE_ENV: &str = "YNAB_TRENDS_IN_TEST_MODE";

/// Read access to the remote budgeting service.
#[async_trait::async_trait]
pub trait BudgetApi: Send + Sync {
    /// `GET /budgets`
    async fn budgets(&self) -> Result<Vec<Budget>>;

    /// `GET /budgets/{budget_id}/transactions?since_date=..&until_date=..`
    async fn transactions(
        &self,
        budget_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Transaction>>;

    /// `GET /budgets/{budget_id}/categories`
    async fn category_groups(&self, budget_id: &str) -> Result<Vec<CategoryGroup>>;
}

/// Whether the program talks to the real Budgeting API or to seeded in-memory data.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Ynab,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Test,
            _ => Mode::Ynab,
        }
    }
}

/// Creates the `BudgetApi` implementation for `mode`.
pub async fn api(config: &Config, mode: Mode) -> Result<Arc<dyn BudgetApi>> {
    debug!("Using {mode:?} mode for the budgeting API");
    match mode {
        Mode::Ynab => {
            let token = config.access_token().await?;
            Ok(Arc::new(YnabClient::new(config.api_url().clone(), token)))
        }
        Mode::Test => Ok(Arc::new(TestApi::for_current_year()?)),
    }
}
