//! Implements the `BudgetApi` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using the real Budgeting API.

use crate::api::BudgetApi;
use crate::model::{
    Budget, Category, CategoryGroup, Subtransaction, Transaction, CREDIT_CARD_PAYMENTS,
    INTERNAL_MASTER_CATEGORY,
};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::{Datelike, Local, NaiveDate};
use std::collections::{HashMap, HashSet};

/// The id of the budget in the seed data.
pub const SEED_BUDGET_ID: &str = "seed-budget";

/// Identifies one of the Budgeting API calls so that a `TestApi` can be told to fail it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Endpoint {
    Budgets,
    Transactions,
    Categories,
}

/// An implementation of the `BudgetApi` trait that does not use the network. It can hold any data
/// in memory and, by default, is seeded with data for the current and the previous year.
#[derive(Debug, Clone, Default)]
pub struct TestApi {
    budgets: Vec<Budget>,
    transactions: HashMap<String, Vec<Transaction>>,
    category_groups: HashMap<String, Vec<CategoryGroup>>,
    failing: HashSet<Endpoint>,
}

impl TestApi {
    /// Creates an empty `TestApi`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `TestApi` holding the seed budget with transactions in `year` and `year - 1`.
    /// Fails when either year has no valid dates.
    pub fn seeded(year: i32) -> Result<Self> {
        Ok(Self::new()
            .with_budget(Budget::new(SEED_BUDGET_ID, "Seed Budget"))
            .with_category_groups(SEED_BUDGET_ID, seed_category_groups())
            .with_transactions(SEED_BUDGET_ID, seed_transactions(year)?))
    }

    /// The seeded `TestApi` for the current calendar year.
    pub fn for_current_year() -> Result<Self> {
        Self::seeded(Local::now().year())
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budgets.push(budget);
        self
    }

    /// Adds `transactions` to the budget identified by `budget_id`.
    pub fn with_transactions(
        mut self,
        budget_id: impl Into<String>,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> Self {
        self.transactions
            .entry(budget_id.into())
            .or_default()
            .extend(transactions);
        self
    }

    /// Replaces the category tree of the budget identified by `budget_id`.
    pub fn with_category_groups(
        mut self,
        budget_id: impl Into<String>,
        groups: Vec<CategoryGroup>,
    ) -> Self {
        self.category_groups.insert(budget_id.into(), groups);
        self
    }

    /// Makes every call to `endpoint` fail.
    pub fn fail_on(mut self, endpoint: Endpoint) -> Self {
        self.failing.insert(endpoint);
        self
    }

    fn check(&self, endpoint: Endpoint) -> Result<()> {
        if self.failing.contains(&endpoint) {
            return Err(anyhow!("Simulated failure of the {endpoint:?} endpoint"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BudgetApi for TestApi {
    async fn budgets(&self) -> Result<Vec<Budget>> {
        self.check(Endpoint::Budgets)?;
        Ok(self.budgets.clone())
    }

    async fn transactions(
        &self,
        budget_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        self.check(Endpoint::Transactions)?;
        let all = self
            .transactions
            .get(budget_id)
            .with_context(|| format!("Budget '{budget_id}' not found"))?;
        Ok(all
            .iter()
            .filter(|t| t.date.is_none_or(|d| since <= d && d <= until))
            .cloned()
            .collect())
    }

    async fn category_groups(&self, budget_id: &str) -> Result<Vec<CategoryGroup>> {
        self.check(Endpoint::Categories)?;
        self.category_groups
            .get(budget_id)
            .with_context(|| format!("Budget '{budget_id}' not found"))
            .cloned()
    }
}

/// Seed category tree.
fn seed_category_groups() -> Vec<CategoryGroup> {
    vec![
        CategoryGroup::new(
            "grp-internal",
            INTERNAL_MASTER_CATEGORY,
            vec![Category::new("cat-inflow", "Inflow: Ready to Assign")],
        ),
        CategoryGroup::new(
            "grp-cc",
            CREDIT_CARD_PAYMENTS,
            vec![Category::new("cat-visa", "Visa")],
        ),
        CategoryGroup::new(
            "grp-food",
            "Food",
            vec![
                Category::new("cat-groceries", "Groceries"),
                Category::new("cat-restaurants", "Restaurants"),
                Category::new("cat-coffee", "Coffee Shops").hidden(),
            ],
        ),
        CategoryGroup::new(
            "grp-home",
            "Home",
            vec![
                Category::new("cat-rent", "Rent"),
                Category::new("cat-utilities", "Utilities"),
                Category::new("cat-old-phone", "Landline").deleted(),
            ],
        ),
        CategoryGroup::new(
            "grp-fun",
            "Fun",
            vec![Category::new("cat-concerts", "Concerts")],
        ),
    ]
}

/// Seed transactions. Everything is dated in January so that the current-year entries are never in
/// the future.
fn seed_transactions(year: i32) -> Result<Vec<Transaction>> {
    let day = |y: i32, d: u32| {
        NaiveDate::from_ymd_opt(y, 1, d)
            .with_context(|| format!("The seed year {y} is out of range"))
    };
    let prev = year
        .checked_sub(1)
        .context("The seed year has no previous year")?;
    Ok(vec![
        // Current year
        Transaction::new(-87_430, "cat-groceries").on(day(year, 3)?),
        Transaction::new(-63_210, "cat-groceries").on(day(year, 10)?),
        Transaction::new(-42_300, "cat-restaurants").on(day(year, 12)?),
        Transaction::new(-6_750, "cat-coffee").on(day(year, 14)?),
        Transaction::new(-1_200_000, "cat-rent").on(day(year, 1)?),
        Transaction::split(
            -250_000,
            vec![
                Subtransaction::new(-150_000, "cat-utilities"),
                Subtransaction::new(-100_000, "cat-groceries"),
            ],
        )
        .on(day(year, 15)?),
        Transaction::new(-500_000, "cat-visa").on(day(year, 20)?),
        Transaction::new(3_000_000, "cat-inflow").on(day(year, 2)?),
        Transaction::new(25_000, "cat-groceries").on(day(year, 21)?),
        // Previous year
        Transaction::new(-120_000, "cat-groceries").on(day(prev, 4)?),
        Transaction::new(-80_000, "cat-restaurants").on(day(prev, 9)?),
        Transaction::new(-1_100_000, "cat-rent").on(day(prev, 1)?),
        Transaction::new(-95_000, "cat-utilities").on(day(prev, 16)?),
        Transaction::new(-75_000, "cat-concerts").on(day(prev, 22)?),
        Transaction::new(-20_000, "cat-old-phone").on(day(prev, 5)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(year: i32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_seeded_filters_by_date() {
        let api = TestApi::seeded(2024).unwrap();
        let current = api
            .transactions(SEED_BUDGET_ID, jan(2024, 1), jan(2024, 31))
            .await
            .unwrap();
        let previous = api
            .transactions(SEED_BUDGET_ID, jan(2023, 1), jan(2023, 31))
            .await
            .unwrap();
        assert_eq!(current.len(), 9);
        assert_eq!(previous.len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_budget() {
        let api = TestApi::seeded(2024).unwrap();
        assert!(api.category_groups("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_on() {
        let api = TestApi::seeded(2024).unwrap().fail_on(Endpoint::Categories);
        assert!(api.category_groups(SEED_BUDGET_ID).await.is_err());
        assert_eq!(api.budgets().await.unwrap().len(), 1);
    }

    #[test]
    fn test_seeded_rejects_year_out_of_range() {
        let err = TestApi::seeded(i32::MAX).unwrap_err();
        assert!(format!("{err:#}").contains("out of range"), "{err:#}");
        assert!(TestApi::seeded(i32::MIN).is_err());
    }
}
