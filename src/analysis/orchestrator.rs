//! Coordinates fetching a year's and the previous year's data for a budget and derives the
//! year-over-year views from it.
//!
//! A fetch moves the analysis from `Idle`, `Ready` or `Errored` to `Loading`, and then to `Ready`
//! once all three API calls have succeeded or to `Errored` as soon as one of them fails. A failed
//! fetch never replaces previously fetched data.
//!
//! Fetching is split into `begin_fetch`, `FetchRequest::run` and `complete` so that requests may
//! overlap. Each request carries a generation number and `complete` ignores any outcome that is
//! not from the latest request, i.e. a newer request supersedes an older one.

use crate::analysis::{
    aggregate, category_names, compare, group_names, Aggregates, CategoryClassifier, Change,
    Normalizer, UNKNOWN_GROUP,
};
use crate::api::BudgetApi;
use crate::model::{CategoryGroup, Milliunits, Transaction};
use crate::Result;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where the analysis is in its fetch cycle.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The latest fetch failed with this message.
    Errored(String),
}

/// The raw data of one successful fetch.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub budget_id: String,
    pub year: i32,
    pub transactions: Vec<Transaction>,
    pub previous_year_transactions: Vec<Transaction>,
    pub category_groups: Vec<CategoryGroup>,
}

/// Totals and monthly averages of one year.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub months: u32,
    pub category_totals: BTreeMap<String, Milliunits>,
    pub group_totals: BTreeMap<String, Milliunits>,
    pub category_averages: BTreeMap<String, Decimal>,
    pub group_averages: BTreeMap<String, Decimal>,
}

impl YearSummary {
    fn new(aggregates: &Aggregates, normalizer: &Normalizer) -> Self {
        let averages = normalizer.normalize(aggregates);
        Self {
            year: aggregates.year,
            months: averages.months,
            category_totals: aggregates.category_totals(),
            group_totals: aggregates.group_totals(),
            category_averages: averages.categories,
            group_averages: averages.groups,
        }
    }
}

/// Everything derived from a `Snapshot`.
#[derive(Debug, Clone)]
pub struct Views {
    classifier: CategoryClassifier,
    current: YearSummary,
    previous: YearSummary,
    changes: BTreeMap<String, Change>,
    group_changes: BTreeMap<String, Change>,
    category_names: BTreeMap<String, String>,
    group_names: BTreeMap<String, String>,
}

impl Views {
    pub fn compute(snapshot: &Snapshot, normalizer: &Normalizer) -> Self {
        let classifier = CategoryClassifier::new(&snapshot.category_groups);
        let current = YearSummary::new(
            &aggregate(&classifier, &snapshot.transactions, snapshot.year),
            normalizer,
        );
        let previous = YearSummary::new(
            &aggregate(
                &classifier,
                &snapshot.previous_year_transactions,
                snapshot.year - 1,
            ),
            normalizer,
        );
        let changes = compare(
            &current.category_averages,
            &previous.category_averages,
            &current.category_totals,
            &previous.category_totals,
        );
        let group_changes = compare(
            &current.group_averages,
            &previous.group_averages,
            &current.group_totals,
            &previous.group_totals,
        );
        debug!(
            "Derived {} category and {} group changes for {}",
            changes.len(),
            group_changes.len(),
            snapshot.year
        );
        Self {
            classifier,
            current,
            previous,
            changes,
            group_changes,
            category_names: category_names(&snapshot.category_groups),
            group_names: group_names(&snapshot.category_groups),
        }
    }

    pub fn current_year(&self) -> &YearSummary {
        &self.current
    }

    pub fn previous_year(&self) -> &YearSummary {
        &self.previous
    }

    pub fn monthly_averages(&self) -> &BTreeMap<String, Decimal> {
        &self.current.category_averages
    }

    pub fn monthly_group_averages(&self) -> &BTreeMap<String, Decimal> {
        &self.current.group_averages
    }

    pub fn current_year_totals(&self) -> &BTreeMap<String, Milliunits> {
        &self.current.category_totals
    }

    pub fn current_year_group_totals(&self) -> &BTreeMap<String, Milliunits> {
        &self.current.group_totals
    }

    pub fn previous_year_averages(&self) -> &BTreeMap<String, Decimal> {
        &self.previous.category_averages
    }

    pub fn previous_year_group_averages(&self) -> &BTreeMap<String, Decimal> {
        &self.previous.group_averages
    }

    pub fn previous_year_totals(&self) -> &BTreeMap<String, Milliunits> {
        &self.previous.category_totals
    }

    pub fn previous_year_group_totals(&self) -> &BTreeMap<String, Milliunits> {
        &self.previous.group_totals
    }

    pub fn year_over_year_changes(&self) -> &BTreeMap<String, Change> {
        &self.changes
    }

    pub fn year_over_year_group_changes(&self) -> &BTreeMap<String, Change> {
        &self.group_changes
    }

    pub fn category_names(&self) -> &BTreeMap<String, String> {
        &self.category_names
    }

    pub fn group_names(&self) -> &BTreeMap<String, String> {
        &self.group_names
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn category_group_name(&self, group_id: &str) -> &str {
        self.classifier.category_group_name(group_id)
    }
}

/// A fetch that has been started with `SpendingAnalysis::begin_fetch`.
pub struct FetchRequest {
    generation: u64,
    budget_id: String,
    year: i32,
    api: Arc<dyn BudgetApi>,
}

impl FetchRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Issues the three API calls concurrently. The first failure fails the whole request.
    pub async fn run(self) -> FetchOutcome {
        let result = self.snapshot().await;
        FetchOutcome {
            generation: self.generation,
            result,
        }
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let (since, until) = year_range(self.year)?;
        let (previous_since, previous_until) = year_range(self.year - 1)?;
        let budget_id = self.budget_id.as_str();
        let (transactions, previous_year_transactions, category_groups) = tokio::try_join!(
            async {
                self.api
                    .transactions(budget_id, since, until)
                    .await
                    .with_context(|| format!("Unable to fetch the transactions of {}", self.year))
            },
            async {
                self.api
                    .transactions(budget_id, previous_since, previous_until)
                    .await
                    .with_context(|| {
                        format!("Unable to fetch the transactions of {}", self.year - 1)
                    })
            },
            async {
                self.api
                    .category_groups(budget_id)
                    .await
                    .context("Unable to fetch the categories")
            },
        )?;
        Ok(Snapshot {
            budget_id: self.budget_id.clone(),
            year: self.year,
            transactions,
            previous_year_transactions,
            category_groups,
        })
    }
}

/// The result of running a `FetchRequest`, to be handed to `SpendingAnalysis::complete`.
#[derive(Debug)]
pub struct FetchOutcome {
    generation: u64,
    result: Result<Snapshot>,
}

/// The spending analysis of one budget for a selected year against the year before it.
pub struct SpendingAnalysis {
    api: Arc<dyn BudgetApi>,
    normalizer: Normalizer,
    budget_id: String,
    year: i32,
    state: AnalysisState,
    generation: u64,
    snapshot: Option<Snapshot>,
    views: OnceCell<Views>,
}

impl SpendingAnalysis {
    /// Creates an idle analysis with no budget selected. The selected year is the current year.
    pub fn new(api: Arc<dyn BudgetApi>, normalizer: Normalizer) -> Self {
        let year = normalizer.today().year();
        Self {
            api,
            normalizer,
            budget_id: String::new(),
            year,
            state: AnalysisState::Idle,
            generation: 0,
            snapshot: None,
            views: OnceCell::new(),
        }
    }

    pub fn with_budget(mut self, budget_id: impl Into<String>) -> Self {
        self.select_budget(budget_id);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.set_year(year);
        self
    }

    pub fn budget_id(&self) -> &str {
        &self.budget_id
    }

    pub fn select_budget(&mut self, budget_id: impl Into<String>) {
        self.budget_id = budget_id.into();
    }

    pub fn selected_year(&self) -> i32 {
        self.year
    }

    /// Changes the selected year. Views stay available only while the fetched data is for the
    /// selected year; otherwise call `fetch` again.
    pub fn set_year(&mut self, year: i32) {
        if self.year != year {
            self.year = year;
            self.views = OnceCell::new();
        }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == AnalysisState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Errored(message) => Some(message),
            _ => None,
        }
    }

    /// The data of the last successful fetch, if any.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Starts a fetch and moves to `Loading`. Returns `None`, leaving the state as it was, when no
    /// budget is selected.
    pub fn begin_fetch(&mut self) -> Option<FetchRequest> {
        if self.budget_id.is_empty() {
            debug!("No budget selected, not fetching");
            return None;
        }
        self.generation += 1;
        self.state = AnalysisState::Loading;
        debug!(
            "Fetching {} and {} for budget '{}' (request {})",
            self.year,
            self.year - 1,
            self.budget_id,
            self.generation
        );
        Some(FetchRequest {
            generation: self.generation,
            budget_id: self.budget_id.clone(),
            year: self.year,
            api: self.api.clone(),
        })
    }

    /// Applies the outcome of a fetch. Returns false, changing nothing, if a newer fetch has been
    /// started since the one that produced `outcome`.
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                "Ignoring the outcome of request {}, request {} is newer",
                outcome.generation, self.generation
            );
            return false;
        }
        match outcome.result {
            Ok(snapshot) => {
                debug!(
                    "Fetched {} + {} transactions and {} category groups",
                    snapshot.transactions.len(),
                    snapshot.previous_year_transactions.len(),
                    snapshot.category_groups.len()
                );
                self.snapshot = Some(snapshot);
                self.views = OnceCell::new();
                self.state = AnalysisState::Ready;
            }
            Err(e) => {
                let message = format!("{e:#}");
                warn!("Fetch failed: {message}");
                self.state = AnalysisState::Errored(message);
            }
        }
        true
    }

    /// Fetches the data for the selected budget and year. Does nothing when no budget is selected.
    pub async fn fetch(&mut self) -> &AnalysisState {
        if let Some(request) = self.begin_fetch() {
            let outcome = request.run().await;
            self.complete(outcome);
        }
        &self.state
    }

    /// The derived views, computed on first access after the data or the selected year changed.
    /// `None` when nothing has been fetched for the selected budget and year.
    pub fn views(&self) -> Option<&Views> {
        let snapshot = self
            .snapshot
            .as_ref()
            .filter(|s| s.year == self.year && s.budget_id == self.budget_id)?;
        Some(
            self.views
                .get_or_init(|| Views::compute(snapshot, &self.normalizer)),
        )
    }

    /// The name of the group, or `"Unknown Group"`.
    pub fn category_group_name(&self, group_id: &str) -> &str {
        self.views()
            .map(|v| v.category_group_name(group_id))
            .unwrap_or(UNKNOWN_GROUP)
    }
}

/// The first and last day of `year`.
fn year_range(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    first
        .zip(last)
        .with_context(|| format!("The year {year} is out of range"))
}
