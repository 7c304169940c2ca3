use crate::analysis::{
    AnalysisState, Change, Normalizer, SpendingAnalysis, SystemClock, Views, YearSummary,
};
use crate::api::{self, BudgetApi, Mode};
use crate::args::AnalyzeArgs;
use crate::commands::{preference_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::format_milliunits;
use crate::prefs::{self, PreferenceStore};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

/// Whether a report has one row per category or one row per category group.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    #[default]
    Categories,
    Groups,
}

serde_plain::derive_display_from_serialize!(Grouping);
serde_plain::derive_fromstr_from_deserialize!(Grouping);

/// One category or group of a `Report`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    /// The name of the category's group. `None` for group rows.
    pub group: Option<String>,
    pub current_average: Decimal,
    pub previous_average: Decimal,
    pub change: Change,
}

/// The outcome of `trends analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub budget_id: String,
    pub grouping: Grouping,
    pub current: YearSummary,
    pub previous: YearSummary,
    /// Sorted by name.
    pub rows: Vec<ReportRow>,
}

impl Report {
    fn new(budget_id: &str, views: &Views, grouping: Grouping) -> Self {
        let (changes, current_averages, previous_averages) = match grouping {
            Grouping::Categories => (
                views.year_over_year_changes(),
                views.monthly_averages(),
                views.previous_year_averages(),
            ),
            Grouping::Groups => (
                views.year_over_year_group_changes(),
                views.monthly_group_averages(),
                views.previous_year_group_averages(),
            ),
        };
        let average = |averages: &BTreeMap<String, Decimal>, id: &str| {
            averages.get(id).copied().unwrap_or_default()
        };
        let mut rows: Vec<ReportRow> = changes
            .iter()
            .map(|(id, change)| {
                let (name, group) = match grouping {
                    Grouping::Categories => (
                        views
                            .category_names()
                            .get(id)
                            .cloned()
                            .unwrap_or_else(|| id.clone()),
                        views
                            .classifier()
                            .category_group_id(id)
                            .map(|g| views.category_group_name(g).to_string()),
                    ),
                    Grouping::Groups => (views.category_group_name(id).to_string(), None),
                };
                ReportRow {
                    id: id.clone(),
                    name,
                    group,
                    current_average: average(current_averages, id),
                    previous_average: average(previous_averages, id),
                    change: *change,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Self {
            budget_id: budget_id.to_string(),
            grouping,
            current: views.current_year().clone(),
            previous: views.previous_year().clone(),
            rows,
        }
    }

    /// Renders the rows as a plain text table.
    fn table(&self) -> String {
        let mut s = format!(
            "Monthly spending of budget '{}' in {} ({} months) compared to {}",
            self.budget_id, self.current.year, self.current.months, self.previous.year
        );
        if self.rows.is_empty() {
            s.push_str("\nNo spending found");
            return s;
        }
        let current = format!("{}/mo", self.current.year);
        let previous = format!("{}/mo", self.previous.year);
        let _ = write!(
            s,
            "\n{:<32} {:>14} {:>14} {:>14} {:>9}",
            "Name", current, previous, "Change", "%"
        );
        for row in &self.rows {
            let _ = write!(
                s,
                "\n{:<32} {:>14} {:>14} {:>14} {:>8}%",
                row.name,
                format_milliunits(row.current_average),
                format_milliunits(row.previous_average),
                format_milliunits(row.change.amount),
                row.change.percentage.round_dp(1)
            );
        }
        s
    }
}

/// Fetches the selected year and the year before it and compares the monthly spending averages.
///
/// The budget is `--budget` if given, otherwise the selected budget. When no budget has been
/// selected yet, the first budget of the account is selected.
pub async fn analyze(config: Config, mode: Mode, args: &AnalyzeArgs) -> Result<Out<Report>> {
    let api = api::api(&config, mode).await.pub_result(ErrorType::Config)?;
    let store: Arc<dyn PreferenceStore> = Arc::new(preference_store(&config));
    let budget_id = match args.budget() {
        Some(id) => id.to_string(),
        None => default_budget(api.as_ref(), store.as_ref()).await?,
    };
    let normalizer = Normalizer::new(Arc::new(SystemClock), Some(store));
    let mut analysis = SpendingAnalysis::new(api, normalizer).with_budget(budget_id);
    if let Some(year) = args.year() {
        analysis.set_year(year);
    }
    let grouping = if args.groups() {
        Grouping::Groups
    } else {
        Grouping::Categories
    };
    run(analysis, grouping).await
}

async fn default_budget(api: &dyn BudgetApi, store: &dyn PreferenceStore) -> Result<String> {
    if let Some(id) = prefs::selected_budget_id(store) {
        return Ok(id);
    }
    let budgets = api
        .budgets()
        .await
        .context("Unable to list the budgets")
        .pub_result(ErrorType::Fetch)?;
    prefs::select_default_budget(store, &budgets)
        .context("There are no budgets in this account")
        .pub_result(ErrorType::Request)
}

async fn run(mut analysis: SpendingAnalysis, grouping: Grouping) -> Result<Out<Report>> {
    match analysis.fetch().await {
        AnalysisState::Ready => {}
        AnalysisState::Errored(message) => {
            return Err(anyhow!("{message}")).pub_result(ErrorType::Fetch);
        }
        AnalysisState::Idle | AnalysisState::Loading => {
            return Err(anyhow!(
                "No budget is selected, run 'trends budgets' or pass --budget"
            ))
            .pub_result(ErrorType::Request);
        }
    }
    let views = analysis
        .views()
        .context("The fetched data does not match the selected year")
        .pub_result(ErrorType::Fetch)?;
    let report = Report::new(analysis.budget_id(), views, grouping);
    debug!("Report has {} {} rows", report.rows.len(), grouping);
    // The report is complete; let the mirrored averages land before the process exits.
    analysis.normalizer().flush().await;
    Ok(Out::new(report.table(), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FixedClock;
    use crate::api::{Endpoint, TestApi, SEED_BUDGET_ID};
    use crate::error_type;
    use crate::model::Milliunits;
    use crate::test::TestEnv;
    use chrono::{Datelike, Local, NaiveDate};

    fn this_year() -> i32 {
        Local::now().year()
    }

    fn names(report: &Report) -> Vec<&str> {
        report.rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_analyze_categories() {
        let env = TestEnv::new().await;
        let out = analyze(env.config(), Mode::Test, &AnalyzeArgs::default())
            .await
            .unwrap();
        let report = out.structure().unwrap();
        let year = this_year();

        assert_eq!(report.budget_id, SEED_BUDGET_ID);
        assert_eq!(report.current.year, year);
        assert_eq!(report.previous.year, year - 1);
        assert_eq!(names(report), ["Groceries", "Rent", "Restaurants", "Utilities"]);

        let groceries = &report.rows[0];
        assert_eq!(groceries.group.as_deref(), Some("Food"));
        assert_eq!(groceries.change.current_total, Milliunits::new(250_640));
        assert_eq!(groceries.change.previous_total, Milliunits::new(120_000));
        assert_eq!(groceries.previous_average, Decimal::from(10_000));

        assert!(out.message().contains("Groceries"));
        assert!(out.message().contains(&format!("{year}/mo")));

        // The averages are mirrored into the preference store and the budget is now selected.
        let store = env.preferences();
        assert_eq!(
            prefs::recall(&store, &prefs::average_key("cat-groceries", year - 1)).as_deref(),
            Some("10000")
        );
        assert_eq!(
            prefs::selected_budget_id(&store).as_deref(),
            Some(SEED_BUDGET_ID)
        );
    }

    #[tokio::test]
    async fn test_analyze_groups() {
        let env = TestEnv::new().await;
        let args = AnalyzeArgs::new(None, None, true, false);
        let out = analyze(env.config(), Mode::Test, &args).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.grouping, Grouping::Groups);
        assert_eq!(names(report), ["Food", "Home"]);
        assert!(report.rows.iter().all(|r| r.group.is_none()));
        assert_eq!(report.rows[0].change.current_total, Milliunits::new(292_940));
        assert_eq!(report.rows[1].change.previous_total, Milliunits::new(1_195_000));
    }

    #[tokio::test]
    async fn test_analyze_previous_year() {
        let env = TestEnv::new().await;
        let year = this_year() - 1;
        let args = AnalyzeArgs::new(Some(year), Some(SEED_BUDGET_ID.to_string()), false, false);
        let report = analyze(env.config(), Mode::Test, &args)
            .await
            .unwrap()
            .structure()
            .cloned()
            .unwrap();
        assert_eq!(report.current.year, year);
        assert_eq!(report.current.months, 12);
        assert!(report.previous.category_totals.is_empty());
        assert_eq!(
            names(&report),
            ["Concerts", "Groceries", "Rent", "Restaurants", "Utilities"]
        );
        assert!(report.rows.iter().all(|r| r.change.percentage.is_zero()));
    }

    #[tokio::test]
    async fn test_analyze_unknown_budget() {
        let env = TestEnv::new().await;
        let args = AnalyzeArgs::new(None, Some("nope".to_string()), false, false);
        let err = analyze(env.config(), Mode::Test, &args).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Fetch));
        assert!(format!("{err:#}").contains("nope"));
    }

    #[tokio::test]
    async fn test_analyze_without_budget() {
        let env = TestEnv::new().await;
        let args = AnalyzeArgs::new(None, Some(String::new()), false, false);
        let err = analyze(env.config(), Mode::Test, &args).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Request));
    }

    #[tokio::test]
    async fn test_run_fetch_failure() {
        let api = Arc::new(TestApi::seeded(2024).unwrap().fail_on(Endpoint::Transactions));
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let analysis = SpendingAnalysis::new(api, Normalizer::new(Arc::new(clock), None))
            .with_budget(SEED_BUDGET_ID);
        let err = run(analysis, Grouping::Categories).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Fetch));
        assert!(format!("{err:#}").contains("Simulated failure"));
    }

    #[tokio::test]
    async fn test_table_formatting() {
        let api = Arc::new(TestApi::seeded(2024).unwrap());
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        let analysis = SpendingAnalysis::new(api, Normalizer::new(Arc::new(clock), None))
            .with_budget(SEED_BUDGET_ID);
        let out = run(analysis, Grouping::Categories).await.unwrap();
        let rent = out
            .message()
            .lines()
            .find(|l| l.starts_with("Rent"))
            .unwrap();
        // 1,200.00 over 2 months against 1,100.00 over 12 months.
        assert!(rent.contains("600.00"), "{rent}");
        assert!(rent.contains("91.67"), "{rent}");
        assert!(rent.contains("508.33"), "{rent}");
        assert!(rent.ends_with("554.5%"), "{rent}");
    }
}
