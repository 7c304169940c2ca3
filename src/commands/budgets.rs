use crate::api::{self, Mode};
use crate::commands::{preference_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Budget;
use crate::{prefs, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Write;

/// The budgets of the account and which one is selected.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetListing {
    pub budgets: Vec<Budget>,
    pub selected: Option<String>,
}

/// Lists the budgets. If no budget is selected yet, the first one is selected.
pub async fn budgets(config: Config, mode: Mode) -> Result<Out<BudgetListing>> {
    let api = api::api(&config, mode).await.pub_result(ErrorType::Config)?;
    let budgets = api
        .budgets()
        .await
        .context("Unable to list the budgets")
        .pub_result(ErrorType::Fetch)?;
    let store = preference_store(&config);
    let selected = prefs::select_default_budget(&store, &budgets);

    let mut message = format!("Found {} budget(s)", budgets.len());
    for budget in &budgets {
        let marker = if selected.as_deref() == Some(budget.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = write!(message, "\n{marker} {} ({})", budget.name, budget.id);
    }
    Ok(Out::new(message, BudgetListing { budgets, selected }))
}
