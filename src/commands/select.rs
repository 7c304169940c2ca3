use crate::api::{self, Mode};
use crate::commands::{preference_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::prefs::{PreferenceStore, SELECTED_BUDGET_ID};
use crate::{Config, Result};
use anyhow::{anyhow, Context};

/// Persists `budget_id` as the selected budget after checking that the account has it.
pub async fn select(config: Config, mode: Mode, budget_id: &str) -> Result<Out<()>> {
    let api = api::api(&config, mode).await.pub_result(ErrorType::Config)?;
    let budgets = api
        .budgets()
        .await
        .context("Unable to list the budgets")
        .pub_result(ErrorType::Fetch)?;
    let budget = budgets
        .iter()
        .find(|b| b.id == budget_id)
        .ok_or_else(|| anyhow!("There is no budget with the id '{budget_id}'"))
        .pub_result(ErrorType::Request)?;
    preference_store(&config)
        .set(SELECTED_BUDGET_ID, &budget.id)
        .pub_result(ErrorType::Preferences)?;
    Ok(format!("Selected budget '{}' ({})", budget.name, budget.id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SEED_BUDGET_ID;
    use crate::error_type;
    use crate::prefs;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_select() {
        let env = TestEnv::new().await;
        let out = select(env.config(), Mode::Test, SEED_BUDGET_ID)
            .await
            .unwrap();
        assert!(out.message().contains("Seed Budget"));
        assert_eq!(
            prefs::selected_budget_id(&env.preferences()).as_deref(),
            Some(SEED_BUDGET_ID)
        );
    }

    #[tokio::test]
    async fn test_select_unknown_budget() {
        let env = TestEnv::new().await;
        let err = select(env.config(), Mode::Test, "nope").await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Request));
        assert!(prefs::selected_budget_id(&env.preferences()).is_none());
    }
}
