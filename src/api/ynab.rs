//! Implements the `BudgetApi` trait over HTTP using `reqwest`.

use crate::api::BudgetApi;
use crate::model::{Budget, CategoryGroup, Transaction};
use crate::Result;
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Every response body is wrapped as `{ "data": { ... } }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct BudgetsData {
    budgets: Vec<Budget>,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct CategoriesData {
    category_groups: Vec<CategoryGroup>,
}

/// A bearer-token authenticated client for the Budgeting API. No request is retried.
#[derive(Debug, Clone)]
pub struct YnabClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl YnabClient {
    /// Creates a client with a default `reqwest::Client`.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    /// Creates a client that uses the given `reqwest::Client`.
    pub fn with_client(client: Client, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded, so an id containing
    /// `/` or `?` stays a single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("The API URL '{}' cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a GET request and decodes the `data` member of the response envelope.
    async fn get<T>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        let path = url.path().to_string();
        trace!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {path} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Request to {path} failed with status {status}: {body}");
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse the response from {path}"))?;
        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl BudgetApi for YnabClient {
    async fn budgets(&self) -> Result<Vec<Budget>> {
        let data: BudgetsData = self.get(&["budgets"], &[]).await?;
        debug!("Received {} budgets", data.budgets.len());
        Ok(data.budgets)
    }

    async fn transactions(
        &self,
        budget_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let query = [
            ("since_date", since.format(DATE_FORMAT).to_string()),
            ("until_date", until.format(DATE_FORMAT).to_string()),
        ];
        let data: TransactionsData = self
            .get(&["budgets", budget_id, "transactions"], &query)
            .await?;
        debug!(
            "Received {} transactions between {since} and {until}",
            data.transactions.len()
        );
        Ok(data.transactions)
    }

    async fn category_groups(&self, budget_id: &str) -> Result<Vec<CategoryGroup>> {
        let data: CategoriesData = self.get(&["budgets", budget_id, "categories"], &[]).await?;
        debug!("Received {} category groups", data.category_groups.len());
        Ok(data.category_groups)
    }
}
