use crate::model::Milliunits;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A transaction as returned by `GET /budgets/{budget_id}/transactions`.
///
/// When `subtransactions` is non-empty this is a split transaction: its own `amount` and
/// `category_id` describe the whole and the sub-transactions carry the categorized parts.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub amount: Milliunits,
    #[serde(default)]
    pub payee_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub subtransactions: Vec<Subtransaction>,
}

impl Transaction {
    pub fn new(amount: i64, category_id: impl Into<String>) -> Self {
        Self {
            amount: Milliunits::new(amount),
            category_id: Some(category_id.into()),
            ..Default::default()
        }
    }

    /// Creates a split transaction. The parent has no category of its own.
    pub fn split(amount: i64, subtransactions: Vec<Subtransaction>) -> Self {
        Self {
            amount: Milliunits::new(amount),
            subtransactions,
            ..Default::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_split(&self) -> bool {
        !self.subtransactions.is_empty()
    }
}

/// One categorized part of a split transaction.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Subtransaction {
    pub amount: Milliunits,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Subtransaction {
    pub fn new(amount: i64, category_id: impl Into<String>) -> Self {
        Self {
            amount: Milliunits::new(amount),
            category_id: Some(category_id.into()),
            deleted: false,
        }
    }
}
