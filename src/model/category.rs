use serde::{Deserialize, Serialize};

/// The name of the category group that holds the budget's internal bookkeeping categories.
pub const INTERNAL_MASTER_CATEGORY: &str = "Internal Master Category";

/// The name of the category group that holds credit card payment categories.
pub const CREDIT_CARD_PAYMENTS: &str = "Credit Card Payments";

/// A category group and the categories that belong to it, as returned by
/// `GET /budgets/{budget_id}/categories`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CategoryGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hidden: false,
            deleted: false,
            categories,
        }
    }

    /// Returns true if this group never counts towards spending regardless of its categories.
    pub fn is_excluded(&self) -> bool {
        self.name == INTERNAL_MASTER_CATEGORY || self.name == CREDIT_CARD_PAYMENTS
    }
}

/// A single budget category.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hidden: false,
            deleted: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}
