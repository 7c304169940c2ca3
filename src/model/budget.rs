use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A budget as returned by `GET /budgets`. Only the `id` matters to the analysis; the name is kept
/// so that budgets can be listed for selection.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Any other fields the API sends, preserved so that nothing is lost when echoing JSON.
    #[serde(flatten)]
    pub other_fields: BTreeMap<String, serde_json::Value>,
}

impl Budget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            other_fields: BTreeMap::new(),
        }
    }
}
