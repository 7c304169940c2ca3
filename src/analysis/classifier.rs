//! Decides which categories count as spending and resolves their groups.

use crate::model::CategoryGroup;
use std::collections::{BTreeMap, HashMap};

/// Returned by `category_group_name` when the group id is not in the category tree.
pub const UNKNOWN_GROUP: &str = "Unknown Group";

#[derive(Debug, Clone)]
struct Placement {
    group_id: String,
    spending: bool,
}

/// An id-indexed view of one category tree.
///
/// Lookups behave like a first-match scan of the groups in order: if a category id appears in more
/// than one group, the first group wins. A category that is not in the tree is never spending.
#[derive(Debug, Clone, Default)]
pub struct CategoryClassifier {
    placements: HashMap<String, Placement>,
    group_names: HashMap<String, String>,
}

impl CategoryClassifier {
    pub fn new(groups: &[CategoryGroup]) -> Self {
        let mut placements = HashMap::new();
        let mut group_names = HashMap::new();
        for group in groups {
            group_names
                .entry(group.id.clone())
                .or_insert_with(|| group.name.clone());
            let excluded = group.is_excluded();
            for category in &group.categories {
                placements
                    .entry(category.id.clone())
                    .or_insert_with(|| Placement {
                        group_id: group.id.clone(),
                        spending: !category.hidden && !category.deleted && !excluded,
                    });
            }
        }
        Self {
            placements,
            group_names,
        }
    }

    /// True if the category is in the tree, is neither hidden nor deleted, and its group is not
    /// one of the reserved non-spending groups.
    pub fn is_spending_category(&self, category_id: &str) -> bool {
        self.placements
            .get(category_id)
            .is_some_and(|p| p.spending)
    }

    /// The id of the group that owns the category, if the category is in the tree.
    pub fn category_group_id(&self, category_id: &str) -> Option<&str> {
        self.placements
            .get(category_id)
            .map(|p| p.group_id.as_str())
    }

    /// The name of the group, or `"Unknown Group"`.
    pub fn category_group_name(&self, group_id: &str) -> &str {
        self.group_names
            .get(group_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_GROUP)
    }
}

/// Maps every category id in the tree to its name.
pub fn category_names(groups: &[CategoryGroup]) -> BTreeMap<String, String> {
    groups
        .iter()
        .flat_map(|g| g.categories.iter())
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect()
}

/// Maps every group id in the tree to its name.
pub fn group_names(groups: &[CategoryGroup]) -> BTreeMap<String, String> {
    groups
        .iter()
        .map(|g| (g.id.clone(), g.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CREDIT_CARD_PAYMENTS, INTERNAL_MASTER_CATEGORY};

    fn tree() -> Vec<CategoryGroup> {
        vec![
            CategoryGroup::new(
                "g-internal",
                INTERNAL_MASTER_CATEGORY,
                vec![Category::new("x", "Inflow")],
            ),
            CategoryGroup::new(
                "g-cc",
                CREDIT_CARD_PAYMENTS,
                vec![Category::new("visa", "Visa")],
            ),
            CategoryGroup::new(
                "g-food",
                "Food",
                vec![
                    Category::new("groceries", "Groceries"),
                    Category::new("hidden", "Hidden").hidden(),
                    Category::new("deleted", "Deleted").deleted(),
                ],
            ),
            CategoryGroup::new(
                "g-dupe",
                "Duplicate",
                vec![Category::new("groceries", "Groceries Again").hidden()],
            ),
        ]
    }

    #[test]
    fn test_is_spending_category() {
        let c = CategoryClassifier::new(&tree());
        assert!(c.is_spending_category("groceries"));
        assert!(!c.is_spending_category("x"));
        assert!(!c.is_spending_category("visa"));
        assert!(!c.is_spending_category("hidden"));
        assert!(!c.is_spending_category("deleted"));
        assert!(!c.is_spending_category("missing"));
    }

    #[test]
    fn test_first_group_wins() {
        let c = CategoryClassifier::new(&tree());
        assert_eq!(c.category_group_id("groceries"), Some("g-food"));
        assert!(c.is_spending_category("groceries"));
    }

    #[test]
    fn test_category_group_id() {
        let c = CategoryClassifier::new(&tree());
        assert_eq!(c.category_group_id("hidden"), Some("g-food"));
        assert_eq!(c.category_group_id("x"), Some("g-internal"));
        assert_eq!(c.category_group_id("missing"), None);
    }

    #[test]
    fn test_unknown_group_name() {
        let c = CategoryClassifier::new(&tree());
        assert_eq!(c.category_group_name("g-food"), "Food");
        assert_eq!(c.category_group_name("nonexistent"), "Unknown Group");
    }

    #[test]
    fn test_empty_tree() {
        let c = CategoryClassifier::default();
        assert!(!c.is_spending_category("groceries"));
        assert_eq!(c.category_group_id("groceries"), None);
        assert_eq!(c.category_group_name("g-food"), UNKNOWN_GROUP);
    }

    #[test]
    fn test_names() {
        let groups = tree();
        let categories = category_names(&groups);
        assert_eq!(categories.get("visa").map(String::as_str), Some("Visa"));
        let groups = group_names(&groups);
        assert_eq!(groups.len(), 4);
        assert_eq!(groups.get("g-cc").map(String::as_str), Some(CREDIT_CARD_PAYMENTS));
    }
}
