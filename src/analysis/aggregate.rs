//! Accumulates expense totals and counts per category and per category group.

use crate::analysis::CategoryClassifier;
use crate::model::{Milliunits, Transaction};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

/// The running total and count of expenses for one category or group.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Bucket {
    /// Sum of the absolute values of the contributing expenses.
    pub total: Milliunits,
    /// Number of contributing transactions or sub-transactions.
    pub count: u32,
}

impl Bucket {
    fn add(&mut self, amount: Milliunits) {
        self.total += amount.abs();
        self.count += 1;
    }
}

/// Expense buckets for one year. Ids without any contribution have no entry.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Aggregates {
    pub year: i32,
    pub categories: BTreeMap<String, Bucket>,
    pub groups: BTreeMap<String, Bucket>,
}

impl Aggregates {
    pub fn category_totals(&self) -> BTreeMap<String, Milliunits> {
        totals(&self.categories)
    }

    pub fn group_totals(&self) -> BTreeMap<String, Milliunits> {
        totals(&self.groups)
    }

    pub fn category_counts(&self) -> BTreeMap<String, u32> {
        counts(&self.categories)
    }

    pub fn group_counts(&self) -> BTreeMap<String, u32> {
        counts(&self.groups)
    }

    fn add(
        &mut self,
        classifier: &CategoryClassifier,
        category_id: Option<&str>,
        amount: Milliunits,
    ) {
        if !amount.is_expense() {
            return;
        }
        let Some(category_id) = category_id else {
            return;
        };
        if !classifier.is_spending_category(category_id) {
            return;
        }
        self.categories
            .entry(category_id.to_string())
            .or_default()
            .add(amount);
        if let Some(group_id) = classifier.category_group_id(category_id) {
            self.groups
                .entry(group_id.to_string())
                .or_default()
                .add(amount);
        }
    }
}

/// Accumulates the expenses of `transactions` that belong to `year`.
///
/// - Only strictly negative amounts are counted, as their absolute value.
/// - A split transaction contributes its qualifying sub-transactions and never its own amount.
/// - Deleted transactions and sub-transactions are skipped.
/// - A transaction dated outside `year` is skipped; an undated one is counted.
pub fn aggregate(
    classifier: &CategoryClassifier,
    transactions: &[Transaction],
    year: i32,
) -> Aggregates {
    let mut aggregates = Aggregates {
        year,
        ..Default::default()
    };
    for transaction in transactions {
        if !transaction.amount.is_expense() || transaction.deleted {
            continue;
        }
        if transaction.date.is_some_and(|d| d.year() != year) {
            trace!("Skipping transaction '{}' outside of {year}", transaction.id);
            continue;
        }
        if transaction.is_split() {
            for sub in transaction.subtransactions.iter().filter(|s| !s.deleted) {
                aggregates.add(classifier, sub.category_id.as_deref(), sub.amount);
            }
        } else {
            aggregates.add(
                classifier,
                transaction.category_id.as_deref(),
                transaction.amount,
            );
        }
    }
    aggregates
}

fn totals(buckets: &BTreeMap<String, Bucket>) -> BTreeMap<String, Milliunits> {
    buckets.iter().map(|(id, b)| (id.clone(), b.total)).collect()
}

fn counts(buckets: &BTreeMap<String, Bucket>) -> BTreeMap<String, u32> {
    buckets.iter().map(|(id, b)| (id.clone(), b.count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CategoryGroup, Subtransaction, INTERNAL_MASTER_CATEGORY};
    use chrono::NaiveDate;

    fn classifier() -> CategoryClassifier {
        CategoryClassifier::new(&[
            CategoryGroup::new(
                "g-internal",
                INTERNAL_MASTER_CATEGORY,
                vec![Category::new("X", "Inflow")],
            ),
            CategoryGroup::new(
                "g-food",
                "Food",
                vec![
                    Category::new("groceries", "Groceries"),
                    Category::new("coffee", "Coffee").hidden(),
                ],
            ),
            CategoryGroup::new("g-home", "Home", vec![Category::new("rent", "Rent")]),
        ])
    }

    fn total(a: &BTreeMap<String, Bucket>, id: &str) -> Option<i64> {
        a.get(id).map(|b| b.total.value())
    }

    #[test]
    fn test_internal_master_category_is_excluded() {
        let a = aggregate(&classifier(), &[Transaction::new(-500, "X")], 2024);
        assert!(a.categories.is_empty());
        assert!(a.groups.is_empty());
    }

    #[test]
    fn test_split_transaction_counts_only_subtransactions() {
        let t = Transaction::split(
            -1000,
            vec![
                Subtransaction::new(-600, "groceries"),
                Subtransaction::new(-400, "rent"),
            ],
        );
        let a = aggregate(&classifier(), &[t], 2024);
        assert_eq!(total(&a.categories, "groceries"), Some(600));
        assert_eq!(total(&a.categories, "rent"), Some(400));
        assert_eq!(a.categories.len(), 2);
        assert_eq!(total(&a.groups, "g-food"), Some(600));
        assert_eq!(total(&a.groups, "g-home"), Some(400));
    }

    #[test]
    fn test_split_with_categorized_parent_ignores_parent() {
        let mut t = Transaction::split(-1000, vec![Subtransaction::new(-600, "groceries")]);
        t.category_id = Some("rent".to_string());
        let a = aggregate(&classifier(), &[t], 2024);
        assert_eq!(total(&a.categories, "groceries"), Some(600));
        assert_eq!(total(&a.categories, "rent"), None);
    }

    #[test]
    fn test_split_skips_positive_and_non_spending_parts() {
        let t = Transaction::split(
            -900,
            vec![
                Subtransaction::new(-1000, "groceries"),
                Subtransaction::new(200, "rent"),
                Subtransaction::new(-100, "coffee"),
            ],
        );
        let a = aggregate(&classifier(), &[t], 2024);
        assert_eq!(total(&a.categories, "groceries"), Some(1000));
        assert_eq!(a.categories.len(), 1);
        assert_eq!(a.categories["groceries"].count, 1);
    }

    #[test]
    fn test_non_expenses_are_ignored() {
        let transactions = vec![
            Transaction::new(0, "groceries"),
            Transaction::new(2500, "groceries"),
            // A positive split parent is ignored even if a part is negative.
            Transaction::split(100, vec![Subtransaction::new(-50, "rent")]),
        ];
        let a = aggregate(&classifier(), &transactions, 2024);
        assert!(a.categories.is_empty());
        assert!(a.groups.is_empty());
    }

    #[test]
    fn test_totals_and_counts() {
        let transactions = vec![
            Transaction::new(-100, "groceries"),
            Transaction::new(-250, "groceries"),
            Transaction::new(-1000, "rent"),
            Transaction::new(-75, "missing"),
        ];
        let a = aggregate(&classifier(), &transactions, 2024);
        assert_eq!(a.category_totals()["groceries"], Milliunits::new(350));
        assert_eq!(a.category_counts()["groceries"], 2);
        assert_eq!(a.group_totals()["g-home"], Milliunits::new(1000));
        assert_eq!(a.group_counts()["g-food"], 2);
        assert!(!a.categories.contains_key("missing"));
    }

    #[test]
    fn test_uncategorized_and_deleted_are_skipped() {
        let mut uncategorized = Transaction::new(-100, "groceries");
        uncategorized.category_id = None;
        let mut deleted = Transaction::new(-100, "groceries");
        deleted.deleted = true;
        let a = aggregate(&classifier(), &[uncategorized, deleted], 2024);
        assert!(a.categories.is_empty());
    }

    #[test]
    fn test_transactions_outside_year_are_skipped() {
        let jan = |y| NaiveDate::from_ymd_opt(y, 1, 15).unwrap();
        let transactions = vec![
            Transaction::new(-100, "groceries").on(jan(2024)),
            Transaction::new(-200, "groceries").on(jan(2025)),
            Transaction::new(-300, "groceries"),
        ];
        let a = aggregate(&classifier(), &transactions, 2024);
        assert_eq!(total(&a.categories, "groceries"), Some(400));
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let c = classifier();
        let transactions = vec![
            Transaction::new(-100, "groceries"),
            Transaction::split(
                -300,
                vec![
                    Subtransaction::new(-200, "rent"),
                    Subtransaction::new(-100, "groceries"),
                ],
            ),
        ];
        let first = aggregate(&c, &transactions, 2024);
        let second = aggregate(&c, &transactions, 2024);
        assert_eq!(first, second);
        assert_eq!(first.year, 2024);
    }
}
