//! Converts annual totals into monthly averages.

use crate::analysis::{Aggregates, Bucket, Clock};
use crate::model::Milliunits;
use crate::prefs::{self, PreferenceStore};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

/// The number of months that have elapsed in `year` as of `today`: the current month number
/// (1 for January) for the current year, 12 for any other year. Never zero.
pub fn months_to_average(year: i32, today: NaiveDate) -> u32 {
    if year == today.year() {
        today.month()
    } else {
        12
    }
}

/// Divides `total` by the number of elapsed months of `year`. The result is in milliunits.
pub fn monthly_average(total: Milliunits, year: i32, today: NaiveDate) -> Decimal {
    total.to_decimal() / Decimal::from(months_to_average(year, today))
}

/// Monthly averages per category and per group for one year.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct Averages {
    pub year: i32,
    pub months: u32,
    pub categories: BTreeMap<String, Decimal>,
    pub groups: BTreeMap<String, Decimal>,
}

/// Computes monthly averages and mirrors them, best-effort, into a preference store under
/// `average_{id}_{year}`.
///
/// Mirroring never holds up the computation. The writes run on tokio's blocking pool, or on a
/// separate thread when there is no runtime, and `flush` waits for the ones started so far.
#[derive(Clone)]
pub struct Normalizer {
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn PreferenceStore>>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Debug for Normalizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("today", &self.clock.today())
            .field("mirrored", &self.store.is_some())
            .finish()
    }
}

impl Normalizer {
    pub fn new(clock: Arc<dyn Clock>, store: Option<Arc<dyn PreferenceStore>>) -> Self {
        Self {
            clock,
            store,
            pending: Arc::default(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The monthly average of one category or group, mirrored under `id`.
    pub fn monthly_average(&self, id: &str, total: Milliunits, year: i32) -> Decimal {
        let average = monthly_average(total, year, self.today());
        self.mirror(vec![(prefs::average_key(id, year), format_average(average))]);
        average
    }

    /// The monthly averages of every bucket in `aggregates`, mirrored in a single store write.
    pub fn normalize(&self, aggregates: &Aggregates) -> Averages {
        let today = self.today();
        let year = aggregates.year;
        let average_all = |buckets: &BTreeMap<String, Bucket>| {
            buckets
                .iter()
                .map(|(id, b)| (id.clone(), monthly_average(b.total, year, today)))
                .collect::<BTreeMap<_, _>>()
        };
        let averages = Averages {
            year,
            months: months_to_average(year, today),
            categories: average_all(&aggregates.categories),
            groups: average_all(&aggregates.groups),
        };
        if self.store.is_some() {
            let entries: Vec<(String, String)> = averages
                .categories
                .iter()
                .chain(averages.groups.iter())
                .map(|(id, avg)| (prefs::average_key(id, year), format_average(*avg)))
                .collect();
            self.mirror(entries);
        }
        averages
    }

    /// Waits for the mirrored writes started so far on the current runtime.
    pub async fn flush(&self) {
        let tasks = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for task in tasks {
            if let Err(e) = task.await {
                warn!("A preference write did not finish: {e}");
            }
        }
    }

    /// Starts writing `entries` to the store without waiting for it.
    fn mirror(&self, entries: Vec<(String, String)>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if entries.is_empty() {
            return;
        }
        let write = move || prefs::remember_all(store.as_ref(), &entries);
        match Handle::try_current() {
            Ok(handle) => {
                let task = handle.spawn_blocking(write);
                if let Ok(mut pending) = self.pending.lock() {
                    pending.retain(|t| !t.is_finished());
                    pending.push(task);
                }
            }
            Err(_) => {
                std::thread::spawn(write);
            }
        }
    }
}

fn format_average(average: Decimal) -> String {
    average.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, CategoryClassifier, FixedClock};
    use crate::model::{Category, CategoryGroup, Transaction};
    use crate::prefs::MemoryPreferences;
    use crate::test::{BrokenStore, GatedStore};
    use std::time::{Duration, Instant};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_past_year_divides_by_twelve() {
        for month in 1..=12 {
            let today = date(2025, month, 1);
            assert_eq!(months_to_average(2024, today), 12);
            assert_eq!(months_to_average(2030, today), 12);
        }
        assert_eq!(
            monthly_average(Milliunits::new(1200), 2023, date(2024, 6, 15)),
            Decimal::from(100)
        );
    }

    #[test]
    fn test_current_year_divides_by_month_number() {
        assert_eq!(months_to_average(2024, date(2024, 1, 31)), 1);
        assert_eq!(months_to_average(2024, date(2024, 12, 1)), 12);
        assert_eq!(
            monthly_average(Milliunits::new(1200), 2024, date(2024, 6, 10)),
            Decimal::from(200)
        );
    }

    #[tokio::test]
    async fn test_monthly_average_mirrors_value() {
        let store = Arc::new(MemoryPreferences::new());
        let normalizer = Normalizer::new(
            Arc::new(FixedClock::new(date(2024, 6, 10))),
            Some(store.clone()),
        );
        let avg = normalizer.monthly_average("groceries", Milliunits::new(1200), 2024);
        assert_eq!(avg, Decimal::from(200));
        normalizer.flush().await;
        assert_eq!(
            store.get("average_groceries_2024").unwrap().as_deref(),
            Some("200")
        );
    }

    #[test]
    fn test_normalize_without_store() {
        let classifier = CategoryClassifier::new(&[CategoryGroup::new(
            "g",
            "Food",
            vec![Category::new("c", "Groceries")],
        )]);
        let aggregates = aggregate(&classifier, &[Transaction::new(-3000, "c")], 2023);
        let normalizer = Normalizer::new(Arc::new(FixedClock::new(date(2024, 2, 1))), None);
        let averages = normalizer.normalize(&aggregates);
        assert_eq!(averages.months, 12);
        assert_eq!(averages.categories["c"], Decimal::from(250));
        assert_eq!(averages.groups["g"], Decimal::from(250));
    }

    #[tokio::test]
    async fn test_normalize_mirrors_categories_and_groups() {
        let classifier = CategoryClassifier::new(&[CategoryGroup::new(
            "g",
            "Food",
            vec![Category::new("c", "Groceries")],
        )]);
        let aggregates = aggregate(&classifier, &[Transaction::new(-1000, "c")], 2024);
        let store = Arc::new(MemoryPreferences::new());
        let normalizer = Normalizer::new(
            Arc::new(FixedClock::new(date(2024, 4, 1))),
            Some(store.clone()),
        );
        let averages = normalizer.normalize(&aggregates);
        assert_eq!(averages.months, 4);
        normalizer.flush().await;
        let saved = store.snapshot();
        assert_eq!(saved.get("average_c_2024").map(String::as_str), Some("250"));
        assert_eq!(saved.get("average_g_2024").map(String::as_str), Some("250"));
    }

    fn food(total: i64, year: i32) -> Aggregates {
        let classifier = CategoryClassifier::new(&[CategoryGroup::new(
            "g",
            "Food",
            vec![Category::new("c", "Groceries")],
        )]);
        aggregate(&classifier, &[Transaction::new(total, "c")], year)
    }

    #[tokio::test]
    async fn test_normalize_does_not_wait_for_the_store() {
        let store = Arc::new(GatedStore::default());
        let normalizer = Normalizer::new(
            Arc::new(FixedClock::new(date(2024, 4, 1))),
            Some(store.clone()),
        );
        let started = Instant::now();
        let averages = normalizer.normalize(&food(-1000, 2024));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(averages.categories["c"], Decimal::from(250));
        assert!(store.written().is_empty());

        store.open();
        normalizer.flush().await;
        assert_eq!(
            store.written().get("average_c_2024").map(String::as_str),
            Some("250")
        );
    }

    #[tokio::test]
    async fn test_failing_store_leaves_averages_unchanged() {
        let clock = Arc::new(FixedClock::new(date(2024, 4, 1)));
        let aggregates = food(-1000, 2024);
        let expected = Normalizer::new(clock.clone(), None).normalize(&aggregates);
        let broken = Normalizer::new(clock, Some(Arc::new(BrokenStore)));
        assert_eq!(broken.normalize(&aggregates), expected);
        broken.flush().await;
    }

    #[test]
    fn test_mirrors_without_a_runtime() {
        let store = Arc::new(MemoryPreferences::new());
        let normalizer = Normalizer::new(
            Arc::new(FixedClock::new(date(2024, 4, 1))),
            Some(store.clone()),
        );
        normalizer.normalize(&food(-1000, 2024));
        let deadline = Instant::now() + Duration::from_secs(5);
        while !store.snapshot().contains_key("average_g_2024") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(
            store.snapshot().get("average_g_2024").map(String::as_str),
            Some("250")
        );
    }
}
