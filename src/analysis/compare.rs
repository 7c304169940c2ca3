//! Year-over-year comparison of monthly averages.

use crate::model::Milliunits;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The change of one category's or group's monthly average against the previous year.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct Change {
    /// Current average minus previous average, in milliunits.
    pub amount: Decimal,
    /// `amount` as a percentage of the previous average, or 0 when the previous average is 0.
    pub percentage: Decimal,
    pub current_total: Milliunits,
    pub previous_total: Milliunits,
}

/// Compares `current_averages` against `previous_averages`.
///
/// Only ids present in `current_averages` are in the result. An id with spending in the previous
/// year alone is left out. A missing previous average or total is treated as zero.
pub fn compare(
    current_averages: &BTreeMap<String, Decimal>,
    previous_averages: &BTreeMap<String, Decimal>,
    current_totals: &BTreeMap<String, Milliunits>,
    previous_totals: &BTreeMap<String, Milliunits>,
) -> BTreeMap<String, Change> {
    current_averages
        .iter()
        .map(|(id, current)| {
            let previous = previous_averages.get(id).copied().unwrap_or_default();
            let amount = *current - previous;
            let percentage = if previous.is_zero() {
                Decimal::ZERO
            } else {
                amount / previous * Decimal::ONE_HUNDRED
            };
            let change = Change {
                amount,
                percentage,
                current_total: current_totals.get(id).copied().unwrap_or_default(),
                previous_total: previous_totals.get(id).copied().unwrap_or_default(),
            };
            (id.clone(), change)
        })
        .collect()
}
