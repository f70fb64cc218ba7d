// Aggregation & Shaping Engine
//
// Pure functions over already-parsed records: no I/O, no clock, no state.
// Every aggregate degrades to its empty value on empty input.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::records::{JournalEntry, Transaction};

/// Label used when a transaction has no category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Mood axis bounds used by the chart
pub const MOOD_MIN: f64 = 0.0;
pub const MOOD_MAX: f64 = 10.0;

/// One group of the category breakdown (a donut slice before filtering).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

/// One point of the mood chart. `None` is a gap, never a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: String,
    #[serde(rename = "Mood")]
    pub mood: Option<f64>,
}

/// Handling of mood scores outside 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodPolicy {
    /// Keep the stored value as-is
    #[default]
    PassThrough,
    /// Pull the value onto the nearest bound
    Clamp,
    /// Replace the value with a gap
    Discard,
}

impl MoodPolicy {
    pub fn apply(&self, score: f64) -> Option<f64> {
        if (MOOD_MIN..=MOOD_MAX).contains(&score) {
            return Some(score);
        }

        match self {
            MoodPolicy::PassThrough => Some(score),
            MoodPolicy::Clamp => Some(score.clamp(MOOD_MIN, MOOD_MAX)),
            MoodPolicy::Discard => None,
        }
    }
}

/// Sum of every coercible amount in the month set.
pub fn total_spent(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::amount_or_zero).sum()
}

/// Display label for a transaction's category ("" counts as missing).
pub fn category_label(tx: &Transaction) -> &str {
    match tx.category.as_deref() {
        Some(category) if !category.is_empty() => category,
        _ => UNCATEGORIZED,
    }
}

/// Summed amount per category, in first-seen order.
///
/// Every transaction lands in exactly one group, so the group values add up
/// to `total_spent`. Non-positive groups are kept; filtering them is the
/// chart's business (see `presentation::donut_slices`).
pub fn group_by_category(transactions: &[Transaction]) -> Vec<CategorySlice> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut slices: Vec<CategorySlice> = Vec::new();

    for tx in transactions {
        let label = category_label(tx);
        let slot = *index.entry(label).or_insert_with(|| {
            slices.push(CategorySlice {
                name: label.to_string(),
                value: 0.0,
            });
            slices.len() - 1
        });
        slices[slot].value += tx.amount_or_zero();
    }

    slices
}

/// Short month/day label, in the offset the timestamp carries ("Jan 05").
pub fn mood_label(created_at: &DateTime<FixedOffset>) -> String {
    created_at.format("%b %d").to_string()
}

/// One point per entry, in the (ascending) order the entries were fetched.
pub fn mood_series(entries: &[JournalEntry], policy: MoodPolicy) -> Vec<MoodPoint> {
    entries
        .iter()
        .map(|entry| {
            let mood = entry.mood_score.and_then(|score| {
                if !(MOOD_MIN..=MOOD_MAX).contains(&score) {
                    warn!(
                        entry_id = %entry.id,
                        score,
                        policy = ?policy,
                        "mood score outside 0..=10"
                    );
                }
                policy.apply(score)
            });

            MoodPoint {
                date: mood_label(&entry.created_at),
                mood,
            }
        })
        .collect()
}
