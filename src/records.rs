// Typed dashboard entities
//
// Read-only snapshots of what the ingestion side wrote. Field names are the
// store's column names, because that is what the presentation layer reads.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// A finance transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub date_transaction: Option<NaiveDate>,

    /// None when the stored value was missing or not coercible to a finite number
    pub amount: Option<f64>,

    pub currency: Option<String>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub is_fixed: Option<bool>,
    pub is_client_expense: Option<bool>,
    pub installment_current: Option<i64>,
    pub installment_total: Option<i64>,
    pub source: Option<String>,
}

impl Transaction {
    /// Amount as it counts towards sums: uncoercible amounts contribute 0.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }
}

/// A mood-journal entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub id: String,
    pub created_at: DateTime<FixedOffset>,
    pub content: Option<String>,
    pub mood_score: Option<f64>,
    pub sentiment_tags: Option<Vec<String>>,

    /// Opaque; carried through untouched
    pub embedding: Option<serde_json::Value>,
}

/// A logged physical activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: String,
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}
