// Presentation rules
//
// What a consumer of DashboardData does before drawing: drop non-positive
// donut slices, slice the recent transactions, substitute display fallbacks
// and pick an explicit "no data" state per section. Shared so the terminal UI
// and the HTTP view apply the same rules.

use serde::Serialize;

use crate::aggregate::{CategorySlice, MoodPoint};
use crate::analytics::BurnRate;
use crate::dashboard::DashboardData;
use crate::records::{Activity, Transaction};

pub const UNKNOWN_MERCHANT: &str = "Unknown";
pub const GENERAL_CATEGORY: &str = "General";
pub const DEFAULT_ACTIVITY: &str = "Activity";

/// Characters of an activity's details shown before the ellipsis
pub const DETAIL_PREVIEW_CHARS: usize = 30;

pub const NO_SPENDING: &str = "No spending recorded this month";
pub const NO_CHART_DATA: &str = "No data";
pub const NO_JOURNAL: &str = "No recent journal entries";
pub const NO_ACTIVITIES: &str = "No recent activities";
pub const NO_TRANSACTIONS: &str = "No recent transactions";

/// A dashboard section: either something to draw or an explicit empty state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "content", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData(&'static str),
}

/// Donut ready to draw: positive slices only, total over those slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonutView {
    pub slices: Vec<CategorySlice>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub merchant: String,
    pub category: String,
    pub date: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub label: String,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub total_spent: f64,
    pub burn_rate: BurnRate,
    pub spend_breakdown: Section<DonutView>,
    pub mood: Section<Vec<MoodPoint>>,
    pub activities: Section<Vec<ActivityRow>>,
    pub recent_transactions: Section<Vec<TransactionRow>>,
}

impl DashboardView {
    pub fn from_data(data: &DashboardData, recent: usize) -> Self {
        let spend_breakdown = if data.donut_chart_data.is_empty() {
            Section::NoData(NO_SPENDING)
        } else {
            donut(&data.donut_chart_data)
        };

        let mood = if data.mood_chart_data.is_empty() {
            Section::NoData(NO_JOURNAL)
        } else {
            Section::Ready(data.mood_chart_data.clone())
        };

        let activities = if data.activities.is_empty() {
            Section::NoData(NO_ACTIVITIES)
        } else {
            Section::Ready(data.activities.iter().map(activity_row).collect())
        };

        let recent_transactions = if data.transactions.is_empty() {
            Section::NoData(NO_TRANSACTIONS)
        } else {
            Section::Ready(
                recent_transactions(&data.transactions, recent)
                    .iter()
                    .map(transaction_row)
                    .collect(),
            )
        };

        DashboardView {
            total_spent: data.total_spent,
            burn_rate: data.burn_rate,
            spend_breakdown,
            mood,
            activities,
            recent_transactions,
        }
    }
}

/// Slices a donut can draw: strictly positive values, input order kept.
pub fn donut_slices(breakdown: &[CategorySlice]) -> Vec<CategorySlice> {
    breakdown.iter().filter(|s| s.value > 0.0).cloned().collect()
}

/// Centre-label total, over the drawable slices only.
pub fn display_total(slices: &[CategorySlice]) -> f64 {
    slices.iter().map(|s| s.value).sum()
}

fn donut(breakdown: &[CategorySlice]) -> Section<DonutView> {
    let slices = donut_slices(breakdown);
    if slices.is_empty() {
        return Section::NoData(NO_CHART_DATA);
    }

    let total = display_total(&slices);
    Section::Ready(DonutView { slices, total })
}

/// First `n` of the month list; totals still use the whole list.
pub fn recent_transactions(transactions: &[Transaction], n: usize) -> &[Transaction] {
    &transactions[..transactions.len().min(n)]
}

pub fn transaction_row(tx: &Transaction) -> TransactionRow {
    TransactionRow {
        merchant: non_empty(tx.merchant.as_deref()).unwrap_or(UNKNOWN_MERCHANT).to_string(),
        category: non_empty(tx.category.as_deref()).unwrap_or(GENERAL_CATEGORY).to_string(),
        date: tx.date_transaction.map(|d| d.format("%Y-%m-%d").to_string()),
        amount: tx.amount,
    }
}

pub fn activity_row(activity: &Activity) -> ActivityRow {
    ActivityRow {
        label: non_empty(activity.kind.as_deref()).unwrap_or(DEFAULT_ACTIVITY).to_string(),
        preview: detail_preview(activity),
    }
}

/// Compact JSON of the details, cut to a fixed width, always with an ellipsis.
pub fn detail_preview(activity: &Activity) -> String {
    let json = match &activity.details {
        Some(details) => serde_json::Value::Object(details.clone()).to_string(),
        None => "null".to_string(),
    };

    let cut: String = json.chars().take(DETAIL_PREVIEW_CHARS).collect();
    format!("{}...", cut)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn slice(name: &str, value: f64) -> CategorySlice {
        CategorySlice {
            name: name.to_string(),
            value,
        }
    }

    fn tx(i: u32, merchant: Option<&str>) -> Transaction {
        Transaction {
            id: format!("t{}", i),
            created_at: None,
            date_transaction: NaiveDate::from_ymd_opt(2026, 10, i),
            amount: Some(f64::from(i)),
            currency: None,
            category: None,
            merchant: merchant.map(str::to_string),
            is_fixed: None,
            is_client_expense: None,
            installment_current: None,
            installment_total: None,
            source: None,
        }
    }

    fn empty_data() -> DashboardData {
        DashboardData {
            transactions: vec![],
            journal_entries: vec![],
            activities: vec![],
            total_spent: 0.0,
            donut_chart_data: vec![],
            mood_chart_data: vec![],
            burn_rate: BurnRate {
                total_spent: 0.0,
                burn_rate_daily: 0.0,
                projected_end_month: 0.0,
                days_remaining: 14,
            },
        }
    }

    #[test]
    fn test_donut_drops_non_positive_and_recomputes_total() {
        let breakdown = vec![slice("Food", 150.0), slice("Rent", 0.0), slice("Fun", -20.0)];

        let slices = donut_slices(&breakdown);

        assert_eq!(slices, vec![slice("Food", 150.0)]);
        assert_eq!(display_total(&slices), 150.0);
    }

    #[test]
    fn test_donut_with_only_non_positive_is_no_data() {
        let mut data = empty_data();
        data.donut_chart_data = vec![slice("Refund", -30.0)];

        let view = DashboardView::from_data(&data, 5);
        assert_eq!(view.spend_breakdown, Section::NoData(NO_CHART_DATA));
    }

    #[test]
    fn test_recent_slice_leaves_totals_alone() {
        let mut data = empty_data();
        data.transactions = (1..=8).map(|i| tx(i, None)).collect();
        data.total_spent = 36.0;

        let view = DashboardView::from_data(&data, 5);

        match view.recent_transactions {
            Section::Ready(rows) => {
                assert_eq!(rows.len(), 5);
                assert_eq!(rows[0].merchant, UNKNOWN_MERCHANT);
                assert_eq!(rows[0].category, GENERAL_CATEGORY);
                assert_eq!(rows[0].date.as_deref(), Some("2026-10-01"));
            }
            other => panic!("expected rows, got {:?}", other),
        }
        assert_eq!(view.total_spent, 36.0);
        assert_eq!(recent_transactions(&data.transactions[..2], 5).len(), 2);
    }

    #[test]
    fn test_empty_bundle_is_no_data_everywhere() {
        let view = DashboardView::from_data(&empty_data(), 5);

        assert_eq!(view.spend_breakdown, Section::NoData(NO_SPENDING));
        assert_eq!(view.mood, Section::NoData(NO_JOURNAL));
        assert_eq!(view.activities, Section::NoData(NO_ACTIVITIES));
        assert_eq!(view.recent_transactions, Section::NoData(NO_TRANSACTIONS));
    }

    #[test]
    fn test_activity_row_fallbacks() {
        let mut details = serde_json::Map::new();
        details.insert("exercise".to_string(), json!("bench press"));
        details.insert("sets".to_string(), json!(4));

        let with_details = Activity {
            id: "a1".to_string(),
            created_at: None,
            kind: Some("workout".to_string()),
            details: Some(details),
        };
        let bare = Activity {
            id: "a2".to_string(),
            created_at: None,
            kind: None,
            details: None,
        };

        let row = activity_row(&with_details);
        assert_eq!(row.label, "workout");
        assert_eq!(row.preview.chars().count(), DETAIL_PREVIEW_CHARS + 3);
        assert!(row.preview.starts_with("{\"exercise\":\"bench press\""));

        let row = activity_row(&bare);
        assert_eq!(row.label, DEFAULT_ACTIVITY);
        assert_eq!(row.preview, "null...");
    }

    #[test]
    fn test_view_wire_names_are_camel_case() {
        let mut data = empty_data();
        data.transactions = vec![tx(1, Some("Coto"))];
        data.donut_chart_data = vec![slice("Food", 1.0)];

        let json = serde_json::to_value(DashboardView::from_data(&data, 5)).unwrap();

        for key in ["totalSpent", "burnRate", "spendBreakdown", "mood", "activities", "recentTransactions"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json.get("spend_breakdown").is_none());
        assert_eq!(json["burnRate"]["daysRemaining"], 14);
        assert_eq!(json["recentTransactions"]["content"][0]["merchant"], "Coto");
    }

    #[test]
    fn test_section_serializes_state_tag() {
        let section: Section<Vec<u8>> = Section::NoData(NO_JOURNAL);
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            json!({ "state": "no_data", "content": NO_JOURNAL })
        );
    }
}
