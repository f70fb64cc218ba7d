// Dashboard pipeline: resolve -> fetch -> parse -> aggregate
//
// One call per render, nothing kept between calls. The output bundle is
// always valid, even when every fetch failed.

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{group_by_category, mood_series, total_spent, CategorySlice, MoodPoint, MoodPolicy};
use crate::analytics::BurnRate;
use crate::config::DashboardConfig;
use crate::db::SqliteStore;
use crate::error::{ConfigError, ShapeIssue};
use crate::fetch::RecordFetcher;
use crate::parse::{parse_activities, parse_journal_entries, parse_transactions};
use crate::records::{Activity, JournalEntry, Transaction};
use crate::store::RecordStore;
use crate::window::TimeWindows;

/// Everything the dashboard page needs, in the shape it reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Whole month, newest transaction date first
    pub transactions: Vec<Transaction>,
    /// Trailing window, oldest first
    pub journal_entries: Vec<JournalEntry>,
    /// Latest few, newest first
    pub activities: Vec<Activity>,
    pub total_spent: f64,
    pub donut_chart_data: Vec<CategorySlice>,
    pub mood_chart_data: Vec<MoodPoint>,
    pub burn_rate: BurnRate,
}

impl DashboardData {
    /// Derive every aggregate from parsed records. Pure.
    pub fn build(
        windows: &TimeWindows,
        transactions: Vec<Transaction>,
        journal_entries: Vec<JournalEntry>,
        activities: Vec<Activity>,
        mood_policy: MoodPolicy,
    ) -> Self {
        DashboardData {
            total_spent: total_spent(&transactions),
            donut_chart_data: group_by_category(&transactions),
            mood_chart_data: mood_series(&journal_entries, mood_policy),
            burn_rate: BurnRate::calculate(&transactions, windows),
            transactions,
            journal_entries,
            activities,
        }
    }
}

pub struct Dashboard<S> {
    fetcher: RecordFetcher<S>,
    tz: chrono_tz::Tz,
    trailing_days: u32,
    mood_policy: MoodPolicy,
}

impl Dashboard<SqliteStore> {
    /// Dashboard over the SQLite file named in the config.
    pub fn open(config: &DashboardConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        Ok(Dashboard::new(store, config)?)
    }
}

impl<S: RecordStore> Dashboard<S> {
    pub fn new(store: S, config: &DashboardConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Dashboard {
            fetcher: RecordFetcher::new(store, config.activity_limit).with_timeout(config.fetch_timeout()),
            tz: config.tz()?,
            trailing_days: config.trailing_days,
            mood_policy: config.mood_policy,
        })
    }

    /// Render as of the wall clock, in the application timezone.
    pub async fn load_now(&self) -> DashboardData {
        let now = Utc::now().with_timezone(&self.tz);
        self.load(&now).await
    }

    /// Render as of `now`; the calendar is the one of `now`'s timezone.
    pub async fn load<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardData {
        let windows = TimeWindows::resolve(now, self.trailing_days);
        debug!(
            month_start = %windows.month.first_day,
            month_end = %windows.month.last_day,
            trailing_start = %windows.trailing_start,
            "resolved windows"
        );

        self.load_windows(windows).await
    }

    async fn load_windows(&self, windows: TimeWindows) -> DashboardData {
        let fetched = self.fetcher.fetch_all(&windows).await;

        let transactions = parse_transactions(fetched.transactions);
        let journal_entries = parse_journal_entries(fetched.journal_entries);
        let activities = parse_activities(fetched.activities);

        for issue in transactions
            .issues
            .iter()
            .chain(&journal_entries.issues)
            .chain(&activities.issues)
        {
            log_issue(issue);
        }

        let data = DashboardData::build(
            &windows,
            transactions.records,
            journal_entries.records,
            activities.records,
            self.mood_policy,
        );

        info!(
            transactions = data.transactions.len(),
            journal_entries = data.journal_entries.len(),
            activities = data.activities.len(),
            total_spent = data.total_spent,
            failed = ?fetched.failed,
            "dashboard rendered"
        );

        data
    }
}

fn log_issue(issue: &ShapeIssue) {
    warn!(
        collection = issue.collection.table_name(),
        record_id = %issue.record_id,
        field = issue.field,
        error = %issue.error,
        "record field coerced to default"
    );
}
