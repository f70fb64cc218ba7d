// Record Fetcher
//
// Three independent reads issued together and joined before aggregation.
// Each read goes through the same wrapper, which turns any StoreError into an
// empty sequence (and a log line) so one failing read cannot sink the others.

use std::time::Duration;
use tracing::{debug, error};

use crate::error::StoreError;
use crate::store::{Collection, Direction, FilterValue, Query, RawRecord, RecordStore};
use crate::window::TimeWindows;

pub const TRANSACTION_DATE: &str = "date_transaction";
pub const CREATED_AT: &str = "created_at";

/// Raw rows for one render. A failed read shows up as an empty list plus an
/// entry in `failed`.
#[derive(Debug, Default)]
pub struct FetchedRecords {
    pub transactions: Vec<RawRecord>,
    pub journal_entries: Vec<RawRecord>,
    pub activities: Vec<RawRecord>,
    pub failed: Vec<Collection>,
}

/// Month transactions, newest transaction date first.
pub fn transactions_query(windows: &TimeWindows) -> Query {
    Query::new(Collection::Transactions, TRANSACTION_DATE, Direction::Descending).between(
        TRANSACTION_DATE,
        FilterValue::Date(windows.month.first_day),
        FilterValue::Date(windows.month.last_day),
    )
}

/// Trailing-window journal entries, oldest first so the chart needs no sort.
pub fn journal_query(windows: &TimeWindows) -> Query {
    Query::new(Collection::JournalEntries, CREATED_AT, Direction::Ascending)
        .since(CREATED_AT, FilterValue::Timestamp(windows.trailing_start))
}

/// Latest activities, newest first.
pub fn activities_query(limit: usize) -> Query {
    Query::new(Collection::Activities, CREATED_AT, Direction::Descending).limit(limit)
}

pub struct RecordFetcher<S> {
    store: S,
    activity_limit: usize,
    timeout: Option<Duration>,
}

impl<S: RecordStore> RecordFetcher<S> {
    pub fn new(store: S, activity_limit: usize) -> Self {
        RecordFetcher {
            store,
            activity_limit,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the three reads concurrently and wait for all of them.
    pub async fn fetch_all(&self, windows: &TimeWindows) -> FetchedRecords {
        let (transactions, journal_entries, activities) = tokio::join!(
            self.fetch_or_empty(transactions_query(windows)),
            self.fetch_or_empty(journal_query(windows)),
            self.fetch_or_empty(activities_query(self.activity_limit)),
        );

        let mut fetched = FetchedRecords::default();

        fetched.transactions = collect(transactions, Collection::Transactions, &mut fetched.failed);
        fetched.journal_entries = collect(journal_entries, Collection::JournalEntries, &mut fetched.failed);
        fetched.activities = collect(activities, Collection::Activities, &mut fetched.failed);

        // the cap holds even if a store ignores the limit
        fetched.activities.truncate(self.activity_limit);

        fetched
    }

    async fn fetch_or_empty(&self, query: Query) -> Result<Vec<RawRecord>, StoreError> {
        let collection = query.collection;

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.store.query(query)).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(limit.as_millis() as u64)),
            },
            None => self.store.query(query).await,
        };

        match &result {
            Ok(rows) => debug!(collection = collection.table_name(), rows = rows.len(), "fetched"),
            Err(e) => error!(
                collection = collection.table_name(),
                error = %e,
                "fetch failed, treating as empty"
            ),
        }

        result
    }
}

fn collect(
    result: Result<Vec<RawRecord>, StoreError>,
    collection: Collection,
    failed: &mut Vec<Collection>,
) -> Vec<RawRecord> {
    result.unwrap_or_else(|_| {
        failed.push(collection);
        Vec::new()
    })
}
