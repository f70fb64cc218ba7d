// Store query interface
//
// The record store is an external collaborator. The pipeline only needs one
// read operation: "rows of a collection, optionally range-filtered on one
// field, ordered by one field, optionally limited". Rows come back loosely
// typed; turning them into entities is the parse module's job.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::StoreError;

/// A row as the store returns it: column name -> JSON value, no schema.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Transactions,
    JournalEntries,
    Activities,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Transactions => "finance_transactions",
            Collection::JournalEntries => "journal_entries",
            Collection::Activities => "activities",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: &'static str,
    pub direction: Direction,
}

/// Typed bound so a store can compare calendar dates and instants correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

/// Inclusive range on one field; either side may be open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub field: &'static str,
    pub gte: Option<FilterValue>,
    pub lte: Option<FilterValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: Collection,
    pub range: Option<RangeFilter>,
    pub order: Ordering,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: Collection, order_field: &'static str, direction: Direction) -> Self {
        Query {
            collection,
            range: None,
            order: Ordering {
                field: order_field,
                direction,
            },
            limit: None,
        }
    }

    pub fn between(mut self, field: &'static str, gte: FilterValue, lte: FilterValue) -> Self {
        self.range = Some(RangeFilter {
            field,
            gte: Some(gte),
            lte: Some(lte),
        });
        self
    }

    pub fn since(mut self, field: &'static str, gte: FilterValue) -> Self {
        self.range = Some(RangeFilter {
            field,
            gte: Some(gte),
            lte: None,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, query: Query) -> Result<Vec<RawRecord>, StoreError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    async fn query(&self, query: Query) -> Result<Vec<RawRecord>, StoreError> {
        (**self).query(query).await
    }
}
