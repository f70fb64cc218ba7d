use chrono::SecondsFormat;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::{Direction, FilterValue, Query, RawRecord, RecordStore};

/// SQLite-backed record store.
///
/// The connection is shared behind a mutex and every query runs on the
/// blocking pool, so the three dashboard fetches can be awaited together.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn query(&self, query: Query) -> Result<Vec<RawRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);

        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            run_query(&conn, &query)
        })
        .await??;

        Ok(rows)
    }
}

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Finance transactions (written by the ingestion bot)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS finance_transactions (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            date_transaction TEXT,
            amount REAL,
            currency TEXT,
            category TEXT,
            subcategory TEXT,
            merchant TEXT,
            payment_method TEXT,
            is_fixed INTEGER,
            is_client_expense INTEGER,
            installment_current INTEGER,
            installment_total INTEGER,
            original_desc TEXT,
            source TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Journal entries (embedding stored as JSON text, never read here)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS journal_entries (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            content TEXT,
            mood_score REAL,
            sentiment_tags TEXT,
            embedding TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Activities (details stored as JSON text)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            type TEXT,
            details TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tx_date ON finance_transactions(date_transaction)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_journal_created ON journal_entries(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_created ON activities(created_at)",
        [],
    )?;

    Ok(())
}

/// Run one store query synchronously and return loosely-typed rows.
pub fn run_query(conn: &Connection, query: &Query) -> Result<Vec<RawRecord>, StoreError> {
    let (sql, params) = build_sql(query)?;

    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let records = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let mut record = RawRecord::new();
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.clone(), to_json(row.get_ref(i)?));
            }
            Ok(record)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Translate a Query into SQL plus positional parameters.
fn build_sql(query: &Query) -> Result<(String, Vec<Value>), StoreError> {
    let table = query.collection.table_name();
    check_identifier(table)?;
    check_identifier(query.order.field)?;

    let mut sql = format!("SELECT * FROM {}", table);
    let mut params = Vec::new();
    let mut clauses = Vec::new();

    if let Some(range) = &query.range {
        check_identifier(range.field)?;

        for (bound, op) in [(range.gte, ">="), (range.lte, "<=")] {
            if let Some(value) = bound {
                params.push(Value::Text(filter_text(&value)));
                let n = params.len();
                clauses.push(match value {
                    FilterValue::Date(_) => format!("date({}) {} date(?{})", range.field, op, n),
                    FilterValue::Timestamp(_) => {
                        format!("julianday({}) {} julianday(?{})", range.field, op, n)
                    }
                });
            }
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let direction = match query.order.direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
    };
    sql.push_str(&format!(" ORDER BY julianday({}) {}", query.order.field, direction));

    if let Some(limit) = query.limit {
        params.push(Value::Integer(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", params.len()));
    }

    Ok((sql, params))
}

fn filter_text(value: &FilterValue) -> String {
    match value {
        FilterValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        FilterValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Identifiers are spliced into SQL, so only plain names are accepted.
fn check_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!("bad identifier {:?}", name)))
    }
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            // NaN / inf survive as text so the parse layer can flag them
            .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => serde_json::Value::Null,
    }
}

/// Row builders for tests; the pipeline itself never writes.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};

    impl SqliteStore {
        pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
            let conn = self.conn.lock().unwrap();
            f(&conn)
        }
    }

    pub fn memory_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    pub fn ts(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn insert_row(conn: &Connection, table: &str, columns: &[(&str, Value)]) {
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        );

        conn.execute(&sql, params_from_iter(columns.iter().map(|(_, v)| v)))
            .unwrap();
    }

    pub fn insert_transaction(
        conn: &Connection,
        date: NaiveDate,
        amount: Value,
        category: Option<&str>,
        merchant: Option<&str>,
    ) -> String {
        let id = new_id();
        insert_row(
            conn,
            "finance_transactions",
            &[
                ("id", Value::Text(id.clone())),
                ("created_at", Value::Text(ts(Utc::now()))),
                ("date_transaction", Value::Text(date.format("%Y-%m-%d").to_string())),
                ("amount", amount),
                ("currency", Value::Text("ARS".to_string())),
                ("category", category.map(|c| Value::Text(c.to_string())).unwrap_or(Value::Null)),
                ("merchant", merchant.map(|m| Value::Text(m.to_string())).unwrap_or(Value::Null)),
                ("is_fixed", Value::Integer(0)),
                ("source", Value::Text("telegram_manual".to_string())),
            ],
        );
        id
    }

    pub fn insert_journal_entry(
        conn: &Connection,
        created_at: DateTime<Utc>,
        mood_score: Option<f64>,
        tags: Option<&str>,
    ) -> String {
        let id = new_id();
        insert_row(
            conn,
            "journal_entries",
            &[
                ("id", Value::Text(id.clone())),
                ("created_at", Value::Text(ts(created_at))),
                ("content", Value::Text("entry".to_string())),
                ("mood_score", mood_score.map(Value::Real).unwrap_or(Value::Null)),
                ("sentiment_tags", tags.map(|t| Value::Text(t.to_string())).unwrap_or(Value::Null)),
                ("embedding", Value::Text("[0.1, 0.2]".to_string())),
            ],
        );
        id
    }

    pub fn insert_activity(
        conn: &Connection,
        created_at: DateTime<Utc>,
        kind: Option<&str>,
        details: Option<&str>,
    ) -> String {
        let id = new_id();
        insert_row(
            conn,
            "activities",
            &[
                ("id", Value::Text(id.clone())),
                ("created_at", Value::Text(ts(created_at))),
                ("type", kind.map(|k| Value::Text(k.to_string())).unwrap_or(Value::Null)),
                ("details", details.map(|d| Value::Text(d.to_string())).unwrap_or(Value::Null)),
            ],
        );
        id
    }
}
