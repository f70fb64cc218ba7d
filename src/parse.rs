// Parse / validate boundary
//
// Store rows arrive as untyped JSON maps. Every field is coerced here, once,
// with a safe default on failure; each failure becomes a ShapeIssue instead
// of an error. Records are only dropped when they are unusable without the
// broken field (a journal entry without a timestamp cannot be charted).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{ShapeError, ShapeIssue};
use crate::records::{Activity, JournalEntry, Transaction};
use crate::store::{Collection, RawRecord};

/// Typed records plus every field-level problem found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub issues: Vec<ShapeIssue>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Parsed {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

pub fn parse_transactions(rows: Vec<RawRecord>) -> Parsed<Transaction> {
    let mut parsed = Parsed::default();

    for row in &rows {
        let mut r = FieldReader::new(Collection::Transactions, row, &mut parsed.issues);

        let amount = r.required_number("amount");
        let tx = Transaction {
            id: r.id.clone(),
            created_at: r.timestamp("created_at"),
            date_transaction: r.date("date_transaction"),
            amount,
            currency: r.text("currency"),
            category: r.text("category"),
            merchant: r.text("merchant"),
            is_fixed: r.boolean("is_fixed"),
            is_client_expense: r.boolean("is_client_expense"),
            installment_current: r.integer("installment_current"),
            installment_total: r.integer("installment_total"),
            source: r.text("source"),
        };
        parsed.records.push(tx);
    }

    parsed
}

pub fn parse_journal_entries(rows: Vec<RawRecord>) -> Parsed<JournalEntry> {
    let mut parsed = Parsed::default();

    for row in &rows {
        let mut r = FieldReader::new(Collection::JournalEntries, row, &mut parsed.issues);

        let Some(created_at) = r.required_timestamp("created_at") else {
            continue;
        };

        let entry = JournalEntry {
            id: r.id.clone(),
            created_at,
            content: r.text("content"),
            mood_score: r.number("mood_score"),
            sentiment_tags: r.string_list("sentiment_tags"),
            embedding: r.raw("embedding"),
        };
        parsed.records.push(entry);
    }

    parsed
}

pub fn parse_activities(rows: Vec<RawRecord>) -> Parsed<Activity> {
    let mut parsed = Parsed::default();

    for row in &rows {
        let mut r = FieldReader::new(Collection::Activities, row, &mut parsed.issues);

        let activity = Activity {
            id: r.id.clone(),
            created_at: r.timestamp("created_at"),
            kind: r.text("type"),
            details: r.json_object("details"),
        };
        parsed.records.push(activity);
    }

    parsed
}

// ============================================================================
// FIELD READER
// ============================================================================

struct FieldReader<'a> {
    collection: Collection,
    record: &'a RawRecord,
    issues: &'a mut Vec<ShapeIssue>,
    id: String,
}

impl<'a> FieldReader<'a> {
    fn new(collection: Collection, record: &'a RawRecord, issues: &'a mut Vec<ShapeIssue>) -> Self {
        let id = match record.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let mut reader = FieldReader {
            collection,
            record,
            issues,
            id: id.clone().unwrap_or_default(),
        };

        if id.is_none() {
            reader.report("id", ShapeError::Missing);
        }

        reader
    }

    fn report(&mut self, field: &'static str, error: ShapeError) {
        self.issues.push(ShapeIssue {
            collection: self.collection,
            record_id: self.id.clone(),
            field,
            error,
        });
    }

    /// Present and non-null value of a field
    fn value(&self, field: &str) -> Option<&'a Value> {
        match self.record.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn raw(&self, field: &str) -> Option<Value> {
        self.value(field).cloned()
    }

    fn text(&mut self, field: &'static str) -> Option<String> {
        match self.value(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                self.report(field, unexpected("string", other));
                None
            }
        }
    }

    fn number(&mut self, field: &'static str) -> Option<f64> {
        let value = self.value(field)?;
        match coerce_number(value) {
            Ok(n) => Some(n),
            Err(e) => {
                self.report(field, e);
                None
            }
        }
    }

    fn required_number(&mut self, field: &'static str) -> Option<f64> {
        if self.value(field).is_none() {
            self.report(field, ShapeError::Missing);
            return None;
        }
        self.number(field)
    }

    fn integer(&mut self, field: &'static str) -> Option<i64> {
        let value = self.value(field)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        if parsed.is_none() {
            self.report(field, unexpected("integer", value));
        }
        parsed
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        let value = self.value(field)?;
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(true),
                "false" | "f" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };

        if parsed.is_none() {
            self.report(field, unexpected("boolean", value));
        }
        parsed
    }

    fn timestamp(&mut self, field: &'static str) -> Option<DateTime<FixedOffset>> {
        let value = self.value(field)?;
        match value {
            Value::String(s) => match parse_timestamp(s) {
                Some(ts) => Some(ts),
                None => {
                    self.report(field, ShapeError::InvalidTimestamp(s.clone()));
                    None
                }
            },
            other => {
                self.report(field, unexpected("timestamp string", other));
                None
            }
        }
    }

    fn required_timestamp(&mut self, field: &'static str) -> Option<DateTime<FixedOffset>> {
        if self.value(field).is_none() {
            self.report(field, ShapeError::Missing);
            return None;
        }
        self.timestamp(field)
    }

    fn date(&mut self, field: &'static str) -> Option<NaiveDate> {
        let value = self.value(field)?;
        match value {
            Value::String(s) => match parse_date(s) {
                Some(date) => Some(date),
                None => {
                    self.report(field, ShapeError::InvalidDate(s.clone()));
                    None
                }
            },
            other => {
                self.report(field, unexpected("date string", other));
                None
            }
        }
    }

    fn json_object(&mut self, field: &'static str) -> Option<serde_json::Map<String, Value>> {
        let value = self.value(field)?;
        let decoded = match value {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(v) => v,
                Err(e) => {
                    self.report(field, ShapeError::InvalidJson(e.to_string()));
                    return None;
                }
            },
            other => other.clone(),
        };

        match decoded {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                self.report(field, unexpected("object", &other));
                None
            }
        }
    }

    fn string_list(&mut self, field: &'static str) -> Option<Vec<String>> {
        let value = self.value(field)?;
        let decoded = match value {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(v) => v,
                Err(e) => {
                    self.report(field, ShapeError::InvalidJson(e.to_string()));
                    return None;
                }
            },
            other => other.clone(),
        };

        match decoded {
            Value::Array(items) => {
                let mut tags = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(tag) => tags.push(tag),
                        other => self.report(field, unexpected("string", &other)),
                    }
                }
                Some(tags)
            }
            Value::Null => None,
            other => {
                self.report(field, unexpected("array", &other));
                None
            }
        }
    }
}

// ============================================================================
// COERCIONS
// ============================================================================

/// Numeric coercion: numbers and numeric strings, finite only.
pub fn coerce_number(value: &Value) -> Result<f64, ShapeError> {
    let n = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ShapeError::NotNumeric(n.to_string()))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ShapeError::NotNumeric(s.clone()))?,
        other => return Err(unexpected("number", other)),
    };

    if n.is_finite() {
        Ok(n)
    } else {
        Err(ShapeError::NotFinite(n.to_string()))
    }
}

/// Naive time-string forms SQLite's date functions accept, read as UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// RFC 3339 first, then the naive forms the store compares with (read as UTC).
/// A bare `YYYY-MM-DD` is midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// Plain `YYYY-MM-DD`, or the calendar date of a timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date_naive()))
}

fn unexpected(expected: &'static str, found: &Value) -> ShapeError {
    ShapeError::UnexpectedType {
        expected,
        found: value_kind(found),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_transaction_happy_path() {
        let parsed = parse_transactions(vec![row(json!({
            "id": "t1",
            "created_at": "2026-10-03T12:00:00.000Z",
            "date_transaction": "2026-10-03",
            "amount": 1500.5,
            "currency": "ARS",
            "category": "Supermercado",
            "merchant": "Coto",
            "is_fixed": 0,
            "is_client_expense": null,
            "installment_current": 2,
            "installment_total": 6,
            "source": "telegram_manual"
        }))]);

        assert!(parsed.issues.is_empty(), "unexpected issues: {:?}", parsed.issues);
        let tx = &parsed.records[0];
        assert_eq!(tx.amount, Some(1500.5));
        assert_eq!(tx.date_transaction, NaiveDate::from_ymd_opt(2026, 10, 3));
        assert_eq!(tx.is_fixed, Some(false));
        assert_eq!(tx.is_client_expense, None);
        assert_eq!(tx.installment_total, Some(6));
    }

    #[test]
    fn test_unparseable_amount_keeps_record() {
        let parsed = parse_transactions(vec![
            row(json!({ "id": "t1", "amount": "abc", "category": "Ocio" })),
            row(json!({ "id": "t2", "amount": " 42.5 " })),
            row(json!({ "id": "t3" })),
        ]);

        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0].amount, None);
        assert_eq!(parsed.records[0].category.as_deref(), Some("Ocio"));
        assert_eq!(parsed.records[1].amount, Some(42.5));
        assert_eq!(parsed.records[2].amount, None);

        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(parsed.issues[0].error, ShapeError::NotNumeric("abc".to_string()));
        assert_eq!(parsed.issues[1].record_id, "t3");
        assert_eq!(parsed.issues[1].error, ShapeError::Missing);
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        assert!(matches!(coerce_number(&json!("NaN")), Err(ShapeError::NotFinite(_))));
        assert!(matches!(coerce_number(&json!("inf")), Err(ShapeError::NotFinite(_))));
        assert!(matches!(
            coerce_number(&json!(true)),
            Err(ShapeError::UnexpectedType { expected: "number", found: "boolean" })
        ));
    }

    #[test]
    fn test_journal_entry_without_timestamp_is_dropped() {
        let parsed = parse_journal_entries(vec![
            row(json!({ "id": "j1", "created_at": "2026-10-11T09:00:00Z", "mood_score": 7 })),
            row(json!({ "id": "j2", "mood_score": 5 })),
            row(json!({ "id": "j3", "created_at": "yesterday", "mood_score": 5 })),
        ]);

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "j1");
        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(
            parsed.issues[1].error,
            ShapeError::InvalidTimestamp("yesterday".to_string())
        );
    }

    #[test]
    fn test_journal_null_mood_stays_null() {
        let parsed = parse_journal_entries(vec![row(json!({
            "id": "j1",
            "created_at": "2026-10-11T09:00:00Z",
            "mood_score": null,
            "sentiment_tags": "[\"anxious\", \"productive\"]",
            "embedding": "[0.1, 0.2]"
        }))]);

        let entry = &parsed.records[0];
        assert_eq!(entry.mood_score, None);
        assert_eq!(
            entry.sentiment_tags,
            Some(vec!["anxious".to_string(), "productive".to_string()])
        );
        // embedding is carried as-is, not decoded
        assert_eq!(entry.embedding, Some(json!("[0.1, 0.2]")));
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_activity_details_decoded_from_text() {
        let parsed = parse_activities(vec![
            row(json!({ "id": 7, "created_at": "2026-10-16 18:30:00", "type": "workout", "details": "{\"sets\": 4}" })),
            row(json!({ "id": "a2", "type": null, "details": "not json" })),
        ]);

        assert_eq!(parsed.records[0].id, "7");
        assert_eq!(parsed.records[0].details.as_ref().unwrap()["sets"], json!(4));
        assert_eq!(
            parsed.records[0].created_at.unwrap().to_rfc3339(),
            "2026-10-16T18:30:00+00:00"
        );

        assert_eq!(parsed.records[1].kind, None);
        assert_eq!(parsed.records[1].details, None);
        assert!(matches!(parsed.issues[0].error, ShapeError::InvalidJson(_)));
    }

    #[test]
    fn test_timestamp_accepts_sqlite_time_strings() {
        let utc = |s: &str| parse_timestamp(s).map(|ts| ts.to_rfc3339());

        assert_eq!(utc("2026-10-15T09:00"), Some("2026-10-15T09:00:00+00:00".to_string()));
        assert_eq!(utc("2026-10-15 09:00"), Some("2026-10-15T09:00:00+00:00".to_string()));
        assert_eq!(utc("2026-10-16"), Some("2026-10-16T00:00:00+00:00".to_string()));
        assert_eq!(utc("2026-10-16 10:00:00.250"), Some("2026-10-16T10:00:00.250+00:00".to_string()));
        assert_eq!(utc("2026-10-16T10:00:00-03:00"), Some("2026-10-16T10:00:00-03:00".to_string()));
        assert_eq!(utc("yesterday"), None);
        assert_eq!(utc("2026-10-16T25:00"), None);
    }

    #[test]
    fn test_journal_entry_with_short_timestamp_is_kept() {
        let parsed = parse_journal_entries(vec![
            row(json!({ "id": "j1", "created_at": "2026-10-15T09:00", "mood_score": 4 })),
            row(json!({ "id": "j2", "created_at": "2026-10-16", "mood_score": 5 })),
        ]);

        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_parse_date_accepts_timestamps() {
        assert_eq!(parse_date("2026-10-05"), NaiveDate::from_ymd_opt(2026, 10, 5));
        assert_eq!(
            parse_date("2026-10-05T23:00:00-03:00"),
            NaiveDate::from_ymd_opt(2026, 10, 5)
        );
        assert_eq!(parse_date("05/10/2026"), None);
    }
}
