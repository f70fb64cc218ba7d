// Life OS Dashboard - Core Library
// Exposes the dashboard pipeline for the CLI, the API server, and tests

pub mod aggregate;
pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod presentation;
pub mod records;
pub mod store;
pub mod window;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use aggregate::{CategorySlice, MoodPoint, MoodPolicy, UNCATEGORIZED};
pub use analytics::BurnRate;
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardData};
pub use db::{setup_database, SqliteStore};
pub use error::{ConfigError, ShapeError, ShapeIssue, StoreError};
pub use fetch::{FetchedRecords, RecordFetcher};
pub use presentation::{DashboardView, Section};
pub use records::{Activity, JournalEntry, Transaction};
pub use store::{Collection, Query, RawRecord, RecordStore};
pub use window::{MonthWindow, TimeWindows};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// Logs go to stderr so they never interleave with JSON on stdout or the
/// terminal UI. Calling this twice is a no-op.
pub fn init_tracing(log_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .try_init();
}
