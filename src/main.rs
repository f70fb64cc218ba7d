// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use life_os_dashboard::{init_tracing, Dashboard, DashboardConfig, DashboardView, SqliteStore};
use std::env;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = DashboardConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    let runtime = Runtime::new().context("failed to start async runtime")?;
    let dashboard = Dashboard::open(&config)?;

    match args.get(1).map(String::as_str) {
        Some("json") => run_json(&runtime, &dashboard),
        Some("view") => run_view(&runtime, &dashboard, config.recent_transactions),
        Some("tui") | None => run_ui_mode(&runtime, &dashboard, config.recent_transactions),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: life-os-dashboard [json|view|tui]");
            std::process::exit(2);
        }
    }
}

/// Print the raw bundle, as the dashboard page receives it.
fn run_json(runtime: &Runtime, dashboard: &Dashboard<SqliteStore>) -> Result<()> {
    let data = runtime.block_on(dashboard.load_now());
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Print the bundle after presentation rules.
fn run_view(runtime: &Runtime, dashboard: &Dashboard<SqliteStore>, recent: usize) -> Result<()> {
    let data = runtime.block_on(dashboard.load_now());
    let view = DashboardView::from_data(&data, recent);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(runtime: &Runtime, dashboard: &Dashboard<SqliteStore>, recent: usize) -> Result<()> {
    let data = runtime.block_on(dashboard.load_now());

    let mut app = ui::App::new(data, recent);
    ui::run_ui(&mut app, || runtime.block_on(dashboard.load_now()))
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_runtime: &Runtime, _dashboard: &Dashboard<SqliteStore>, _recent: usize) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print the bundle: life-os-dashboard json");
    std::process::exit(1);
}
