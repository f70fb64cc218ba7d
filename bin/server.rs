// Life OS Dashboard - Web Server
// REST API over the dashboard pipeline with Axum

use anyhow::{Context, Result};
use life_os_dashboard::api::{router, AppState};
use life_os_dashboard::{init_tracing, Dashboard, DashboardConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = DashboardConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    info!(
        database = %config.database_path.display(),
        timezone = %config.timezone,
        "starting life-os server"
    );

    let dashboard = Dashboard::open(&config)?;
    let app = router(AppState::new(dashboard, config.recent_transactions));

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;

    info!(addr = %config.server_addr, "listening");
    println!("Life OS server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/dashboard", config.server_addr);
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
