/**
 * Pipeline Dashboard - Headless Runner
 *
 * Loads configuration, starts the dashboard orchestrator and logs a summary
 * every time the data changes. Pass `--sync-now` to run one manual sync
 * before polling starts. Ctrl-C stops polling and exits.
 */
use std::sync::Arc;

use pipeline_dashboard::dashboard::{Config, DashboardEvent, DashboardOrchestrator, DashboardView};
use pipeline_dashboard::metrics::BucketKey;
use pipeline_dashboard::shared::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let sync_now = std::env::args().skip(1).any(|arg| arg == "--sync-now");

    let config = Config::load(AppConfig::default_path().as_deref())?;
    tracing::info!(
        "Dashboard API at {} (polling every {:?}, enabled: {})",
        config.api_base_url(),
        config.poll_interval(),
        config.polling_enabled()
    );

    let dashboard = DashboardOrchestrator::from_config(config)?;
    let mut events = dashboard.subscribe();

    if sync_now {
        match dashboard.sync_now().await {
            Ok(outcome) => tracing::info!("Manual sync landed {} records", outcome.records_synced),
            Err(e) => tracing::error!("Manual sync failed: {}", e.user_message()),
        }
    }

    let view = dashboard.start().await;
    log_summary(&view);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(DashboardEvent::DataChanged(view)) => log_summary(&view),
                Ok(DashboardEvent::SyncStateChanged(state)) => {
                    tracing::debug!("Sync {}", state.phase);
                    if let Some(error) = state.last_error.as_deref() {
                        tracing::warn!("Sync error: {}", error);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Skipped {} dashboard events", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    dashboard.shutdown();
    Ok(())
}

fn log_summary(view: &Arc<DashboardView>) {
    let funnel = &view.funnel.value;
    tracing::info!(
        "Funnel India: MQL {} → SQL {} → Deals {} ({:.1}% overall, {:?})",
        funnel.india.mql,
        funnel.india.sql,
        funnel.india.deals,
        funnel.india.overall,
        funnel.india.overall_band()
    );
    tracing::info!(
        "Funnel US: MQL {} → SQL {} → Deals {} ({:.1}% overall, {:?})",
        funnel.us.mql,
        funnel.us.sql,
        funnel.us.deals,
        funnel.us.overall,
        funnel.us.overall_band()
    );

    for key in BucketKey::ALL {
        let Some(table) = view.bucket(key) else {
            continue;
        };
        if table.is_empty() {
            tracing::info!("No {} data available", key);
            continue;
        }
        let latest = table
            .totals_growth
            .latest()
            .map(|g| format!("{:+.2}%", g))
            .unwrap_or_else(|| "n/a".to_string());
        tracing::info!(
            "{}: {} total across {} channels, latest growth {}",
            key,
            table.grand_total,
            table.rows.len(),
            latest
        );
    }

    let fallbacks = view.fallback_views();
    if !fallbacks.is_empty() {
        tracing::warn!("Showing last known data for {:?}", fallbacks);
    }
}
