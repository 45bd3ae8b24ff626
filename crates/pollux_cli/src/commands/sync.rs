use std::sync::Arc;
use std::time::Duration;

use pollux::sync::SyncScheduler;

use crate::commands::shared::{CliResult, build_syncers};
use crate::config::Config;
use crate::progress::LoggingReporter;
use crate::shutdown::shutdown_signal;

/// Run one cycle for every configured platform (or just `platform`).
pub(crate) async fn handle_sync(
    platform: Option<String>,
    config: &Config,
    database_url: &str,
) -> CliResult<()> {
    let db = Arc::new(pollux::connect_and_migrate(database_url).await?);
    let syncers = build_syncers(&db, config, platform.as_deref())?;

    let scheduler = SyncScheduler::new(syncers, config.sync_interval())
        .with_progress(LoggingReporter::new().into_callback());
    let outcomes = scheduler.sync_all_once().await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) if report.not_modified => {
                println!("{}: no changes", outcome.platform);
            }
            Ok(report) => {
                let checkpoint = report
                    .checkpoint
                    .map(|c| c.to_rfc3339())
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "{}: {} new event(s), {} skipped, checkpoint {}",
                    outcome.platform,
                    report.inserted,
                    report.skipped(),
                    checkpoint
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: sync failed: {}", outcome.platform, e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} platform(s) failed", failed, outcomes.len()).into());
    }
    Ok(())
}

/// Run the scheduler until Ctrl+C.
pub(crate) async fn handle_run(
    interval_secs: Option<u64>,
    config: &Config,
    database_url: &str,
) -> CliResult<()> {
    let db = Arc::new(pollux::connect_and_migrate(database_url).await?);
    let syncers = build_syncers(&db, config, None)?;

    let interval = interval_secs
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.sync_interval());

    let scheduler =
        SyncScheduler::new(syncers, interval).with_progress(LoggingReporter::new().into_callback());

    tracing::info!(
        platforms = ?scheduler.platforms(),
        interval_secs = interval.as_secs(),
        "Starting scheduler"
    );

    let stats = scheduler.run(shutdown_signal()).await;

    for platform in &stats {
        tracing::info!(
            platform = %platform.platform,
            cycles = platform.cycles,
            failures = platform.failures,
            inserted = platform.inserted,
            cancelled = platform.cancelled,
            "Platform task stopped"
        );
    }
    Ok(())
}
