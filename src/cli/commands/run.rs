use crate::bot::api::TelegramApi;
use crate::bot::handlers::Handler;
use crate::bot::notifier::TelegramNotifier;
use crate::bot::run_polling;
use crate::cli::commands::open_registry;
use crate::config::Config;
use crate::core::clock::SystemClock;
use crate::core::scheduler::Scheduler;
use crate::errors::AppResult;
use crate::logging::init_logging;
use crate::utils::time::parse_offset;
use chrono::Duration;
use std::fs;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Handle the `run` command: migrate every list, then start the scheduler
/// and the Telegram polling loop until Ctrl-C / SIGTERM.
pub async fn handle(cfg: &Config) -> AppResult<()> {
    init_logging(&cfg.log_level);

    let tz = parse_offset(&cfg.timezone)?;
    let registry = Arc::new(open_registry(cfg));
    fs::create_dir_all(registry.root())?;

    // Every list must be on the latest schema before the first scan.
    let summary = registry.migrate_all()?;
    info!(
        stores = summary.stores,
        migrated = summary.migrated,
        failed = summary.failed,
        "lists migrated"
    );

    let api = Arc::new(TelegramApi::new(
        &cfg.api_base_url,
        &cfg.bot_token,
        cfg.poll_timeout_secs,
    )?);
    let clock = Arc::new(SystemClock);

    let notifier = Arc::new(TelegramNotifier::new(api.clone(), tz));
    let scheduler = Scheduler::new(registry.clone(), notifier, clock.clone())
        .with_repeat_interval(Duration::seconds(cfg.repeat_interval_secs));
    let handler = Arc::new(Handler::new(registry, clock, tz));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_rx = shutdown_rx.clone();
    let scheduler_task = tokio::spawn(async move { scheduler.run(scheduler_rx).await });
    let polling_task = tokio::spawn(run_polling(api, handler, shutdown_rx));

    info!(data_dir = %cfg.data_path().display(), "rreminder running, press Ctrl-C to stop");
    shutdown_signal().await;
    info!("shutdown requested");

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }
    if let Err(e) = polling_task.await {
        warn!(error = %e, "polling task ended abnormally");
    }

    Ok(())
}
