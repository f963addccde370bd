use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use lenscare::core::{Clock, Config, SystemClock};
use lenscare::features::lenses::LensService;
use lenscare::features::reminders::ReminderScheduler;
use lenscare::notifications::SqliteNotificationCenter;
use lenscare::store::SqliteStore;

/// Periodically fill reminder gaps and deliver whatever is due
async fn run(
    service: Arc<LensService>,
    center: Arc<SqliteNotificationCenter>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        if let Err(e) = service.refresh_reminders().await {
            error!("Reminder refresh failed: {}", e);
        }

        match center.take_due(clock.now()).await {
            Ok(due) => {
                for notification in due {
                    info!(
                        "🔔 [{}] {}: {}",
                        notification.identifier, notification.title, notification.body
                    );
                }
            }
            Err(e) => error!("Failed to read due notifications: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting lenscare reminder daemon...");

    let store = Arc::new(SqliteStore::open(&config.database_path)?);
    let center = Arc::new(SqliteNotificationCenter::open(&config.database_path)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scheduler = ReminderScheduler::new(center.clone(), config.reminder_settings());
    let service = Arc::new(LensService::new(store, scheduler, clock.clone()));

    for status in service.dashboard().await? {
        info!(
            "{}{}: {} day(s) left, changes {} ({})",
            status.name,
            if status.is_wearing { " (wearing)" } else { "" },
            status.remaining_days,
            status.change_date,
            status.used_period
        );
    }

    let report = service.reconcile_all().await?;
    info!("Scheduled {} reminders at startup", report.scheduled);

    let interval = Duration::from_secs(config.refresh_interval_secs);
    let handle = tokio::spawn(run(service, center, clock, interval));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.abort();

    Ok(())
}
