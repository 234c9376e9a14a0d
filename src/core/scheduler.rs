//! Reminder scheduler: the background loop that scans every list of every
//! user, sends reminders for due unconfirmed tasks and repeats them every
//! `repeat_interval` until the task is confirmed.
//!
//! ```text
//! PENDING ──due_at reached──▶ DUE ──sent──▶ NOTIFIED ──confirm──▶ CONFIRMED
//!                                             │  ▲
//!                                             └──┘ every repeat_interval
//! ```
//!
//! One scan reads `now` once and uses it for every comparison of the pass.
//! Any failure (listing, querying, sending, bookkeeping) is logged and
//! counted; the pass continues and the loop never stops on its own.

use crate::core::clock::Clock;
use crate::core::notifier::{Notifier, Reminder};
use crate::core::source::ReminderSource;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, DurationRound, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_REPEAT_SECS: i64 = 120;

/// Counters for one scan cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub users: usize,
    pub stores: usize,
    pub due: usize,
    pub notified: usize,
    pub throttled: usize,
    pub failures: usize,
}

/// Top of the minute strictly after `now`.
pub fn next_minute_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let minute = Duration::minutes(1);
    now.duration_trunc(minute).unwrap_or(now) + minute
}

/// Reminders a scan at `now` would send, without sending anything or touching
/// the stores. Unreadable users/lists are skipped.
pub fn pending_reminders<S: ReminderSource + ?Sized>(
    source: &S,
    now: DateTime<Utc>,
    repeat: Duration,
) -> Vec<(i64, Reminder)> {
    let mut out = Vec::new();
    let Ok(users) = source.users() else {
        return out;
    };

    for user_id in users {
        let Ok(stores) = source.stores(user_id) else {
            continue;
        };
        for store in stores {
            let Ok(tasks) = source.due_tasks(user_id, &store, now) else {
                continue;
            };
            out.extend(
                tasks
                    .iter()
                    .filter(|t| t.needs_notification(now, repeat))
                    .map(|t| (user_id, Reminder::for_task(&store, t))),
            );
        }
    }
    out
}

pub struct Scheduler<S, N, C> {
    source: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    repeat_interval: Duration,
}

impl<S, N, C> Scheduler<S, N, C>
where
    S: ReminderSource + 'static,
    N: Notifier,
    C: Clock,
{
    pub fn new(source: Arc<S>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            source,
            notifier,
            clock,
            repeat_interval: Duration::seconds(DEFAULT_REPEAT_SECS),
        }
    }

    pub fn with_repeat_interval(mut self, interval: Duration) -> Self {
        self.repeat_interval = interval;
        self
    }

    pub fn repeat_interval(&self) -> Duration {
        self.repeat_interval
    }

    /// Collect the reminders a scan at `now` would send, without sending.
    pub fn pending_reminders(&self, now: DateTime<Utc>) -> Vec<(i64, Reminder)> {
        pending_reminders(self.source.as_ref(), now, self.repeat_interval)
    }

    /// Run a storage call on the blocking pool; SQLite access and the
    /// per-list locks must not stall the runtime workers.
    async fn blocking<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&S) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || f(source.as_ref()))
            .await
            .map_err(|e| AppError::Other(format!("storage task failed: {}", e)))?
    }

    /// One full pass over all users and lists.
    pub async fn scan_once(&self) -> ScanReport {
        let now = self.clock.now();
        let mut report = ScanReport::default();

        let users = match self.blocking(|s| s.users()).await {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "scan: cannot list users");
                report.failures += 1;
                return report;
            }
        };

        for user_id in users {
            report.users += 1;

            let stores = match self.blocking(move |s| s.stores(user_id)).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(user_id, error = %e, "scan: cannot list stores");
                    report.failures += 1;
                    continue;
                }
            };

            for store in stores {
                report.stores += 1;
                self.scan_store(user_id, &store, now, &mut report).await;
            }
        }

        report
    }

    async fn scan_store(
        &self,
        user_id: i64,
        store: &str,
        now: DateTime<Utc>,
        report: &mut ScanReport,
    ) {
        let owned = store.to_string();
        let tasks = match self
            .blocking(move |s| s.due_tasks(user_id, &owned, now))
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!(user_id, store, error = %e, "scan: due query failed");
                report.failures += 1;
                return;
            }
        };

        for task in tasks {
            if !task.is_due(now) {
                continue;
            }
            report.due += 1;

            if !task.needs_notification(now, self.repeat_interval) {
                report.throttled += 1;
                continue;
            }

            let reminder = Reminder::for_task(store, &task);
            if let Err(e) = self.notifier.send_reminder(user_id, &reminder).await {
                warn!(user_id, store, task_id = task.id, error = %e, "reminder not delivered");
                report.failures += 1;
                continue;
            }

            let owned = store.to_string();
            let task_id = task.id;
            match self
                .blocking(move |s| s.mark_notified(user_id, &owned, task_id, now))
                .await
            {
                Ok(()) => {
                    debug!(user_id, store, task_id = task.id, "reminder sent");
                    report.notified += 1;
                }
                Err(e) => {
                    // Sent but not recorded: the task will be re-sent next cycle.
                    warn!(user_id, store, task_id = task.id, error = %e, "cannot record reminder");
                    report.failures += 1;
                }
            }
        }
    }

    /// Scan now, then at every minute boundary until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            repeat_secs = self.repeat_interval.num_seconds(),
            "reminder scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.scan_once().await;
            if report.notified > 0 || report.failures > 0 {
                info!(?report, "scan cycle finished");
            } else {
                debug!(?report, "scan cycle finished");
            }

            let next = next_minute_boundary(self.clock.now());
            tokio::select! {
                _ = self.clock.sleep_until(next) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("reminder scheduler stopped");
    }
}
