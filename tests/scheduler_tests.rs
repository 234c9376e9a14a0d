use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rreminder::core::clock::{Clock, ManualClock};
use rreminder::core::notifier::{Notifier, Reminder};
use rreminder::core::scheduler::{Scheduler, next_minute_boundary, pending_reminders};
use rreminder::core::source::ReminderSource;
use rreminder::errors::{AppError, AppResult};
use rreminder::models::Task;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

mod common;
use common::{at, registry_with_store};

/// In-memory stand-in for the on-disk registry.
#[derive(Default)]
struct FakeSource {
    stores: Mutex<BTreeMap<(i64, String), Vec<Task>>>,
    broken: Mutex<HashSet<(i64, String)>>,
}

impl FakeSource {
    fn add(&self, user_id: i64, store: &str, id: i64, text: &str, due_at: DateTime<Utc>) {
        let mut task = Task::new(text, due_at, due_at);
        task.id = id;
        self.stores
            .lock()
            .unwrap()
            .entry((user_id, store.to_string()))
            .or_default()
            .push(task);
    }

    fn break_store(&self, user_id: i64, store: &str) {
        self.broken
            .lock()
            .unwrap()
            .insert((user_id, store.to_string()));
    }

    fn confirm(&self, user_id: i64, store: &str, id: i64) {
        let mut stores = self.stores.lock().unwrap();
        let tasks = stores.get_mut(&(user_id, store.to_string())).unwrap();
        tasks.iter_mut().find(|t| t.id == id).unwrap().confirmed = true;
    }

    fn task(&self, user_id: i64, store: &str, id: i64) -> Task {
        let stores = self.stores.lock().unwrap();
        stores[&(user_id, store.to_string())]
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap()
    }
}

impl ReminderSource for FakeSource {
    fn users(&self) -> AppResult<Vec<i64>> {
        let stores = self.stores.lock().unwrap();
        let mut users: Vec<i64> = stores.keys().map(|(u, _)| *u).collect();
        users.dedup();
        Ok(users)
    }

    fn stores(&self, user_id: i64) -> AppResult<Vec<String>> {
        let stores = self.stores.lock().unwrap();
        Ok(stores
            .keys()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn due_tasks(&self, user_id: i64, store: &str, now: DateTime<Utc>) -> AppResult<Vec<Task>> {
        if self
            .broken
            .lock()
            .unwrap()
            .contains(&(user_id, store.to_string()))
        {
            return Err(AppError::Other("corrupted list".into()));
        }
        let stores = self.stores.lock().unwrap();
        Ok(stores
            .get(&(user_id, store.to_string()))
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !t.confirmed && t.due_at <= now)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn mark_notified(
        &self,
        user_id: i64,
        store: &str,
        task_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut stores = self.stores.lock().unwrap();
        if let Some(task) = stores
            .get_mut(&(user_id, store.to_string()))
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
        {
            task.last_notified_at = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(i64, Reminder)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(i64, Reminder)> {
        self.sent.lock().unwrap().clone()
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reminder(&self, user_id: i64, reminder: &Reminder) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Delivery("chat unreachable".into()));
        }
        self.sent.lock().unwrap().push((user_id, reminder.clone()));
        Ok(())
    }
}

fn setup(
    start: DateTime<Utc>,
) -> (
    Arc<FakeSource>,
    Arc<RecordingNotifier>,
    Arc<ManualClock>,
    Scheduler<FakeSource, RecordingNotifier, ManualClock>,
) {
    let source = Arc::new(FakeSource::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(start));
    let scheduler = Scheduler::new(source.clone(), notifier.clone(), clock.clone());
    (source, notifier, clock, scheduler)
}

#[tokio::test]
async fn test_future_task_is_not_sent() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, _clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "later", t0 + Duration::minutes(5));

    let report = scheduler.scan_once().await;
    assert_eq!(report.users, 1);
    assert_eq!(report.stores, 1);
    assert_eq!(report.due, 0);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_due_task_is_sent_with_confirm_token() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, _clock, scheduler) = setup(t0);
    source.add(42, "work", 9, "stand-up", t0);

    let report = scheduler.scan_once().await;
    assert_eq!(report.notified, 1);

    let sent = notifier.sent();
    assert_eq!(sent[0].0, 42);
    assert_eq!(sent[0].1.text, "stand-up");
    assert_eq!(sent[0].1.confirm_token, "ok:work:9");
    assert_eq!(source.task(42, "work", 9).last_notified_at, Some(t0));
}

#[tokio::test]
async fn test_confirmed_task_is_never_sent() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "done already", t0 - Duration::hours(1));
    source.confirm(1, "work", 1);

    scheduler.scan_once().await;
    clock.advance(Duration::minutes(10));
    scheduler.scan_once().await;

    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_reminder_repeats_every_interval_until_confirmed() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "water plants", t0 - Duration::minutes(1));

    assert_eq!(scheduler.scan_once().await.notified, 1);

    clock.advance(Duration::seconds(60));
    let report = scheduler.scan_once().await;
    assert_eq!(report.notified, 0);
    assert_eq!(report.throttled, 1);

    clock.advance(Duration::seconds(60));
    assert_eq!(scheduler.scan_once().await.notified, 1);
    assert_eq!(notifier.count(), 2);

    source.confirm(1, "work", 1);
    clock.advance(Duration::seconds(120));
    assert_eq!(scheduler.scan_once().await.notified, 0);
    assert_eq!(notifier.count(), 2);
}

#[tokio::test]
async fn test_custom_repeat_interval() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, clock, scheduler) = setup(t0);
    let scheduler = scheduler.with_repeat_interval(Duration::seconds(30));
    assert_eq!(scheduler.repeat_interval(), Duration::seconds(30));
    source.add(1, "work", 1, "quick", t0);

    scheduler.scan_once().await;
    clock.advance(Duration::seconds(30));
    scheduler.scan_once().await;

    assert_eq!(notifier.count(), 2);
}

#[tokio::test]
async fn test_failed_delivery_keeps_task_eligible() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, _clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "retry me", t0);

    notifier.fail.store(true, Ordering::SeqCst);
    let report = scheduler.scan_once().await;
    assert_eq!(report.failures, 1);
    assert_eq!(report.notified, 0);
    assert!(source.task(1, "work", 1).last_notified_at.is_none());

    // no throttle applies after a failed send
    notifier.fail.store(false, Ordering::SeqCst);
    assert_eq!(scheduler.scan_once().await.notified, 1);
}

#[tokio::test]
async fn test_broken_store_does_not_stop_the_scan() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, _clock, scheduler) = setup(t0);
    source.add(1, "broken", 1, "lost", t0);
    source.add(1, "fine", 1, "delivered", t0);
    source.add(2, "other", 1, "also delivered", t0);
    source.break_store(1, "broken");

    let report = scheduler.scan_once().await;
    assert_eq!(report.failures, 1);
    assert_eq!(report.notified, 2);

    let texts: Vec<String> = notifier.sent().into_iter().map(|(_, r)| r.text).collect();
    assert!(texts.contains(&"delivered".to_string()));
    assert!(texts.contains(&"also delivered".to_string()));
}

#[tokio::test]
async fn test_pending_reminders_does_not_send() {
    let t0 = at(2026, 3, 1, 10, 0);
    let (source, notifier, _clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "a", t0);
    source.add(1, "work", 2, "b", t0 + Duration::hours(1));

    let pending = scheduler.pending_reminders(t0);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].1.task_id, 1);
    assert_eq!(notifier.count(), 0);
    assert!(source.task(1, "work", 1).last_notified_at.is_none());
}

#[test]
fn test_next_minute_boundary() {
    let t = at(2026, 3, 1, 10, 0) + Duration::seconds(17);
    assert_eq!(next_minute_boundary(t), at(2026, 3, 1, 10, 1));

    let exact = at(2026, 3, 1, 10, 59);
    assert_eq!(next_minute_boundary(exact), at(2026, 3, 1, 11, 0));
}

#[tokio::test]
async fn test_run_loop_scans_each_minute_and_stops() {
    let t0 = at(2026, 3, 1, 10, 0) + Duration::seconds(30);
    let (source, notifier, clock, scheduler) = setup(t0);
    source.add(1, "work", 1, "loop", t0 - Duration::minutes(1));

    let scheduler = Arc::new(scheduler);
    let (tx, rx) = watch::channel(false);
    let handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(rx).await })
    };

    while clock.sleeps() < 3 {
        tokio::task::yield_now().await;
    }
    tx.send(true).unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("scheduler stops after shutdown")
        .unwrap();

    // sleeps land on minute boundaries
    assert_eq!(clock.now().timestamp() % 60, 0);
    assert!(notifier.count() >= 1);
}

#[tokio::test]
async fn test_registry_end_to_end() {
    let (_dir, reg) = registry_with_store(7, "tasks1");
    let t0 = at(2026, 3, 1, 10, 0);
    let id = reg
        .add_task(7, "tasks1", "wakeup", t0 - Duration::seconds(1))
        .unwrap();
    reg.add_task(7, "tasks1", "tomorrow", t0 + Duration::days(1))
        .unwrap();

    let reg = Arc::new(reg);
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(t0));
    let scheduler = Scheduler::new(reg.clone(), notifier.clone(), clock.clone());

    assert_eq!(pending_reminders(reg.as_ref(), t0, Duration::seconds(120)).len(), 1);

    assert_eq!(scheduler.scan_once().await.notified, 1);
    assert_eq!(notifier.sent()[0].1.confirm_token, format!("ok:tasks1:{id}"));
    assert_eq!(reg.get_task(7, "tasks1", id).unwrap().last_notified_at, Some(t0));

    clock.advance(Duration::seconds(60));
    assert_eq!(scheduler.scan_once().await.notified, 0);

    clock.advance(Duration::seconds(60));
    assert_eq!(scheduler.scan_once().await.notified, 1);
    assert_eq!(
        reg.get_task(7, "tasks1", id).unwrap().last_notified_at,
        Some(t0 + Duration::seconds(120))
    );

    assert!(reg.confirm_task(7, "tasks1", id).unwrap());
    clock.advance(Duration::seconds(240));
    assert_eq!(scheduler.scan_once().await.notified, 0);
    assert_eq!(notifier.count(), 2);

    // a deleted list simply disappears from the next scan
    reg.delete_store(7, "tasks1").unwrap();
    let report = scheduler.scan_once().await;
    assert_eq!(report.stores, 0);
    assert_eq!(report.failures, 0);
}
