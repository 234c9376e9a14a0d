//! Time source for the scheduler.
//!
//! [`SystemClock`] reads the wall clock and sleeps on the tokio timer.
//! [`ManualClock`] keeps simulated time: `sleep_until` jumps straight to the
//! deadline, so loops can be driven without real waiting.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Suspend until `deadline` (returns immediately if it already passed).
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<usize>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(0),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = t;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// How many times `sleep_until` was awaited.
    pub fn sleeps(&self) -> usize {
        *self.sleeps.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        {
            let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
            if deadline > *now {
                *now = deadline;
            }
            *self.sleeps.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        }
        tokio::task::yield_now().await;
    }
}
