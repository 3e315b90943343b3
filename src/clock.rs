// src/clock.rs
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A job the Daily Clock can fire. Failures are logged by the poller and
/// never break the polling loop.
#[async_trait::async_trait]
pub trait ClockJob: Send + Sync {
    async fn run(&self) -> Result<()>;
    fn name(&self) -> &'static str;
}

struct ScheduledJob {
    fire_time: NaiveTime,
    next_fire: NaiveDateTime,
    job: Arc<dyn ClockJob>,
}

/// Process-wide scheduled-job registry. Holds at most one entry; the entry
/// fires once per calendar day when local time passes its fire time and is
/// never removed.
pub struct DailyClock {
    slot: Mutex<Option<ScheduledJob>>,
}

impl DailyClock {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store the single job. Registration after today's fire time schedules
    /// the first fire for tomorrow; there is no same-day catch-up. Returns
    /// false (and changes nothing) when a job is already registered.
    pub fn register(&self, fire_time: NaiveTime, job: Arc<dyn ClockJob>) -> bool {
        self.register_at(fire_time, job, Local::now().naive_local())
    }

    pub fn register_at(
        &self,
        fire_time: NaiveTime,
        job: Arc<dyn ClockJob>,
        now: NaiveDateTime,
    ) -> bool {
        let mut slot = self.slot.lock().expect("clock mutex poisoned");
        if slot.is_some() {
            return false;
        }
        let mut next_fire = now.date().and_time(fire_time);
        if next_fire <= now {
            next_fire = next_fire + Duration::days(1);
        }
        *slot = Some(ScheduledJob {
            fire_time,
            next_fire,
            job,
        });
        true
    }

    pub fn registered(&self) -> bool {
        self.slot.lock().expect("clock mutex poisoned").is_some()
    }

    pub fn fire_time(&self) -> Option<NaiveTime> {
        self.slot
            .lock()
            .expect("clock mutex poisoned")
            .as_ref()
            .map(|entry| entry.fire_time)
    }

    /// Take the job if the entry is due at `now`, advancing the entry past
    /// `now` so one wall-clock day fires at most once.
    fn due_at(&self, now: NaiveDateTime) -> Option<Arc<dyn ClockJob>> {
        let mut slot = self.slot.lock().expect("clock mutex poisoned");
        let entry = slot.as_mut()?;
        if now < entry.next_fire {
            return None;
        }
        let mut next = entry.next_fire + Duration::days(1);
        while next <= now {
            next = next + Duration::days(1);
        }
        entry.next_fire = next;
        Some(Arc::clone(&entry.job))
    }

    /// One polling tick against the given wall-clock instant. Returns true
    /// when the job fired (regardless of its outcome).
    pub async fn poll_at(&self, now: NaiveDateTime) -> bool {
        let Some(job) = self.due_at(now) else {
            return false;
        };
        if let Err(e) = job.run().await {
            tracing::warn!(error = ?e, job = job.name(), "scheduled job failed");
        }
        true
    }

    /// Spawn the polling task: tick every `poll_secs`, fire due entries,
    /// exit when `shutdown` flips true (or its sender goes away).
    pub fn spawn_poller(
        self: Arc<Self>,
        poll_secs: u64,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(poll_secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll_at(Local::now().naive_local()).await;
                    }
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            tracing::debug!("clock poller stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl Default for DailyClock {
    fn default() -> Self {
        Self::new()
    }
}
