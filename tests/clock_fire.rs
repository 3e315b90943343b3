// tests/clock_fire.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use daily_news_digest::clock::{ClockJob, DailyClock};

#[derive(Default)]
struct CountingJob {
    fired: AtomicUsize,
}

#[async_trait::async_trait]
impl ClockJob for CountingJob {
    async fn run(&self) -> Result<()> {
        self.fired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

struct FailingJob;

#[async_trait::async_trait]
impl ClockJob for FailingJob {
    async fn run(&self) -> Result<()> {
        anyhow::bail!("boom")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn eight() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn fires_once_per_day_at_the_fire_window() {
    let clock = DailyClock::new();
    let job = Arc::new(CountingJob::default());
    assert!(clock.register_at(eight(), job.clone(), at(1, 7, 0)));

    assert!(!clock.poll_at(at(1, 7, 59)).await);
    assert!(clock.poll_at(at(1, 8, 0)).await);
    assert!(!clock.poll_at(at(1, 8, 1)).await);
    assert!(clock.poll_at(at(2, 8, 0)).await);

    assert_eq!(job.fired.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn many_polls_within_the_window_fire_once() {
    let clock = DailyClock::new();
    let job = Arc::new(CountingJob::default());
    assert!(clock.register_at(eight(), job.clone(), at(1, 0, 0)));

    for minute in 0..30 {
        clock.poll_at(at(1, 8, minute)).await;
    }
    assert_eq!(job.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn registration_after_fire_time_waits_for_tomorrow() {
    let clock = DailyClock::new();
    let job = Arc::new(CountingJob::default());
    // Registered at 09:00, past today's 08:00: no same-day catch-up.
    assert!(clock.register_at(eight(), job.clone(), at(1, 9, 0)));

    assert!(!clock.poll_at(at(1, 9, 1)).await);
    assert!(!clock.poll_at(at(1, 23, 59)).await);
    assert!(clock.poll_at(at(2, 8, 0)).await);
    assert_eq!(job.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn the_registry_holds_exactly_one_job() {
    let clock = DailyClock::new();
    let first = Arc::new(CountingJob::default());
    let second = Arc::new(CountingJob::default());

    assert!(clock.register_at(eight(), first.clone(), at(1, 7, 0)));
    assert!(!clock.register_at(eight(), second.clone(), at(1, 7, 0)));
    assert!(clock.registered());
    assert_eq!(clock.fire_time(), Some(eight()));

    clock.poll_at(at(1, 8, 0)).await;
    assert_eq!(first.fired.load(Ordering::SeqCst), 1);
    assert_eq!(second.fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_failing_job_does_not_break_the_clock() {
    let clock = DailyClock::new();
    assert!(clock.register_at(eight(), Arc::new(FailingJob), at(1, 7, 0)));

    // The failure is swallowed and logged; the entry still advances a day.
    assert!(clock.poll_at(at(1, 8, 0)).await);
    assert!(!clock.poll_at(at(1, 8, 1)).await);
    assert!(clock.poll_at(at(2, 8, 0)).await);
}
