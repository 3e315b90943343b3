// src/subscribe.rs
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::NaiveTime;
use lettre::Address;

use crate::clock::{ClockJob, DailyClock};
use crate::notify::MailDispatcher;

pub const CONFIRMATION_SUBJECT: &str = "News Subscription Test";

/// The single subscriber. Starts empty/inactive; activates at most once per
/// process lifetime. Not persisted across restarts.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionState {
    pub recipient: String,
    pub active: bool,
}

#[derive(Debug)]
pub enum SubscribeError {
    /// Address empty or unparsable; nothing was sent.
    InvalidAddress(String),
    /// Confirmation send failed; subscription stays inactive and editable.
    DispatchFailed(String),
}

impl fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscribeError::InvalidAddress(msg) => write!(f, "invalid address: {msg}"),
            SubscribeError::DispatchFailed(msg) => {
                write!(f, "confirmation send failed: {msg}")
            }
        }
    }
}

impl std::error::Error for SubscribeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Confirmation sent; daily digest armed. Caller should freeze the
    /// subscription input.
    Activated,
    /// Already active; nothing sent.
    AlreadyActive,
}

/// Validates an entered address, sends the confirmation message, and on
/// success activates the state and registers the digest job with the clock.
pub struct SubscriptionController {
    state: Arc<Mutex<SubscriptionState>>,
    dispatcher: Arc<dyn MailDispatcher>,
    clock: Arc<DailyClock>,
    digest: Arc<dyn ClockJob>,
    fire_time: NaiveTime,
}

impl SubscriptionController {
    pub fn new(
        state: Arc<Mutex<SubscriptionState>>,
        dispatcher: Arc<dyn MailDispatcher>,
        clock: Arc<DailyClock>,
        digest: Arc<dyn ClockJob>,
        fire_time: NaiveTime,
    ) -> Self {
        Self {
            state,
            dispatcher,
            clock,
            digest,
            fire_time,
        }
    }

    pub fn fire_time(&self) -> NaiveTime {
        self.fire_time
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
            .lock()
            .expect("subscription mutex poisoned")
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    pub async fn subscribe(&self, raw: &str) -> Result<SubscribeOutcome, SubscribeError> {
        if self.is_active() {
            return Ok(SubscribeOutcome::AlreadyActive);
        }

        let address = raw.trim();
        if address.is_empty() {
            return Err(SubscribeError::InvalidAddress("address is empty".into()));
        }
        if let Err(e) = address.parse::<Address>() {
            return Err(SubscribeError::InvalidAddress(e.to_string()));
        }

        let body = format!(
            "Thank you for subscribing to our daily news service! \
             You will receive your first news update tomorrow at {}.",
            self.fire_time.format("%H:%M")
        );
        if let Err(e) = self
            .dispatcher
            .send(CONFIRMATION_SUBJECT, &body, address)
            .await
        {
            tracing::warn!(error = ?e, "confirmation send failed");
            return Err(SubscribeError::DispatchFailed(format!("{e:#}")));
        }

        {
            let mut state = self.state.lock().expect("subscription mutex poisoned");
            if state.active {
                return Ok(SubscribeOutcome::AlreadyActive);
            }
            state.recipient = address.to_string();
            state.active = true;
        }

        if self.clock.register(self.fire_time, Arc::clone(&self.digest)) {
            tracing::info!(
                recipient = address,
                fire_time = %self.fire_time.format("%H:%M"),
                "daily digest activated"
            );
        }
        Ok(SubscribeOutcome::Activated)
    }
}
