// File: ./src/reminder/sink.rs
//! The boundary between the scheduling core and whatever actually wakes the
//! device up: the desktop actor in `system`, the Android host through
//! `mobile`, or a recording fake in tests.
use super::id::ReminderId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data carried by an exact reminder. `start` is the local showtime (`HH:MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactPayload {
    pub title: String,
    pub start: String,
}

/// Data carried by a deferred reminder. `time` is the raw ticket timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredPayload {
    pub title: String,
    pub seat: String,
    pub time: String,
}

/// Whatever ends up in front of the user when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderPayload {
    Exact {
        id: ReminderId,
        payload: ExactPayload,
    },
    Deferred(DeferredPayload),
}

/// The environment refused a precise wake-up (no exact alarm permission).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityDenied;

impl fmt::Display for CapabilityDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exact reminders are not permitted")
    }
}

impl std::error::Error for CapabilityDenied {}

pub trait ReminderSink {
    /// Fire at exactly `at`. A second call with the same `id` replaces the first.
    fn schedule_exact(
        &self,
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    ) -> Result<(), CapabilityDenied>;

    /// Best effort: fire roughly `delay` from now.
    fn schedule_deferred(&self, delay: Duration, payload: DeferredPayload);
}

impl<S: ReminderSink + ?Sized> ReminderSink for std::sync::Arc<S> {
    fn schedule_exact(
        &self,
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    ) -> Result<(), CapabilityDenied> {
        (**self).schedule_exact(at, id, payload)
    }

    fn schedule_deferred(&self, delay: Duration, payload: DeferredPayload) {
        (**self).schedule_deferred(delay, payload)
    }
}

/// A call observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Exact {
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    },
    Deferred {
        delay: Duration,
        payload: DeferredPayload,
    },
}

/// In-memory sink that records every call. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    deny_exact: bool,
    calls: std::sync::Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses every exact request.
    pub fn denying_exact() -> Self {
        Self {
            deny_exact: true,
            calls: Default::default(),
        }
    }

    /// Snapshot of every accepted call, in order.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: SinkCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl ReminderSink for RecordingSink {
    fn schedule_exact(
        &self,
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    ) -> Result<(), CapabilityDenied> {
        if self.deny_exact {
            return Err(CapabilityDenied);
        }
        self.record(SinkCall::Exact { at, id, payload });
        Ok(())
    }

    fn schedule_deferred(&self, delay: Duration, payload: DeferredPayload) {
        self.record(SinkCall::Deferred { delay, payload });
    }
}
