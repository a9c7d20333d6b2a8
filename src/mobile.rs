/* kinopass/src/mobile.rs
 *
 * UniFFI interface exposing the booking and reminder core to Android.
 * The host implements `PlatformReminders` on top of AlarmManager (exact)
 * and WorkManager (deferred).
 */

use crate::auth;
use crate::catalog;
use crate::context::{AppContext, StandardContext};
use crate::controller::{BookingController, BookingReceipt};
use crate::model::Ticket;
use crate::reminder::{
    CapabilityDenied, DeferredPayload, ExactPayload, ReminderId, ReminderSink, SystemClock,
};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    Generic(String),
}
impl From<String> for MobileError {
    fn from(e: String) -> Self {
        Self::Generic(e)
    }
}
impl From<&str> for MobileError {
    fn from(e: &str) -> Self {
        Self::Generic(e.to_string())
    }
}
impl From<anyhow::Error> for MobileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
impl std::fmt::Display for MobileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MobileError::Generic(s) => write!(f, "{}", s),
        }
    }
}
impl std::error::Error for MobileError {}

/// Implemented on the Kotlin side.
#[uniffi::export(with_foreign)]
pub trait PlatformReminders: Send + Sync {
    /// Sets an exact, idle-allowed alarm. Returns false when the exact alarm
    /// permission is missing (the SecurityException case).
    fn schedule_exact(
        &self,
        trigger_epoch_ms: i64,
        request_code: i32,
        title: String,
        start: String,
    ) -> bool;

    /// Enqueues a one-time background job after `delay_ms`.
    fn schedule_deferred(&self, delay_ms: i64, title: String, seat: String, time: String);
}

struct PlatformSink(Arc<dyn PlatformReminders>);

impl ReminderSink for PlatformSink {
    fn schedule_exact(
        &self,
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    ) -> Result<(), CapabilityDenied> {
        if self
            .0
            .schedule_exact(at.timestamp_millis(), id.value(), payload.title, payload.start)
        {
            Ok(())
        } else {
            Err(CapabilityDenied)
        }
    }

    fn schedule_deferred(&self, delay: Duration, payload: DeferredPayload) {
        self.0.schedule_deferred(
            delay.num_milliseconds(),
            payload.title,
            payload.seat,
            payload.time,
        );
    }
}

#[derive(uniffi::Record)]
pub struct MobileMovie {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub showtimes: Vec<String>,
}

#[derive(uniffi::Record)]
pub struct MobileTicket {
    pub id: u64,
    pub movie_title: String,
    pub seat: String,
    pub time: String,
    pub qr_payload: String,
}

impl From<Ticket> for MobileTicket {
    fn from(t: Ticket) -> Self {
        Self {
            qr_payload: t.qr_payload(),
            id: t.id,
            movie_title: t.movie_title,
            seat: t.seat,
            time: t.time,
        }
    }
}

#[derive(uniffi::Record)]
pub struct MobileBookingResult {
    pub ticket: MobileTicket,
    pub reminder_scheduled: bool,
    /// Human readable reminder outcome for a toast.
    pub reminder_status: String,
}

impl From<BookingReceipt> for MobileBookingResult {
    fn from(r: BookingReceipt) -> Self {
        Self {
            reminder_scheduled: r.outcome.is_scheduled(),
            reminder_status: r.outcome.to_string(),
            ticket: r.ticket.into(),
        }
    }
}

#[derive(uniffi::Object)]
pub struct KinopassMobile {
    ctx: Arc<dyn AppContext>,
    controller: BookingController,
}

#[uniffi::export]
impl KinopassMobile {
    #[uniffi::constructor]
    pub fn new(android_files_dir: String, reminders: Arc<dyn PlatformReminders>) -> Self {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("KinopassRust"),
        );
        let ctx: Arc<dyn AppContext> =
            Arc::new(StandardContext::new(Some(PathBuf::from(android_files_dir))));
        let controller = BookingController::new(
            ctx.clone(),
            Arc::new(PlatformSink(reminders)),
            Arc::new(SystemClock),
        );
        Self { ctx, controller }
    }

    pub fn movies(&self, query: String) -> Vec<MobileMovie> {
        catalog::search(&query)
            .into_iter()
            .map(|m| MobileMovie {
                id: m.id,
                title: m.title.clone(),
                description: m.description.clone(),
                showtimes: m.showtimes.clone(),
            })
            .collect()
    }

    pub fn taken_seats(&self, title: String, showtime: String) -> Result<Vec<String>, MobileError> {
        let mut seats: Vec<String> = self
            .controller
            .taken_seats(&title, &showtime)?
            .into_iter()
            .collect();
        seats.sort();
        Ok(seats)
    }

    pub fn book(
        &self,
        title: String,
        seat: String,
        time: String,
    ) -> Result<MobileBookingResult, MobileError> {
        Ok(self.controller.book(&title, &seat, &time)?.into())
    }

    pub fn book_showing(
        &self,
        movie_id: u32,
        showtime: String,
        row: u32,
        number: u32,
    ) -> Result<MobileBookingResult, MobileError> {
        Ok(self
            .controller
            .book_showing(movie_id, &showtime, row, number)?
            .into())
    }

    pub fn tickets(&self, query: String) -> Result<Vec<MobileTicket>, MobileError> {
        Ok(self
            .controller
            .search_tickets(&query)?
            .into_iter()
            .map(MobileTicket::from)
            .collect())
    }

    pub fn delete_ticket(&self, id: u64) -> Result<bool, MobileError> {
        Ok(self.controller.delete(id)?)
    }

    pub fn test_notification(&self) {
        self.controller.test_notification();
    }

    pub fn check_login(&self, identifier: String, password: String) -> bool {
        auth::check_login(self.ctx.as_ref(), &identifier, &password)
    }

    pub fn register(
        &self,
        email: String,
        password: String,
        confirm: String,
    ) -> Result<(), MobileError> {
        auth::register(self.ctx.as_ref(), &email, &password, &confirm)?;
        Ok(())
    }

    pub fn is_valid_reset_target(&self, input: String) -> bool {
        auth::validate_reset_target(self.ctx.as_ref(), &input)
    }
}
