// File: ./src/controller.rs
//! Booking workflows shared by every front end (CLI, Android bridge).
//! Persists tickets first, then asks the reminder core for a reminder; the
//! reminder outcome is reported but never fails a booking.
use crate::catalog;
use crate::context::AppContext;
use crate::model::{Ticket, booking_time_on};
use crate::reminder::{Clock, DeferredPayload, ReminderSink, SchedulingOutcome, schedule};
use crate::seats::{self, SeatSelection};
use crate::store::{self, TicketStore};
use anyhow::{Result, anyhow, bail};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    pub ticket: Ticket,
    pub outcome: SchedulingOutcome,
}

#[derive(Clone)]
pub struct BookingController {
    pub ctx: Arc<dyn AppContext>,
    pub sink: Arc<dyn ReminderSink + Send + Sync>,
    pub clock: Arc<dyn Clock>,
}

impl BookingController {
    pub fn new(
        ctx: Arc<dyn AppContext>,
        sink: Arc<dyn ReminderSink + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ctx, sink, clock }
    }

    /// Stores a ticket and schedules its reminder.
    pub fn book(&self, title: &str, seat: &str, time: &str) -> Result<BookingReceipt> {
        let ticket = TicketStore::add(self.ctx.as_ref(), title, seat, time)?;
        let outcome = schedule(
            &ticket.booking(),
            self.clock.as_ref(),
            self.sink.as_ref(),
        );
        log::info!("Booked ticket {} ({}): {}", ticket.id, ticket.movie_title, outcome);
        Ok(BookingReceipt { ticket, outcome })
    }

    /// Books `row`/`number` for a catalog movie at today's `showtime`.
    pub fn book_showing(
        &self,
        movie_id: u32,
        showtime: &str,
        row: u32,
        number: u32,
    ) -> Result<BookingReceipt> {
        let movie = catalog::find(movie_id).ok_or_else(|| anyhow!("No movie with id {}", movie_id))?;
        if !movie.has_showtime(showtime) {
            bail!(
                "'{}' is not shown at {} (showtimes: {})",
                movie.title,
                showtime,
                movie.showtimes.join(", ")
            );
        }

        let layout = seats::default_layout(&self.taken_seats(&movie.title, showtime)?);
        let seat = seats::seat_at(&layout, row, number)
            .ok_or_else(|| anyhow!("No seat at row {}, number {}", row, number))?;
        let mut selection = SeatSelection::new();
        if !selection.select(seat) {
            bail!("{} is already taken for {} at {}", seat, movie.title, showtime);
        }

        let time = booking_time_on(self.clock.today(), showtime);
        self.book(&movie.title, &seat.label(), &time)
    }

    pub fn tickets(&self) -> Result<Vec<Ticket>> {
        TicketStore::load(self.ctx.as_ref())
    }

    pub fn search_tickets(&self, query: &str) -> Result<Vec<Ticket>> {
        Ok(self
            .tickets()?
            .into_iter()
            .filter(|t| t.matches(query))
            .collect())
    }

    pub fn ticket(&self, id: u64) -> Result<Option<Ticket>> {
        TicketStore::get(self.ctx.as_ref(), id)
    }

    /// Deletes a ticket. A pending reminder for it is left alone.
    pub fn delete(&self, id: u64) -> Result<bool> {
        TicketStore::remove(self.ctx.as_ref(), id)
    }

    pub fn taken_seats(&self, title: &str, showtime: &str) -> Result<HashSet<String>> {
        Ok(store::taken_seats(&self.tickets()?, title, showtime))
    }

    /// Queues a throwaway reminder five seconds out to check delivery works.
    pub fn test_notification(&self) {
        self.sink.schedule_deferred(
            chrono::Duration::seconds(5),
            DeferredPayload {
                title: "Test notification".to_string(),
                seat: "B12".to_string(),
                time: "in 5 seconds".to_string(),
            },
        );
    }
}
