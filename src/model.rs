// File: ./src/model.rs
use crate::reminder::Booking;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A booked ticket as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub movie_title: String,
    pub seat: String,
    /// Showing time as entered, usually `yyyy-MM-dd HH:mm`.
    pub time: String,
}

impl Ticket {
    /// Text encoded in the ticket's QR code for scanning at the door.
    pub fn qr_payload(&self) -> String {
        format!(
            "ticket:{}|{}|{}|{}",
            self.id, self.movie_title, self.time, self.seat
        )
    }

    /// Case-insensitive match over title, seat and time. Blank matches all.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.movie_title.to_lowercase().contains(&q)
            || self.seat.to_lowercase().contains(&q)
            || self.time.to_lowercase().contains(&q)
    }

    /// Whether this ticket is for `title` at the daily `showtime` (`HH:MM`).
    pub fn is_for_showing(&self, title: &str, showtime: &str) -> bool {
        self.movie_title == title && self.time.ends_with(&format!(" {}", showtime.trim()))
    }

    pub fn booking(&self) -> Booking {
        Booking::new(&self.movie_title, &self.seat, &self.time)
    }
}

/// Builds the stored timestamp for a daily showtime on `date`.
pub fn booking_time_on(date: NaiveDate, showtime: &str) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), showtime.trim())
}
