// File: ./src/seats.rs
//! Auditorium seat grid.
use std::collections::HashSet;
use std::fmt;

pub const ROWS: u32 = 3;
pub const SEATS_PER_ROW: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seat {
    pub row: u32,
    pub number: u32,
    pub is_taken: bool,
}

impl Seat {
    /// The label stored on tickets, e.g. "Row 2, seat 4".
    pub fn label(&self) -> String {
        seat_label(self.row, self.number)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn seat_label(row: u32, number: u32) -> String {
    format!("Row {}, seat {}", row, number)
}

/// Builds the 3x6 grid, marking seats whose label is in `taken_labels`.
pub fn default_layout(taken_labels: &HashSet<String>) -> Vec<Vec<Seat>> {
    (1..=ROWS)
        .map(|row| {
            (1..=SEATS_PER_ROW)
                .map(|number| Seat {
                    row,
                    number,
                    is_taken: taken_labels.contains(&seat_label(row, number)),
                })
                .collect()
        })
        .collect()
}

/// Looks up a seat in a layout by position.
pub fn seat_at(layout: &[Vec<Seat>], row: u32, number: u32) -> Option<Seat> {
    layout
        .iter()
        .flatten()
        .find(|s| s.row == row && s.number == number)
        .copied()
}

/// The seat a user is about to confirm. Taken seats cannot be selected.
#[derive(Debug, Default, Clone)]
pub struct SeatSelection {
    selected: Option<Seat>,
}

impl SeatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the previous choice) when the seat is taken.
    pub fn select(&mut self, seat: Seat) -> bool {
        if seat.is_taken {
            return false;
        }
        self.selected = Some(seat);
        true
    }

    pub fn selected(&self) -> Option<Seat> {
        self.selected
    }
}
