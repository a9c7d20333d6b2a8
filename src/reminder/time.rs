// File: ./src/reminder/time.rs
//! Parsing of the free-form showtime strings stored on tickets.
use chrono::NaiveDateTime;
use std::fmt;

/// A textual layout accepted for event timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLayout {
    /// Human readable form, as shown to users ("yyyy-MM-dd HH:mm").
    pub name: &'static str,
    /// chrono format string used for parsing.
    pub format: &'static str,
}

impl fmt::Display for TimeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub const ISO_LAYOUT: TimeLayout = TimeLayout {
    name: "yyyy-MM-dd HH:mm",
    format: "%Y-%m-%d %H:%M",
};

pub const DOTTED_LAYOUT: TimeLayout = TimeLayout {
    name: "dd.MM.yyyy HH:mm",
    format: "%d.%m.%Y %H:%M",
};

/// Accepted layouts, in precedence order.
pub const DEFAULT_LAYOUTS: [TimeLayout; 2] = [ISO_LAYOUT, DOTTED_LAYOUT];

/// A successfully parsed timestamp together with the layout that matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    pub local: NaiveDateTime,
    pub layout: TimeLayout,
}

/// Tries each layout in order and returns the first match.
/// `None` means no layout matched.
pub fn parse_with_layouts(raw: &str, layouts: &[TimeLayout]) -> Option<ParsedTime> {
    let trimmed = raw.trim();
    layouts.iter().find_map(|layout| {
        NaiveDateTime::parse_from_str(trimmed, layout.format)
            .ok()
            .map(|local| ParsedTime {
                local,
                layout: *layout,
            })
    })
}

/// Parses a ticket timestamp with the default layouts.
pub fn parse_event_time(raw: &str) -> Option<ParsedTime> {
    parse_with_layouts(raw, &DEFAULT_LAYOUTS)
}
