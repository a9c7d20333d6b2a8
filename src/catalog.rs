// File: ./src/catalog.rs
//! The films currently showing. There is no backend; the list is built in.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u32,
    pub title: String,
    pub description: String,
    /// Daily showtimes, `HH:MM`.
    pub showtimes: Vec<String>,
}

impl Movie {
    fn new(id: u32, title: &str, description: &str, showtimes: &[&str]) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            showtimes: showtimes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn has_showtime(&self, showtime: &str) -> bool {
        self.showtimes.iter().any(|s| s == showtime.trim())
    }
}

static NOW_SHOWING: Lazy<Vec<Movie>> = Lazy::new(|| {
    vec![
        Movie::new(
            1,
            "Dune: Part Two",
            "Paul Atreides joins the Fremen on Arrakis and must choose between his love \
             for Chani and leading an entire people, while the great houses fight over the spice.",
            &["17:30", "20:15", "22:00"],
        ),
        Movie::new(
            2,
            "Oppenheimer",
            "J. Robert Oppenheimer and the making of the atomic bomb: the science, the \
             ethics, and the man who had to live with what he helped create.",
            &["18:00", "21:00"],
        ),
        Movie::new(
            3,
            "John Wick 4",
            "John Wick takes on the High Table across the world's great cities, meeting \
             old allies and new enemies in relentlessly choreographed fights.",
            &["19:00", "22:15"],
        ),
        Movie::new(
            4,
            "Interstellar",
            "A crew of astronauts travels through a wormhole looking for a new home for \
             humanity while time runs out on a dying Earth.",
            &["16:30", "20:45"],
        ),
    ]
});

pub fn now_showing() -> &'static [Movie] {
    &NOW_SHOWING
}

pub fn find(id: u32) -> Option<&'static Movie> {
    NOW_SHOWING.iter().find(|m| m.id == id)
}

/// Case-insensitive title filter. A blank query returns everything.
pub fn search(query: &str) -> Vec<&'static Movie> {
    let q = query.trim().to_lowercase();
    NOW_SHOWING
        .iter()
        .filter(|m| q.is_empty() || m.title.to_lowercase().contains(&q))
        .collect()
}
