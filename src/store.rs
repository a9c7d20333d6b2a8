// File: ./src/store.rs
// Local ticket store: one JSON file, appended to on booking and pruned on delete.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to the Ticket struct require incrementing TICKET_STORAGE_VERSION
// and teaching `load_data` how to read the previous layout.
use crate::context::AppContext;
use crate::model::Ticket;
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const TICKET_STORAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug)]
struct TicketStorageData {
    #[serde(default)]
    version: u32,
    /// Next id to hand out. Ids are never reused, even after deletes.
    next_id: u64,
    tickets: Vec<Ticket>,
}

impl Default for TicketStorageData {
    fn default() -> Self {
        Self {
            version: TICKET_STORAGE_VERSION,
            next_id: 1,
            tickets: Vec::new(),
        }
    }
}

pub struct TicketStore;

impl TicketStore {
    /// Reads the store file. Must be called with the lock held.
    fn load_data(path: &Path) -> Result<TicketStorageData> {
        let Some(data) = LocalStorage::read_json_unlocked::<TicketStorageData>(path)? else {
            return Ok(TicketStorageData::default());
        };
        if data.version > TICKET_STORAGE_VERSION {
            anyhow::bail!(
                "Ticket store {:?} was written by a newer version (v{})",
                path,
                data.version
            );
        }
        Ok(data)
    }

    fn modify<F, T>(ctx: &dyn AppContext, f: F) -> Result<T>
    where
        F: FnOnce(&mut TicketStorageData) -> T,
    {
        let path = ctx.get_tickets_path()?;
        LocalStorage::with_lock(&path, || {
            // A load error aborts here, so an unreadable file is never overwritten
            let mut data = Self::load_data(&path)?;
            let out = f(&mut data);
            data.version = TICKET_STORAGE_VERSION;
            let json = serde_json::to_string_pretty(&data)?;
            LocalStorage::atomic_write(&path, json)?;
            Ok(out)
        })
    }

    /// All tickets, newest first.
    pub fn load(ctx: &dyn AppContext) -> Result<Vec<Ticket>> {
        let path = ctx.get_tickets_path()?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut tickets = LocalStorage::with_lock(&path, || Self::load_data(&path))?.tickets;
        tickets.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(tickets)
    }

    /// Appends a ticket and returns it with its assigned id.
    pub fn add(ctx: &dyn AppContext, movie_title: &str, seat: &str, time: &str) -> Result<Ticket> {
        let ticket = Self::modify(ctx, |data| {
            let ticket = Ticket {
                id: data.next_id,
                movie_title: movie_title.to_string(),
                seat: seat.to_string(),
                time: time.to_string(),
            };
            data.next_id += 1;
            data.tickets.push(ticket.clone());
            ticket
        })?;
        log::debug!("Stored ticket {} for '{}'", ticket.id, ticket.movie_title);
        Ok(ticket)
    }

    /// Deletes a ticket. Returns false if no ticket had that id.
    pub fn remove(ctx: &dyn AppContext, id: u64) -> Result<bool> {
        Self::modify(ctx, |data| {
            let before = data.tickets.len();
            data.tickets.retain(|t| t.id != id);
            data.tickets.len() != before
        })
    }

    pub fn get(ctx: &dyn AppContext, id: u64) -> Result<Option<Ticket>> {
        Ok(Self::load(ctx)?.into_iter().find(|t| t.id == id))
    }
}

/// Seat labels already sold for `title` at the daily `showtime`.
pub fn taken_seats(tickets: &[Ticket], title: &str, showtime: &str) -> HashSet<String> {
    tickets
        .iter()
        .filter(|t| t.is_for_showing(title, showtime))
        .map(|t| t.seat.clone())
        .collect()
}
