// File: ./src/system.rs
// Desktop reminder sink: a background actor that holds pending reminders
// and wakes up when the next one is due.
use crate::config::Config;
use crate::context::AppContext;
use crate::notify::{self, Notice};
use crate::reminder::{
    CapabilityDenied, DeferredPayload, ExactPayload, REMINDER_LEAD_MINUTES, ReminderId,
    ReminderPayload, ReminderSink,
};
use crate::reminder_index::{DeferredIndexEntry, ReminderIndex, ReminderIndexEntry};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, sleep_until};

#[derive(Debug, Clone)]
pub enum ReminderMessage {
    Fired(ReminderPayload),
}

#[derive(Debug, Clone)]
pub struct ActorOptions {
    pub exact_permitted: bool,
    pub notifications_enabled: bool,
    pub app_name: String,
    /// Where to mirror pending reminders. `None` keeps them in memory only.
    pub index_path: Option<PathBuf>,
}

impl ActorOptions {
    pub fn from_config(config: &Config, ctx: &dyn AppContext) -> Self {
        Self {
            exact_permitted: config.exact_alarms_permitted,
            notifications_enabled: config.notifications_enabled,
            app_name: config.app_name.clone(),
            index_path: ctx.get_reminder_index_path(),
        }
    }

    /// In-memory, no OS notifications. Fired reminders only go to the UI channel.
    pub fn headless(exact_permitted: bool) -> Self {
        Self {
            exact_permitted,
            notifications_enabled: false,
            app_name: "Kinopass".to_string(),
            index_path: None,
        }
    }
}

enum Command {
    Exact {
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    },
    Deferred {
        due: DateTime<Utc>,
        payload: DeferredPayload,
    },
    Pending(oneshot::Sender<Pending>),
}

/// Counts of reminders the actor is still holding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub exact: usize,
    pub deferred: usize,
    /// Earliest due time across both queues
    pub next_due: Option<DateTime<Utc>>,
}

/// Handle to the reminder actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DesktopReminderSink {
    tx: mpsc::UnboundedSender<Command>,
    exact_permitted: bool,
}

impl DesktopReminderSink {
    /// Asks the actor what it still holds. `None` if the actor has stopped.
    pub async fn pending(&self) -> Option<Pending> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(Command::Pending(tx)).ok()?;
        rx.await.ok()
    }

    /// Waits until every request sent so far has been applied and saved, and
    /// anything already due has been delivered. Call before the process exits.
    pub async fn flush(&self) {
        if self.pending().await.is_none() {
            log::warn!("Reminder actor stopped before flush");
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Exact { id, at, .. } => write!(f, "Exact({}, {})", id, at),
            Command::Deferred { due, .. } => write!(f, "Deferred({})", due),
            Command::Pending(_) => write!(f, "Pending"),
        }
    }
}

impl ReminderSink for DesktopReminderSink {
    fn schedule_exact(
        &self,
        at: DateTime<Utc>,
        id: ReminderId,
        payload: ExactPayload,
    ) -> Result<(), CapabilityDenied> {
        if !self.exact_permitted {
            return Err(CapabilityDenied);
        }
        if self.tx.send(Command::Exact { at, id, payload }).is_err() {
            log::warn!("Reminder actor stopped; exact reminder {} dropped", id);
        }
        Ok(())
    }

    fn schedule_deferred(&self, delay: ChronoDuration, payload: DeferredPayload) {
        let due = Utc::now() + delay;
        if self.tx.send(Command::Deferred { due, payload }).is_err() {
            log::warn!("Reminder actor stopped; deferred reminder dropped");
        }
    }
}

struct ReminderActor {
    options: ActorOptions,
    ui_sender: Option<mpsc::Sender<ReminderMessage>>,
    exact: HashMap<ReminderId, (DateTime<Utc>, ExactPayload)>,
    deferred: Vec<(DateTime<Utc>, DeferredPayload)>,
}

impl ReminderActor {
    /// Re-arms reminders and deferred jobs persisted by a previous run. Ones
    /// that are overdue by less than the lead time still fire, late.
    fn restore(&mut self, now: DateTime<Utc>) {
        let Some(path) = &self.options.index_path else {
            return;
        };
        let mut index = ReminderIndex::load(path);
        let grace_ms = REMINDER_LEAD_MINUTES * 60 * 1000;
        let before = index.len();
        index.prune_fired(now.timestamp_millis() - grace_ms);
        if index.len() < before {
            log::debug!("Dropping {} missed reminder(s)", before - index.len());
        }
        for entry in index.reminders {
            if let Some(at) = Utc.timestamp_millis_opt(entry.trigger_ms).single() {
                self.exact.insert(entry.id, (at, entry.payload));
            }
        }
        for job in index.deferred {
            if let Some(due) = Utc.timestamp_millis_opt(job.due_ms).single() {
                self.deferred.push((due, job.payload));
            }
        }
        if !self.exact.is_empty() || !self.deferred.is_empty() {
            log::info!(
                "Restored {} exact reminder(s) and {} deferred job(s)",
                self.exact.len(),
                self.deferred.len()
            );
        }
    }

    fn persist(&self) {
        let Some(path) = &self.options.index_path else {
            return;
        };
        let mut index = ReminderIndex::default();
        for (id, (at, payload)) in &self.exact {
            index.upsert(ReminderIndexEntry {
                id: *id,
                trigger_ms: at.timestamp_millis(),
                payload: payload.clone(),
            });
        }
        for (due, payload) in &self.deferred {
            index.push_deferred(DeferredIndexEntry {
                due_ms: due.timestamp_millis(),
                payload: payload.clone(),
            });
        }
        if let Err(e) = index.save(path) {
            log::warn!("Failed to save reminder index: {:#}", e);
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Exact { at, id, payload } => {
                // Same id replaces the pending reminder
                if self.exact.insert(id, (at, payload)).is_some() {
                    log::debug!("Replaced pending reminder {}", id);
                }
                self.persist();
            }
            Command::Deferred { due, payload } => {
                self.deferred.push((due, payload));
                self.persist();
            }
            Command::Pending(reply) => {
                let _ = reply.send(self.pending());
            }
        }
    }

    fn pending(&self) -> Pending {
        Pending {
            exact: self.exact.len(),
            deferred: self.deferred.len(),
            next_due: self.next_due(),
        }
    }

    fn next_due(&self) -> Option<DateTime<Utc>> {
        self.exact
            .values()
            .map(|(at, _)| *at)
            .chain(self.deferred.iter().map(|(due, _)| *due))
            .min()
    }

    /// Removes and returns everything due at or before `now`.
    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ReminderPayload> {
        let mut due_ids: Vec<(DateTime<Utc>, ReminderId)> = self
            .exact
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(id, (at, _))| (*at, *id))
            .collect();
        due_ids.sort();

        let mut fired = Vec::new();
        for (_, id) in &due_ids {
            if let Some((_, payload)) = self.exact.remove(id) {
                fired.push(ReminderPayload::Exact { id: *id, payload });
            }
        }

        let (due, later): (Vec<_>, Vec<_>) =
            self.deferred.drain(..).partition(|(at, _)| *at <= now);
        self.deferred = later;
        fired.extend(due.into_iter().map(|(_, p)| ReminderPayload::Deferred(p)));

        if !fired.is_empty() {
            self.persist();
        }
        fired
    }

    async fn deliver(&self, payload: ReminderPayload) {
        if let Some(ui_tx) = &self.ui_sender {
            let _ = ui_tx.send(ReminderMessage::Fired(payload.clone())).await;
        }
        if self.options.notifications_enabled {
            let notice = Notice::from_payload(&payload);
            let app_name = self.options.app_name.clone();
            // Awaited so a flush also covers delivery
            if let Err(e) =
                tokio::task::spawn_blocking(move || notify::show(&notice, &app_name)).await
            {
                log::warn!("Notification task failed: {}", e);
            }
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        self.restore(Utc::now());

        loop {
            let now = Utc::now();
            for payload in self.take_due(now) {
                self.deliver(payload).await;
            }

            if let Some(target) = self.next_due() {
                // Never sleep a negative duration if the clock drifted slightly
                let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
                let deadline = Instant::now() + wait;

                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    cmd = rx.recv() => match cmd {
                        Some(cmd) => self.apply(cmd),
                        None => break,
                    },
                }
            } else {
                match rx.recv().await {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                }
            }
        }
        log::debug!("Reminder actor stopped");
    }
}

/// Spawns the background reminder actor on the current tokio runtime.
/// Fired reminders are sent to `ui_sender` (when given) and shown as OS
/// notifications when enabled.
pub fn spawn_reminder_actor(
    options: ActorOptions,
    ui_sender: Option<mpsc::Sender<ReminderMessage>>,
) -> DesktopReminderSink {
    let (tx, rx) = mpsc::unbounded_channel();
    let exact_permitted = options.exact_permitted;

    let actor = ReminderActor {
        options,
        ui_sender,
        exact: HashMap::new(),
        deferred: Vec::new(),
    };
    tokio::spawn(actor.run(rx));

    DesktopReminderSink {
        tx,
        exact_permitted,
    }
}
