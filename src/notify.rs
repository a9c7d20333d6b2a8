// File: ./src/notify.rs
//! Turns fired reminders into user-visible notifications.
use crate::reminder::ReminderPayload;
use notify_rust::Notification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn from_payload(payload: &ReminderPayload) -> Self {
        match payload {
            ReminderPayload::Exact { payload, .. } => Self {
                title: "Movie starting soon".to_string(),
                body: format!("{} starts at {}", payload.title, payload.start),
            },
            ReminderPayload::Deferred(p) => Self {
                title: format!("Kinopass: {}", p.title),
                body: format!("Starts at {} • Seat {}", p.time, p.seat),
            },
        }
    }
}

/// Shows an OS notification. Blocks until the notification server answers,
/// so async callers run it on a blocking thread.
pub fn show(notice: &Notice, app_name: &str) {
    if let Err(e) = Notification::new()
        .summary(&notice.title)
        .body(&notice.body)
        .appname(app_name)
        .show()
    {
        log::warn!("Failed to show notification '{}': {}", notice.title, e);
    }
}
