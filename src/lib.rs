// Crate root library declaration and module exports.
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod controller;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod reminder_index;
pub mod seats;
pub mod storage;
pub mod store;
pub mod system;

// --- ANDROID SUPPORT ---
#[cfg(feature = "mobile")]
pub mod mobile;

#[cfg(feature = "mobile")]
uniffi::setup_scaffolding!();
