//! campbot Engine library.
//!
//! Drives a logged-in game session: one character, one dispatch gate, and a
//! script engine that runs command sequences in the background.
//!
//! ## Structure
//!
//! - `requests/` - One type per game action, plus the per-request lifecycle
//! - `stores/` - The session controller owning the live character
//! - `use_cases/` - Script parsing, background sequences, macro logs
//! - `infrastructure/` - Ports and their adapters (HTTP client, notifiers, config)
//! - `api/` - Command line entry point
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod requests;
pub mod stores;
pub mod use_cases;

pub use app::App;
