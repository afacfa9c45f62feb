// src/lib.rs
// Public library surface for the `sentinel` binary and integration tests.

pub mod config;
pub mod discovery;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::discovery::types::{JobProvider, Listing};
pub use crate::discovery::{run_once, run_with_state, RunOutcome, Watcher};
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};
