//! In-memory state owned by a running session.
//!
//! - `SessionController` - the live character, dispatch gate and cancellation flag

pub mod session;

pub use session::{DispatchReport, SessionController};
