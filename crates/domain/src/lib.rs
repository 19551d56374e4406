//! campbot Domain - pure types for automating the campground.
//!
//! Nothing in this crate performs I/O. The engine crate owns transport,
//! sessions and scripting; this crate owns what a response *means*.

pub mod capability;
pub mod character;
pub mod classifier;
pub mod delta;
pub mod error;
pub mod outcome;
pub mod probes;
pub mod results;

pub use capability::{Capability, CapabilitySet};
pub use character::{CharacterState, Gauge};
pub use classifier::{classify, scan_capabilities, CapabilityScan, HTTP_OK};
pub use delta::{ItemGain, StateDelta};
pub use error::DomainError;
pub use outcome::{FailureReason, Outcome};
pub use results::scrape_results;
