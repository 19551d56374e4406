//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The game server round trip (could swap reqwest -> recorded fixtures)
//! - Display notifications (log, channel, or a GUI)
//! - Clock (for testing)

mod error;
mod external;
mod testing;

pub use error::TransportError;
pub use external::{
    DisplayState, FormParams, NotificationPort, TransportPort, TransportRequest,
    TransportResponse,
};
pub use testing::ClockPort;

#[cfg(test)]
pub use external::{MockNotificationPort, MockTransportPort};
#[cfg(test)]
pub use testing::MockClockPort;
