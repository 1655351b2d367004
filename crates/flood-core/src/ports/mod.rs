//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod event_store;
mod flood_control;

pub use clock::Clock;
pub use event_store::{EventStore, EventTransaction};
pub use flood_control::FloodControl;
