//! # Flood Infrastructure
//!
//! Concrete implementations of the ports defined in `flood-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store only
//! - `postgres` - PostgreSQL event store via SeaORM

pub mod clock;
pub mod database;
pub mod event_store;

pub use clock::{ManualClock, SystemClock};
pub use database::DatabaseConfig;
pub use event_store::InMemoryEventStore;

#[cfg(feature = "postgres")]
pub use database::{PostgresEventStore, connect};
