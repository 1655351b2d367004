//! Event store implementations - Postgres (see `database`) and in-memory fallback.

mod memory;

pub use memory::{InMemoryEventStore, InMemoryTransaction};
