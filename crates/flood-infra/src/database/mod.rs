//! Database connection management and the Postgres event store.

mod connections;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_store;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_store::{PostgresEventStore, PostgresEventTransaction};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
