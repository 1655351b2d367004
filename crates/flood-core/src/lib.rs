//! # Flood Core
//!
//! The domain layer of the flood controller.
//! This crate holds the windowed-counting algorithm, its domain types and the
//! ports a durable event store has to implement. It performs no I/O itself.

pub mod controller;
pub mod domain;
pub mod error;
pub mod ports;

pub use controller::FloodController;
pub use error::{FloodError, StoreError};
