//! SeaORM entities.

pub mod flood_record;
