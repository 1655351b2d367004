use chrono::{DateTime, Utc};

/// Source of "now" for stores that keep their own time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
