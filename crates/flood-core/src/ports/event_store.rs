//! Event store port - durable, transactional storage of flood events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Event, SubjectId};
use crate::error::StoreError;

/// Durable store of `(subject, occurred_at)` events.
///
/// Implementations read "now" from their own clock; callers only ever pass a
/// window length.
#[async_trait]
pub trait EventStore: Send + Sync {
    type Tx: EventTransaction;

    /// Open a unit of work holding the subject's exclusive lock.
    ///
    /// Concurrent transactions for the same subject serialize; transactions
    /// for different subjects never wait on each other.
    async fn begin(&self, subject: SubjectId) -> Result<Self::Tx, StoreError>;

    /// Snapshot of the subject's recorded events, oldest first.
    async fn events(&self, subject: SubjectId) -> Result<Vec<Event>, StoreError>;
}

#[async_trait]
impl<S: EventStore> EventStore for Arc<S> {
    type Tx = S::Tx;

    async fn begin(&self, subject: SubjectId) -> Result<Self::Tx, StoreError> {
        (**self).begin(subject).await
    }

    async fn events(&self, subject: SubjectId) -> Result<Vec<Event>, StoreError> {
        (**self).events(subject).await
    }
}

/// A per-subject unit of work.
///
/// Dropping a transaction without calling [`EventTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait EventTransaction: Send {
    /// Delete the subject's events older than `now - window`.
    /// Returns the number of events removed; zero is not an error.
    async fn delete_expired(&mut self, window: Duration) -> Result<u64, StoreError>;

    /// Record one event for the subject at the store's current time.
    async fn insert(&mut self) -> Result<(), StoreError>;

    /// Count the subject's events with `occurred_at >= now - window`.
    async fn count_since(&mut self, window: Duration) -> Result<u64, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
