//! In-memory event store - used when no database is configured.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use flood_core::StoreError;
use flood_core::domain::{Event, SubjectId};
use flood_core::ports::{Clock, EventStore, EventTransaction};

use crate::clock::SystemClock;

type Timeline = Vec<DateTime<Utc>>;

/// In-memory event store with one async mutex per subject.
///
/// Transactions work on a staged copy of the subject's timeline and write it
/// back on commit. Shared between controllers through an `Arc`, it behaves
/// like one store serving several limiter instances in a single process.
/// Note: Events are lost on process restart.
pub struct InMemoryEventStore {
    clock: Arc<dyn Clock>,
    subjects: Mutex<HashMap<SubjectId, Arc<Mutex<Timeline>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            subjects: Mutex::new(HashMap::new()),
        }
    }

    async fn timeline(&self, subject: SubjectId) -> Arc<Mutex<Timeline>> {
        // The map lock is only held for the lookup, never across a subject's transaction.
        let mut subjects = self.subjects.lock().await;
        subjects.entry(subject).or_default().clone()
    }

    /// Drop subjects with no event inside `window` and no open transaction.
    ///
    /// Returns the number of subjects removed. A subject seen again later
    /// simply starts with an empty timeline.
    pub async fn purge_idle(&self, window: Duration) -> Result<usize, StoreError> {
        let cutoff = cutoff(self.clock.as_ref(), window)?;
        let mut subjects = self.subjects.lock().await;
        let before = subjects.len();

        subjects.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(timeline) => timeline.iter().any(|at| *at >= cutoff),
                Err(_) => true,
            }
        });

        let purged = before - subjects.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = subjects.len(), "Purged idle flood subjects");
        }
        Ok(purged)
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self, subject: SubjectId) -> Result<InMemoryTransaction, StoreError> {
        let guard = self.timeline(subject).await.lock_owned().await;
        let staged = guard.clone();

        Ok(InMemoryTransaction {
            clock: self.clock.clone(),
            guard,
            staged,
            subject,
        })
    }

    async fn events(&self, subject: SubjectId) -> Result<Vec<Event>, StoreError> {
        let Some(timeline) = self.subjects.lock().await.get(&subject).cloned() else {
            return Ok(Vec::new());
        };
        let timeline = timeline.lock().await;

        let mut events: Vec<Event> = timeline
            .iter()
            .map(|at| Event::new(subject, *at))
            .collect();
        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }
}

/// Transaction over one subject's timeline. Holds the subject's lock until dropped.
pub struct InMemoryTransaction {
    clock: Arc<dyn Clock>,
    guard: OwnedMutexGuard<Timeline>,
    staged: Timeline,
    subject: SubjectId,
}

impl InMemoryTransaction {
    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    fn cutoff(&self, window: Duration) -> Result<DateTime<Utc>, StoreError> {
        cutoff(self.clock.as_ref(), window)
    }
}

fn cutoff(clock: &dyn Clock, window: Duration) -> Result<DateTime<Utc>, StoreError> {
    let window = chrono::Duration::from_std(window).map_err(|e| StoreError::Query(e.to_string()))?;
    clock
        .now()
        .checked_sub_signed(window)
        .ok_or_else(|| StoreError::Query("window reaches before the epoch range".to_string()))
}

#[async_trait]
impl EventTransaction for InMemoryTransaction {
    async fn delete_expired(&mut self, window: Duration) -> Result<u64, StoreError> {
        let cutoff = self.cutoff(window)?;
        let before = self.staged.len();
        self.staged.retain(|at| *at >= cutoff);
        Ok((before - self.staged.len()) as u64)
    }

    async fn insert(&mut self) -> Result<(), StoreError> {
        self.staged.push(self.clock.now());
        Ok(())
    }

    async fn count_since(&mut self, window: Duration) -> Result<u64, StoreError> {
        let cutoff = self.cutoff(window)?;
        Ok(self.staged.iter().filter(|at| **at >= cutoff).count() as u64)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }
}
