//! The flood controller - windowed counting over a durable event store.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{FloodDecision, FloodPolicy, SubjectId};
use crate::error::FloodError;
use crate::ports::{EventStore, EventTransaction, FloodControl};

/// Per-subject flood controller.
///
/// Every check runs evict, record and count inside one store transaction that
/// holds the subject's lock, so concurrent checks for the same subject cannot
/// both slip under the threshold. The attempt is recorded even when it ends
/// up denied.
///
/// The controller keeps no counters of its own; all state lives in the store.
pub struct FloodController<S> {
    store: S,
    policy: FloodPolicy,
    timeout: Option<Duration>,
}

impl<S: EventStore> FloodController<S> {
    pub fn new(store: S, policy: FloodPolicy) -> Self {
        Self {
            store,
            policy,
            timeout: None,
        }
    }

    /// Bound every check by `timeout`. An expired check rolls back.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record an attempt for `subject` and return the full decision.
    pub async fn evaluate(&self, subject: SubjectId) -> Result<FloodDecision, FloodError> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(subject))
                .await
                .map_err(|_| FloodError::Timeout(limit))
                .and_then(|r| r),
            None => self.run(subject).await,
        };

        match &result {
            Ok(decision) if decision.allowed => tracing::debug!(
                subject = %subject,
                count = decision.count,
                max_events = decision.max_events,
                "Flood check allowed"
            ),
            Ok(decision) => tracing::info!(
                subject = %subject,
                count = decision.count,
                max_events = decision.max_events,
                "Flood check denied"
            ),
            Err(e) => tracing::warn!(subject = %subject, error = %e, "Flood check failed"),
        }

        result
    }

    async fn run(&self, subject: SubjectId) -> Result<FloodDecision, FloodError> {
        let window = self.policy.window();

        let mut tx = self.store.begin(subject).await?;
        let evicted = tx.delete_expired(window).await?;
        tx.insert().await?;
        let count = tx.count_since(window).await?;
        tx.commit().await?;

        if evicted > 0 {
            tracing::trace!(subject = %subject, evicted, "Evicted expired flood events");
        }

        Ok(FloodDecision::new(subject, count, self.policy.max_events()))
    }
}

#[async_trait]
impl<S: EventStore> FloodControl for FloodController<S> {
    async fn check(&self, user_id: i64) -> Result<bool, FloodError> {
        let subject = SubjectId::new(user_id)?;
        Ok(self.evaluate(subject).await?.allowed)
    }
}
