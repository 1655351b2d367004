//! Flood control port.

use async_trait::async_trait;

use crate::error::FloodError;

/// Flood control trait - the public face of the limiter.
#[async_trait]
pub trait FloodControl: Send + Sync {
    /// Record an attempt for `user_id` and decide whether it is allowed.
    ///
    /// Returns `Ok(false)` once the user exceeded the configured number of
    /// attempts inside the trailing window. An `Err` means no decision was
    /// made and must not be read as a denial.
    async fn check(&self, user_id: i64) -> Result<bool, FloodError>;
}
