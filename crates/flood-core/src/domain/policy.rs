use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FloodError;

/// Flood control policy: at most `max_events` attempts per trailing `window`.
///
/// The window is a whole number of seconds, at least one. Deserializes from
/// `{"window_seconds": .., "max_events": ..}` and also accepts the legacy
/// `maxSecondsPassed` / `maxTotalRecords` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy", into = "RawPolicy")]
pub struct FloodPolicy {
    window: Duration,
    max_events: u32,
}

impl FloodPolicy {
    pub fn new(window: Duration, max_events: u32) -> Result<Self, FloodError> {
        if window.subsec_nanos() != 0 {
            return Err(FloodError::InvalidPolicy(format!(
                "window must be whole seconds, got {window:?}"
            )));
        }
        if window.as_secs() == 0 {
            return Err(FloodError::InvalidPolicy(
                "window must be at least one second".to_string(),
            ));
        }
        if chrono::Duration::from_std(window).is_err() {
            return Err(FloodError::InvalidPolicy(format!(
                "window of {}s is out of range",
                window.as_secs()
            )));
        }
        if max_events == 0 {
            return Err(FloodError::InvalidPolicy(
                "max_events must be at least 1".to_string(),
            ));
        }
        Ok(Self { window, max_events })
    }

    pub fn from_secs(window_seconds: u64, max_events: u32) -> Result<Self, FloodError> {
        Self::new(Duration::from_secs(window_seconds), max_events)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_seconds(&self) -> u64 {
        self.window.as_secs()
    }

    pub fn max_events(&self) -> u32 {
        self.max_events
    }
}

#[derive(Serialize, Deserialize)]
struct RawPolicy {
    #[serde(alias = "maxSecondsPassed")]
    window_seconds: u64,
    #[serde(alias = "maxTotalRecords")]
    max_events: u32,
}

impl TryFrom<RawPolicy> for FloodPolicy {
    type Error = FloodError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        Self::from_secs(raw.window_seconds, raw.max_events)
    }
}

impl From<FloodPolicy> for RawPolicy {
    fn from(policy: FloodPolicy) -> Self {
        Self {
            window_seconds: policy.window_seconds(),
            max_events: policy.max_events,
        }
    }
}
