use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SubjectId;

/// Event entity - one recorded occurrence of the limited action.
///
/// `occurred_at` comes from the store's clock. Events are never updated; the
/// only mutation is deletion once they fall out of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub subject_id: SubjectId,
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn new(subject_id: SubjectId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            occurred_at,
        }
    }
}
