use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FloodError;

/// Identifier of a rate-limited actor, stored as `flood_record.user_id`.
///
/// Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SubjectId(i64);

impl SubjectId {
    pub fn new(id: i64) -> Result<Self, FloodError> {
        if id <= 0 {
            return Err(FloodError::InvalidSubject(id));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for SubjectId {
    type Error = FloodError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<SubjectId> for i64 {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
