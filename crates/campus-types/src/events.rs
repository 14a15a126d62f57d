use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::StudentId;

/// Events pushed to a single student through the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    /// A mutual like produced a new match. `student_id` is the other party.
    MatchCreated {
        match_id: i64,
        student_id: StudentId,
        created_at: DateTime<Utc>,
    },

    /// The other party unmatched or blocked.
    MatchEnded { match_id: i64 },
}
