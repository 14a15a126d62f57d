use chrono::{DateTime, Utc};
use tracing::info;

use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{QuotaKind, StudentId, Swipe};

use crate::config::QuotaPolicy;
use crate::error::{MatchError, Result};
use crate::quota;

#[derive(Debug, Clone)]
pub struct UndoOutcome {
    pub undone: Swipe,
    /// The profile to put back into the discovery queue.
    pub restored_profile_id: StudentId,
    pub remaining_rewinds: u32,
}

/// Delete the student's newest swipe and spend one rewind.
///
/// A match the undone like already completed stays in place: undo is not
/// unmatch. A super-like spent on the undone swipe is not refunded.
pub fn undo_last_swipe(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    now: DateTime<Utc>,
) -> Result<UndoOutcome> {
    let last = queries::latest_swipe_by(conn, student_id)?.ok_or(MatchError::NothingToUndo)?;

    if !quota::try_consume(conn, policy, student_id, QuotaKind::Rewind, now)? {
        return Err(MatchError::QuotaExhausted(QuotaKind::Rewind));
    }

    queries::delete_swipe(conn, last.id)?;

    if last.is_like {
        if let Some(m) = queries::match_by_pair(conn, last.swiper_id, last.swiped_id)? {
            if m.is_active {
                info!(
                    "Student {} rewound a like that belongs to active match {}; match kept",
                    student_id, m.id
                );
            }
        }
    }

    let remaining_rewinds = quota::current(conn, policy, student_id, QuotaKind::Rewind, now)?.remaining;
    let undone: Swipe = last.into();
    info!("Student {} undid swipe {} on {}", student_id, undone.id, undone.swiped_id);

    Ok(UndoOutcome {
        restored_profile_id: undone.swiped_id,
        undone,
        remaining_rewinds,
    })
}
