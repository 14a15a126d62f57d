use chrono::{DateTime, Utc};
use tracing::info;

use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Match, StudentId};

use crate::error::{MatchError, Result};

/// Record that `blocker` blocked `blocked`. Any active match between them
/// is deactivated and returned so the other side can be told.
pub fn block(
    conn: &Connection,
    blocker: StudentId,
    blocked: StudentId,
    now: DateTime<Utc>,
) -> Result<Option<Match>> {
    if blocker == blocked {
        return Err(MatchError::InvalidTarget);
    }
    if queries::student_by_id(conn, blocked)?.is_none() {
        return Err(MatchError::StudentNotFound);
    }

    if queries::insert_block(conn, blocker, blocked, now)? {
        info!("Student {} blocked {}", blocker, blocked);
    }

    let Some(row) = queries::match_by_pair(conn, blocker, blocked)? else {
        return Ok(None);
    };
    if !queries::deactivate_match(conn, row.id)? {
        return Ok(None);
    }

    let mut ended: Match = row.into();
    ended.is_active = false;
    Ok(Some(ended))
}
