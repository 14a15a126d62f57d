use chrono::{DateTime, Utc};
use tracing::debug;

use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Match, QuotaKind, StudentId};

use crate::config::QuotaPolicy;
use crate::error::{MatchError, Result};
use crate::matcher::{self, MatchDecision};
use crate::quota;

#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub swipe_id: i64,
    pub is_match: bool,
    pub match_id: Option<i64>,
    /// Set only when this swipe inserted the match row.
    pub new_match: Option<Match>,
    pub remaining_super_likes: u32,
}

/// Validate and persist one swipe, consuming a super-like when asked, then
/// run match detection for likes. Must be called inside a transaction: a
/// failure at any step leaves no swipe row and no consumed quota.
pub fn record_swipe(
    conn: &Connection,
    policy: &QuotaPolicy,
    swiper: StudentId,
    target: StudentId,
    is_like: bool,
    is_super_like: bool,
    now: DateTime<Utc>,
) -> Result<SwipeOutcome> {
    if swiper == target {
        return Err(MatchError::InvalidTarget);
    }

    let actor = queries::student_by_id(conn, swiper)?.ok_or(MatchError::StudentNotFound)?;
    if actor.is_banned {
        return Err(MatchError::AccountSuspended);
    }

    let subject = queries::student_by_id(conn, target)?.ok_or(MatchError::InvalidTarget)?;
    if subject.is_banned || queries::is_blocked_between(conn, swiper, target)? {
        return Err(MatchError::TargetUnavailable);
    }

    if queries::swipe_exists(conn, swiper, target)? {
        return Err(MatchError::DuplicateSwipe);
    }

    if is_super_like && !quota::try_consume(conn, policy, swiper, QuotaKind::SuperLike, now)? {
        return Err(MatchError::QuotaExhausted(QuotaKind::SuperLike));
    }

    // A super-like is always a like.
    let is_like = is_like || is_super_like;
    let swipe_id = queries::insert_swipe(conn, swiper, target, is_like, is_super_like, now)?
        .ok_or(MatchError::DuplicateSwipe)?;

    debug!(
        "Swipe {}: {} -> {} (like={}, super={})",
        swipe_id, swiper, target, is_like, is_super_like
    );

    let decision = if is_like {
        matcher::check_and_create_match(conn, swiper, target, now)?
    } else {
        None
    };

    let remaining_super_likes = quota::current(conn, policy, swiper, QuotaKind::SuperLike, now)?.remaining;

    Ok(match decision {
        Some(MatchDecision { record, created }) => SwipeOutcome {
            swipe_id,
            is_match: true,
            match_id: Some(record.id),
            new_match: created.then_some(record),
            remaining_super_likes,
        },
        None => SwipeOutcome {
            swipe_id,
            is_match: false,
            match_id: None,
            new_match: None,
            remaining_super_likes,
        },
    })
}
