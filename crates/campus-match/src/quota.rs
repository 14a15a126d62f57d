//! Daily allowances for super-likes, rewinds and boosts.
//!
//! There is no scheduler. Every read or consume first settles the counter:
//! if `now >= reset_at` it is refilled to the plan ceiling and re-armed one
//! window ahead, and only then is the request evaluated.

use chrono::{DateTime, Utc};
use tracing::debug;

use campus_db::models::QuotaCounter;
use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Plan, QuotaKind, QuotaSnapshot, StudentId};

use crate::config::QuotaPolicy;
use crate::error::{MatchError, Result};

/// Counter state after the lazy-reset step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settled {
    remaining: u32,
    limit: u32,
    reset_at: DateTime<Utc>,
    dirty: bool,
}

fn settle(counter: &QuotaCounter, limit: u32, policy: &QuotaPolicy, now: DateTime<Utc>) -> Settled {
    if now >= counter.reset_at {
        return Settled {
            remaining: limit,
            limit,
            reset_at: now + policy.window,
            dirty: true,
        };
    }

    // A downgrade can leave more than the new ceiling on the row.
    let remaining = counter.remaining.min(limit);
    Settled {
        remaining,
        limit,
        reset_at: counter.reset_at,
        dirty: remaining != counter.remaining,
    }
}

fn load(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    kind: QuotaKind,
    now: DateTime<Utc>,
) -> Result<Settled> {
    let counter = queries::quota_counter(conn, student_id, kind)?.ok_or(MatchError::StudentNotFound)?;
    let settled = settle(&counter, policy.limit(counter.plan, kind), policy, now);

    if settled.dirty {
        debug!(
            "Quota {} for student {} reset to {} (next reset {})",
            kind, student_id, settled.remaining, settled.reset_at
        );
        queries::store_quota_counter(conn, student_id, kind, settled.remaining, settled.reset_at)?;
    }

    Ok(settled)
}

fn snapshot(kind: QuotaKind, settled: Settled) -> QuotaSnapshot {
    QuotaSnapshot {
        kind,
        remaining: settled.remaining,
        limit: settled.limit,
        reset_at: settled.reset_at,
    }
}

/// Current balance, with the lazy reset applied.
pub fn current(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    kind: QuotaKind,
    now: DateTime<Utc>,
) -> Result<QuotaSnapshot> {
    Ok(snapshot(kind, load(conn, policy, student_id, kind, now)?))
}

/// Take one unit. Returns false, leaving the balance untouched, when none is left.
pub fn try_consume(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    kind: QuotaKind,
    now: DateTime<Utc>,
) -> Result<bool> {
    let settled = load(conn, policy, student_id, kind, now)?;
    if settled.remaining == 0 {
        return Ok(false);
    }

    queries::store_quota_counter(conn, student_id, kind, settled.remaining - 1, settled.reset_at)?;
    Ok(true)
}

/// Unconditionally restore the plan ceiling and start a fresh window.
pub fn refill(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    kind: QuotaKind,
    now: DateTime<Utc>,
) -> Result<QuotaSnapshot> {
    let counter = queries::quota_counter(conn, student_id, kind)?.ok_or(MatchError::StudentNotFound)?;
    let limit = policy.limit(counter.plan, kind);
    let reset_at = now + policy.window;

    queries::store_quota_counter(conn, student_id, kind, limit, reset_at)?;
    Ok(QuotaSnapshot {
        kind,
        remaining: limit,
        limit,
        reset_at,
    })
}

/// Move one counter from its stored plan's ceiling to `plan`'s, keeping the
/// current window. An upgrade adds the difference between the two ceilings.
/// A downgrade only clamps. Call before the plan itself is written.
pub fn rebase(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    kind: QuotaKind,
    plan: Plan,
    now: DateTime<Utc>,
) -> Result<QuotaSnapshot> {
    let before = load(conn, policy, student_id, kind, now)?;
    let limit = policy.limit(plan, kind);
    let remaining = if limit > before.limit {
        before.remaining + (limit - before.limit)
    } else {
        before.remaining.min(limit)
    };

    if remaining != before.remaining {
        queries::store_quota_counter(conn, student_id, kind, remaining, before.reset_at)?;
    }
    Ok(QuotaSnapshot {
        kind,
        remaining,
        limit,
        reset_at: before.reset_at,
    })
}
