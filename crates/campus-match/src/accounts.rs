use chrono::{DateTime, Utc};
use tracing::info;

use campus_db::models::NewStudent;
use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Plan, QuotaKind, QuotaSnapshot, StudentId};

use crate::config::QuotaPolicy;
use crate::error::{MatchError, Result};
use crate::quota;

/// Insert a student on the free plan with every quota full.
pub fn register(
    conn: &Connection,
    policy: &QuotaPolicy,
    new: &NewStudent<'_>,
    now: DateTime<Utc>,
) -> Result<StudentId> {
    let id = queries::insert_student(conn, new, now)?.ok_or(MatchError::EmailTaken)?;

    for kind in QuotaKind::ALL {
        quota::refill(conn, policy, id, kind, now)?;
    }

    info!("Registered student {} ({})", id, new.email);
    Ok(id)
}

/// Switch plan. Balances move to the new ceilings inside the current window.
/// Re-selecting the current plan changes nothing.
pub fn change_plan(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    plan: Plan,
    now: DateTime<Utc>,
) -> Result<Vec<QuotaSnapshot>> {
    let student = queries::student_by_id(conn, student_id)?.ok_or(MatchError::StudentNotFound)?;
    if student.plan() == plan {
        return QuotaKind::ALL
            .into_iter()
            .map(|kind| quota::current(conn, policy, student_id, kind, now))
            .collect();
    }

    let snapshots = QuotaKind::ALL
        .into_iter()
        .map(|kind| quota::rebase(conn, policy, student_id, kind, plan, now))
        .collect::<Result<Vec<_>>>()?;
    queries::set_plan(conn, student_id, plan)?;

    info!(
        "Student {} moved from the {} plan to the {} plan",
        student_id,
        student.plan().as_str(),
        plan.as_str()
    );
    Ok(snapshots)
}

/// Spend one boost. The profile is ranked first in discovery until the
/// returned instant.
pub fn boost(
    conn: &Connection,
    policy: &QuotaPolicy,
    student_id: StudentId,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, u32)> {
    if !quota::try_consume(conn, policy, student_id, QuotaKind::Boost, now)? {
        return Err(MatchError::QuotaExhausted(QuotaKind::Boost));
    }

    let until = now + policy.boost_duration;
    queries::set_boosted_until(conn, student_id, until)?;
    let remaining = quota::current(conn, policy, student_id, QuotaKind::Boost, now)?.remaining;

    info!("Student {} boosted until {}", student_id, until);
    Ok((until, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, at};

    #[test]
    fn duplicate_email_is_rejected() {
        let fx = Fixture::new();
        fx.student("alice");

        let prefs = Default::default();
        let new = NewStudent {
            email: "alice@campus.edu",
            password_hash: "x",
            name: "Alice again",
            gender: "female",
            date_of_birth: chrono::NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(),
            preferences: &prefs,
            latitude: None,
            longitude: None,
        };
        let result = fx.db.with_tx(|tx| register(tx, &fx.policy, &new, at(0)));
        assert!(matches!(result, Err(MatchError::EmailTaken)));
    }

    fn super_likes(snaps: &[QuotaSnapshot]) -> QuotaSnapshot {
        *snaps.iter().find(|s| s.kind == QuotaKind::SuperLike).unwrap()
    }

    #[test]
    fn plan_changes_never_hand_out_a_fresh_window() {
        let fx = Fixture::new();
        let alice = fx.student("alice");

        fx.db
            .with_tx(|tx| {
                while quota::try_consume(tx, &fx.policy, alice, QuotaKind::SuperLike, at(1))? {}
                Ok::<_, MatchError>(())
            })
            .unwrap();

        let same = fx
            .db
            .with_tx(|tx| change_plan(tx, &fx.policy, alice, Plan::Free, at(2)))
            .unwrap();
        assert_eq!(super_likes(&same).remaining, 0);

        let up = fx
            .db
            .with_tx(|tx| change_plan(tx, &fx.policy, alice, Plan::Premium, at(2)))
            .unwrap();
        let extra = fx.policy.premium.super_likes - fx.policy.free.super_likes;
        assert_eq!(super_likes(&up).remaining, extra);
        assert_eq!(super_likes(&up).reset_at, at(24));

        let down = fx
            .db
            .with_tx(|tx| change_plan(tx, &fx.policy, alice, Plan::Free, at(3)))
            .unwrap();
        assert_eq!(super_likes(&down).remaining, extra.min(fx.policy.free.super_likes));
        assert_eq!(super_likes(&down).reset_at, at(24));
    }

    #[test]
    fn upgrade_raises_to_premium_ceilings() {
        let fx = Fixture::new();
        let alice = fx.student("alice");

        let snaps = fx
            .db
            .with_tx(|tx| change_plan(tx, &fx.policy, alice, Plan::Premium, at(2)))
            .unwrap();

        let boosts = snaps.iter().find(|s| s.kind == QuotaKind::Boost).unwrap();
        assert_eq!(boosts.remaining, fx.policy.premium.boosts);

        let (until, remaining) = fx
            .db
            .with_tx(|tx| boost(tx, &fx.policy, alice, at(3)))
            .unwrap();
        assert_eq!(until, at(3) + fx.policy.boost_duration);
        assert_eq!(remaining, fx.policy.premium.boosts - 1);
    }

    #[test]
    fn boost_without_quota_fails() {
        let fx = Fixture::new();
        let alice = fx.student("alice");

        let result = fx.db.with_tx(|tx| boost(tx, &fx.policy, alice, at(1)));
        assert!(matches!(result, Err(MatchError::QuotaExhausted(QuotaKind::Boost))));
    }
}
