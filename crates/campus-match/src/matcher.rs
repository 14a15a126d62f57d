use chrono::{DateTime, Utc};
use tracing::{debug, info};

use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Match, StudentId};

use crate::error::{MatchError, Result};

/// Result of a reciprocity check that found a mutual like.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub record: Match,
    /// True only for the call that inserted the row. Drives notification.
    pub created: bool,
}

/// Called after `swiper` liked `target`. Creates the match when `target`
/// already liked `swiper`.
///
/// The pair is unique in storage. If another writer inserted it between our
/// lookup and our insert, the constraint rejects ours and the existing row
/// is returned with `created = false`. An inactive match (unmatched or
/// blocked) is never revived.
pub fn check_and_create_match(
    conn: &Connection,
    swiper: StudentId,
    target: StudentId,
    now: DateTime<Utc>,
) -> Result<Option<MatchDecision>> {
    if !queries::like_exists(conn, target, swiper)? {
        return Ok(None);
    }

    if let Some(existing) = queries::match_by_pair(conn, swiper, target)? {
        return Ok(existing_decision(existing.into()));
    }

    match queries::insert_match(conn, swiper, target, now)? {
        Some(id) => {
            let record: Match = queries::match_by_id(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("match {} vanished after insert", id))?
                .into();
            info!(
                "Match {} created between {} and {}",
                record.id, record.student1_id, record.student2_id
            );
            Ok(Some(MatchDecision {
                record,
                created: true,
            }))
        }
        None => {
            let existing = queries::match_by_pair(conn, swiper, target)?.ok_or_else(|| {
                anyhow::anyhow!("match insert for {}/{} conflicted but no row exists", swiper, target)
            })?;
            debug!(
                "Concurrent match insert for {}/{} resolved to existing match {}",
                swiper, target, existing.id
            );
            Ok(existing_decision(existing.into()))
        }
    }
}

fn existing_decision(record: Match) -> Option<MatchDecision> {
    record.is_active.then_some(MatchDecision {
        record,
        created: false,
    })
}

/// Deactivate a match the caller takes part in. Returns the ended match, or
/// `None` when it was already inactive.
pub fn unmatch(conn: &Connection, student_id: StudentId, match_id: i64) -> Result<Option<Match>> {
    let mut record: Match = queries::match_by_id(conn, match_id)?
        .ok_or(MatchError::MatchNotFound)?
        .into();

    if !record.involves(student_id) {
        return Err(MatchError::MatchNotFound);
    }

    if !queries::deactivate_match(conn, match_id)? {
        return Ok(None);
    }
    info!("Student {} ended match {}", student_id, match_id);
    record.is_active = false;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use crate::testing::{Fixture, at};

    fn like(fx: &Fixture, from: StudentId, to: StudentId, hour: i64) {
        fx.db
            .with_tx(|tx| {
                queries::insert_swipe(tx, from, to, true, false, at(hour))?;
                Ok::<_, MatchError>(())
            })
            .unwrap();
    }

    #[test]
    fn one_sided_like_is_not_a_match() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));
        like(&fx, a, b, 1);

        let decision = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, a, b, at(1)))
            .unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn reciprocal_like_creates_canonical_pair_once() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));
        like(&fx, b, a, 1);
        like(&fx, a, b, 2);

        let first = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, b, a, at(2)))
            .unwrap()
            .unwrap();
        assert!(first.created);
        assert_eq!((first.record.student1_id, first.record.student2_id), (a, b));

        let second = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, a, b, at(3)))
            .unwrap()
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(fx.db.count_matches_between(a, b).unwrap(), 1);
    }

    #[test]
    fn constraint_rejects_second_insert_of_pair() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));

        fx.db
            .with_tx(|tx| {
                assert!(queries::insert_match(tx, a, b, at(1))?.is_some());
                assert!(queries::insert_match(tx, b, a, at(1))?.is_none());
                Ok::<_, MatchError>(())
            })
            .unwrap();
        assert_eq!(fx.db.count_matches_between(a, b).unwrap(), 1);
    }

    #[test]
    fn concurrent_detectors_agree_on_single_match() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));
        like(&fx, a, b, 1);
        like(&fx, b, a, 1);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [(a, b), (b, a)]
            .into_iter()
            .map(|(from, to)| {
                let db = fx.db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.with_tx(|tx| check_and_create_match(tx, from, to, at(1)))
                })
            })
            .collect();

        let decisions: Vec<MatchDecision> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().unwrap())
            .collect();

        assert_eq!(decisions.iter().filter(|d| d.created).count(), 1);
        assert_eq!(decisions[0].record.id, decisions[1].record.id);
        assert_eq!(fx.db.count_matches_between(a, b).unwrap(), 1);
    }

    #[test]
    fn inactive_match_is_not_revived() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));
        like(&fx, a, b, 1);
        like(&fx, b, a, 1);

        let decision = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, b, a, at(1)))
            .unwrap()
            .unwrap();
        fx.db
            .with_tx(|tx| unmatch(tx, a, decision.record.id))
            .unwrap();

        let again = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, a, b, at(2)))
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn unmatch_twice_ends_the_match_once() {
        let fx = Fixture::new();
        let (a, b) = (fx.student("a"), fx.student("b"));
        like(&fx, a, b, 1);
        like(&fx, b, a, 1);
        let id = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, b, a, at(1)))
            .unwrap()
            .unwrap()
            .record
            .id;

        let first = fx.db.with_tx(|tx| unmatch(tx, a, id)).unwrap();
        assert!(first.is_some_and(|m| !m.is_active));
        let second = fx.db.with_tx(|tx| unmatch(tx, b, id)).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn outsiders_cannot_unmatch() {
        let fx = Fixture::new();
        let (a, b, c) = (fx.student("a"), fx.student("b"), fx.student("c"));
        like(&fx, a, b, 1);
        like(&fx, b, a, 1);
        let decision = fx
            .db
            .with_tx(|tx| check_and_create_match(tx, b, a, at(1)))
            .unwrap()
            .unwrap();

        let result = fx.db.with_tx(|tx| unmatch(tx, c, decision.record.id));
        assert!(matches!(result, Err(MatchError::MatchNotFound)));
    }
}
