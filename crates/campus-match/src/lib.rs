//! Swipe-and-match engine.
//!
//! Every public operation on [`MatchEngine`] runs in a single SQLite
//! transaction, so quota consumption, swipe rows and match rows move
//! together. Notifications go out only after the transaction commits.

pub mod accounts;
pub mod blocks;
pub mod config;
pub mod discovery;
pub mod error;
pub mod matcher;
pub mod notify;
pub mod quota;
pub mod rewind;
pub mod swipe;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use campus_db::Database;
use campus_db::models::NewStudent;
use campus_db::queries;
use campus_types::events::Notification;
use campus_types::models::{Match, Plan, QuotaKind, QuotaSnapshot, StudentId};

pub use config::{PlanLimits, QuotaPolicy};
pub use discovery::Candidate;
pub use error::{MatchError, Result};
pub use notify::Notifier;
pub use rewind::UndoOutcome;
pub use swipe::SwipeOutcome;

pub struct MatchEngine {
    db: Arc<Database>,
    policy: QuotaPolicy,
    notifier: Arc<dyn Notifier>,
}

impl MatchEngine {
    pub fn new(db: Arc<Database>, policy: QuotaPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            policy,
            notifier,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn register(&self, new: &NewStudent<'_>, now: DateTime<Utc>) -> Result<StudentId> {
        self.db.with_tx(|tx| accounts::register(tx, &self.policy, new, now))
    }

    pub fn record_swipe(
        &self,
        swiper: StudentId,
        target: StudentId,
        is_like: bool,
        is_super_like: bool,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome> {
        let outcome = self.db.with_tx(|tx| {
            swipe::record_swipe(tx, &self.policy, swiper, target, is_like, is_super_like, now)
        })?;

        if let Some(record) = &outcome.new_match {
            notify::announce_match(self.notifier.as_ref(), record);
        }
        Ok(outcome)
    }

    pub fn undo_last_swipe(&self, student_id: StudentId, now: DateTime<Utc>) -> Result<UndoOutcome> {
        self.db
            .with_tx(|tx| rewind::undo_last_swipe(tx, &self.policy, student_id, now))
    }

    /// Plan and live balances, with lazy resets applied.
    pub fn quotas(&self, student_id: StudentId, now: DateTime<Utc>) -> Result<(Plan, Vec<QuotaSnapshot>)> {
        self.db.with_tx(|tx| {
            let student = queries::student_by_id(tx, student_id)?.ok_or(MatchError::StudentNotFound)?;
            let snapshots = QuotaKind::ALL
                .into_iter()
                .map(|kind| quota::current(tx, &self.policy, student_id, kind, now))
                .collect::<Result<Vec<_>>>()?;
            Ok((student.plan(), snapshots))
        })
    }

    pub fn change_plan(&self, student_id: StudentId, plan: Plan, now: DateTime<Utc>) -> Result<Vec<QuotaSnapshot>> {
        self.db
            .with_tx(|tx| accounts::change_plan(tx, &self.policy, student_id, plan, now))
    }

    pub fn boost(&self, student_id: StudentId, now: DateTime<Utc>) -> Result<(DateTime<Utc>, u32)> {
        self.db
            .with_tx(|tx| accounts::boost(tx, &self.policy, student_id, now))
    }

    pub fn block(&self, blocker: StudentId, blocked: StudentId, now: DateTime<Utc>) -> Result<()> {
        let ended = self.db.with_tx(|tx| blocks::block(tx, blocker, blocked, now))?;
        if let Some(record) = ended {
            self.announce_end(&record, blocker);
        }
        Ok(())
    }

    /// End a match. Unmatching an already inactive match succeeds quietly.
    pub fn unmatch(&self, student_id: StudentId, match_id: i64) -> Result<Option<Match>> {
        let ended = self
            .db
            .with_tx(|tx| matcher::unmatch(tx, student_id, match_id))?;
        if let Some(record) = &ended {
            self.announce_end(record, student_id);
        }
        Ok(ended)
    }

    pub fn discover(&self, viewer: StudentId, limit: usize, now: DateTime<Utc>) -> Result<Vec<Candidate>> {
        self.db
            .with_tx(|tx| discovery::discover(tx, viewer, limit, now))
    }

    fn announce_end(&self, record: &Match, initiator: StudentId) {
        self.notifier.notify(
            record.other(initiator),
            Notification::MatchEnded {
                match_id: record.id,
            },
        );
    }
}
