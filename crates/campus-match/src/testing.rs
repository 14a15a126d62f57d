use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use campus_db::Database;
use campus_db::models::NewStudent;
use campus_types::events::Notification;
use campus_types::models::{Preferences, StudentId};

use crate::accounts;
use crate::config::QuotaPolicy;
use crate::notify::Notifier;

/// `hours` after a fixed epoch, so tests never depend on the wall clock.
pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap() + Duration::hours(hours)
}

pub struct Fixture {
    pub db: Arc<Database>,
    pub policy: QuotaPolicy,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(QuotaPolicy::default())
    }

    pub fn with_policy(policy: QuotaPolicy) -> Self {
        Self {
            db: Arc::new(Database::open_in_memory().unwrap()),
            policy,
        }
    }

    pub fn student(&self, name: &str) -> StudentId {
        self.student_with(name, "female", 2003, None)
    }

    pub fn student_with(&self, name: &str, gender: &str, born: i32, location: Option<(f64, f64)>) -> StudentId {
        let email = format!("{}@campus.edu", name);
        let prefs = Preferences::default();
        let new = NewStudent {
            email: &email,
            password_hash: "not-a-hash",
            name,
            gender,
            date_of_birth: NaiveDate::from_ymd_opt(born, 6, 15).unwrap(),
            preferences: &prefs,
            latitude: location.map(|l| l.0),
            longitude: location.map(|l| l.1),
        };
        self.db
            .with_tx(|tx| accounts::register(tx, &self.policy, &new, at(0)))
            .unwrap()
    }
}

/// Notifier that remembers everything it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(StudentId, Notification)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, student_id: StudentId, notification: Notification) {
        self.sent.lock().unwrap().push((student_id, notification));
    }
}
