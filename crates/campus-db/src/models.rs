//! Database row types. These map directly to SQLite rows and stay
//! distinct from the campus-types API models.

use chrono::{DateTime, NaiveDate, Utc};

use campus_types::models::{Match, Plan, Preferences, QuotaKind, Student, StudentId, Swipe};

pub struct StudentRow {
    pub id: StudentId,
    pub email: String,
    pub password: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub min_age: u32,
    pub max_age: u32,
    pub max_distance_km: Option<f64>,
    pub preferred_gender: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub plan: String,
    pub boosted_until: Option<DateTime<Utc>>,
    pub is_banned: bool,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

/// Read a stored plan name. Unknown values are logged and read as free.
pub fn parse_plan(student_id: StudentId, raw: &str) -> Plan {
    raw.parse().unwrap_or_else(|e| {
        tracing::warn!("Student {} has {}; treating as free", student_id, e);
        Plan::Free
    })
}

impl StudentRow {
    pub fn plan(&self) -> Plan {
        parse_plan(self.id, &self.plan)
    }

    pub fn into_student(self) -> Student {
        let plan = self.plan();
        Student {
            id: self.id,
            email: self.email,
            name: self.name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            preferences: Preferences {
                min_age: self.min_age,
                max_age: self.max_age,
                max_distance_km: self.max_distance_km,
                preferred_gender: self.preferred_gender,
            },
            latitude: self.latitude,
            longitude: self.longitude,
            plan,
            boosted_until: self.boosted_until,
            is_banned: self.is_banned,
            is_hidden: self.is_hidden,
            created_at: self.created_at,
        }
    }
}

/// Fields needed to insert a student. Quotas start full.
pub struct NewStudent<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub gender: &'a str,
    pub date_of_birth: NaiveDate,
    pub preferences: &'a Preferences,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One quota counter as stored on the student row.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaCounter {
    pub plan: Plan,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// `(remaining column, reset column)` for a quota kind.
pub(crate) fn quota_columns(kind: QuotaKind) -> (&'static str, &'static str) {
    match kind {
        QuotaKind::SuperLike => ("super_likes_remaining", "super_likes_reset_at"),
        QuotaKind::Rewind => ("rewinds_remaining", "rewinds_reset_at"),
        QuotaKind::Boost => ("boosts_remaining", "boosts_reset_at"),
    }
}

pub struct SwipeRow {
    pub id: i64,
    pub swiper_id: StudentId,
    pub swiped_id: StudentId,
    pub is_like: bool,
    pub is_super_like: bool,
    pub created_at: DateTime<Utc>,
}

impl From<SwipeRow> for Swipe {
    fn from(row: SwipeRow) -> Self {
        Swipe {
            id: row.id,
            swiper_id: row.swiper_id,
            swiped_id: row.swiped_id,
            is_like: row.is_like,
            is_super_like: row.is_super_like,
            created_at: row.created_at,
        }
    }
}

pub struct MatchRow {
    pub id: i64,
    pub student1_id: StudentId,
    pub student2_id: StudentId,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            student1_id: row.student1_id,
            student2_id: row.student2_id,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}
