use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type StudentId = i64;

/// Subscription tier. Decides the per-window quota ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => Err(format!("unknown plan: {}", other)),
        }
    }
}

/// Premium actions with a daily allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuotaKind {
    SuperLike,
    Rewind,
    Boost,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 3] = [Self::SuperLike, Self::Rewind, Self::Boost];
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SuperLike => "super-like",
            Self::Rewind => "rewind",
            Self::Boost => "boost",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub min_age: u32,
    pub max_age: u32,
    pub max_distance_km: Option<f64>,
    /// `None` means any gender.
    pub preferred_gender: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 99,
            max_distance_km: None,
            preferred_gender: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub email: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub preferences: Preferences,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub plan: Plan,
    pub boosted_until: Option<DateTime<Utc>>,
    pub is_banned: bool,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Whole years of age on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.date_of_birth).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub id: i64,
    pub swiper_id: StudentId,
    pub swiped_id: StudentId,
    pub is_like: bool,
    pub is_super_like: bool,
    pub created_at: DateTime<Utc>,
}

/// Undirected pair. `student1_id < student2_id` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    pub student1_id: StudentId,
    pub student2_id: StudentId,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Match {
    pub fn other(&self, me: StudentId) -> StudentId {
        if self.student1_id == me {
            self.student2_id
        } else {
            self.student1_id
        }
    }

    pub fn involves(&self, id: StudentId) -> bool {
        self.student1_id == id || self.student2_id == id
    }
}

/// Order two ids into the stored `(student1_id, student2_id)` form.
pub fn canonical_pair(a: StudentId, b: StudentId) -> (StudentId, StudentId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub kind: QuotaKind,
    pub remaining: u32,
    pub limit: u32,
    pub reset_at: DateTime<Utc>,
}
