use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use campus_types::models::{Plan, Preferences, QuotaKind, StudentId, canonical_pair};

use crate::models::{MatchRow, NewStudent, QuotaCounter, StudentRow, SwipeRow, parse_plan, quota_columns};
use crate::{Database, is_unique_violation};

const STUDENT_COLUMNS: &str = "id, email, password, name, gender, date_of_birth, min_age, max_age,
     max_distance_km, preferred_gender, latitude, longitude, plan, boosted_until,
     is_banned, is_hidden, created_at";

const SWIPE_COLUMNS: &str = "id, swiper_id, swiped_id, is_like, is_super_like, created_at";

const MATCH_COLUMNS: &str = "id, student1_id, student2_id, created_at, is_active";

impl Database {
    // -- Students --

    pub fn get_student(&self, id: StudentId) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| student_by_id(conn, id))
    }

    pub fn get_student_by_email(&self, email: &str) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| student_by_email(conn, email))
    }

    pub fn update_preferences(
        &self,
        id: StudentId,
        prefs: &Preferences,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE students
                 SET min_age = ?2, max_age = ?3, max_distance_km = ?4, preferred_gender = ?5,
                     latitude = ?6, longitude = ?7
                 WHERE id = ?1",
                params![
                    id,
                    prefs.min_age,
                    prefs.max_age,
                    prefs.max_distance_km,
                    prefs.preferred_gender,
                    latitude,
                    longitude
                ],
            )?;
            Ok(changed == 1)
        })
    }

    /// Moderation flag. Banned students can neither swipe nor be swiped on.
    pub fn set_banned(&self, id: StudentId, banned: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE students SET is_banned = ?2 WHERE id = ?1",
                params![id, banned],
            )?;
            Ok(())
        })
    }

    // -- Matches --

    pub fn get_active_matches(&self, student_id: StudentId) -> Result<Vec<(MatchRow, String)>> {
        self.with_conn(|conn| active_matches_for(conn, student_id))
    }

    pub fn count_matches_between(&self, a: StudentId, b: StudentId) -> Result<i64> {
        let (s1, s2) = canonical_pair(a, b);
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM matches WHERE student1_id = ?1 AND student2_id = ?2",
                params![s1, s2],
                |r| r.get(0),
            )?;
            Ok(n)
        })
    }
}

// -- Students --

fn map_student(row: &Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        gender: row.get(4)?,
        date_of_birth: row.get(5)?,
        min_age: row.get(6)?,
        max_age: row.get(7)?,
        max_distance_km: row.get(8)?,
        preferred_gender: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
        plan: row.get(12)?,
        boosted_until: row.get(13)?,
        is_banned: row.get(14)?,
        is_hidden: row.get(15)?,
        created_at: row.get(16)?,
    })
}

/// Insert a student with empty, already-expired quota counters. Callers
/// refill them in the same transaction.
pub fn insert_student(conn: &Connection, new: &NewStudent<'_>, now: DateTime<Utc>) -> Result<Option<StudentId>> {
    let result = conn.execute(
        "INSERT INTO students (
            email, password, name, gender, date_of_birth, min_age, max_age, max_distance_km,
            preferred_gender, latitude, longitude, plan,
            super_likes_remaining, super_likes_reset_at, rewinds_remaining, rewinds_reset_at,
            boosts_remaining, boosts_reset_at, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13, 0, ?13, 0, ?13, ?13)",
        params![
            new.email,
            new.password_hash,
            new.name,
            new.gender,
            new.date_of_birth,
            new.preferences.min_age,
            new.preferences.max_age,
            new.preferences.max_distance_km,
            new.preferences.preferred_gender,
            new.latitude,
            new.longitude,
            Plan::Free.as_str(),
            now,
        ],
    );

    match result {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn student_by_id(conn: &Connection, id: StudentId) -> Result<Option<StudentRow>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS);
    let row = conn.query_row(&sql, [id], map_student).optional()?;
    Ok(row)
}

pub fn student_by_email(conn: &Connection, email: &str) -> Result<Option<StudentRow>> {
    let sql = format!("SELECT {} FROM students WHERE email = ?1", STUDENT_COLUMNS);
    let row = conn.query_row(&sql, [email], map_student).optional()?;
    Ok(row)
}

pub fn set_plan(conn: &Connection, id: StudentId, plan: Plan) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET plan = ?2 WHERE id = ?1",
        params![id, plan.as_str()],
    )?;
    Ok(changed == 1)
}

pub fn set_boosted_until(conn: &Connection, id: StudentId, until: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "UPDATE students SET boosted_until = ?2 WHERE id = ?1",
        params![id, until],
    )?;
    Ok(())
}

/// Candidates not yet swiped by `viewer`, visible, unbanned, unblocked in
/// either direction and matching `gender` when given. Boosted profiles first.
/// One page of discovery candidates for `viewer`, boosted profiles first.
/// `born` is an inclusive date-of-birth range.
pub fn discovery_candidates(
    conn: &Connection,
    viewer: StudentId,
    gender: Option<&str>,
    born: (NaiveDate, NaiveDate),
    now: DateTime<Utc>,
    limit: usize,
    offset: usize,
) -> Result<Vec<StudentRow>> {
    let sql = format!(
        "SELECT {} FROM students s
         WHERE s.id != ?1
           AND s.is_banned = 0
           AND s.is_hidden = 0
           AND (?2 IS NULL OR s.gender = ?2)
           AND s.date_of_birth BETWEEN ?3 AND ?4
           AND NOT EXISTS (
               SELECT 1 FROM swipes w WHERE w.swiper_id = ?1 AND w.swiped_id = s.id)
           AND NOT EXISTS (
               SELECT 1 FROM blocks b
               WHERE (b.blocker_id = ?1 AND b.blocked_id = s.id)
                  OR (b.blocker_id = s.id AND b.blocked_id = ?1))
         ORDER BY (s.boosted_until IS NOT NULL AND s.boosted_until > ?5) DESC, s.id ASC
         LIMIT ?6 OFFSET ?7",
        STUDENT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![viewer, gender, born.0, born.1, now, limit as i64, offset as i64],
            map_student,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Quotas --

pub fn quota_counter(conn: &Connection, id: StudentId, kind: QuotaKind) -> Result<Option<QuotaCounter>> {
    let (remaining_col, reset_col) = quota_columns(kind);
    let sql = format!(
        "SELECT plan, {}, {} FROM students WHERE id = ?1",
        remaining_col, reset_col
    );
    let counter = conn
        .query_row(&sql, [id], |row| {
            let plan: String = row.get(0)?;
            Ok(QuotaCounter {
                plan: parse_plan(id, &plan),
                remaining: row.get(1)?,
                reset_at: row.get(2)?,
            })
        })
        .optional()?;
    Ok(counter)
}

pub fn store_quota_counter(
    conn: &Connection,
    id: StudentId,
    kind: QuotaKind,
    remaining: u32,
    reset_at: DateTime<Utc>,
) -> Result<()> {
    let (remaining_col, reset_col) = quota_columns(kind);
    let sql = format!(
        "UPDATE students SET {} = ?2, {} = ?3 WHERE id = ?1",
        remaining_col, reset_col
    );
    conn.execute(&sql, params![id, remaining, reset_at])?;
    Ok(())
}

// -- Blocks --

pub fn is_blocked_between(conn: &Connection, a: StudentId, b: StudentId) -> Result<bool> {
    let blocked = conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM blocks
             WHERE (blocker_id = ?1 AND blocked_id = ?2) OR (blocker_id = ?2 AND blocked_id = ?1))",
        params![a, b],
        |r| r.get(0),
    )?;
    Ok(blocked)
}

/// Returns false when the block already existed.
pub fn insert_block(conn: &Connection, blocker: StudentId, blocked: StudentId, now: DateTime<Utc>) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO blocks (blocker_id, blocked_id, created_at) VALUES (?1, ?2, ?3)",
        params![blocker, blocked, now],
    )?;
    Ok(inserted == 1)
}

// -- Swipes --

fn map_swipe(row: &Row<'_>) -> rusqlite::Result<SwipeRow> {
    Ok(SwipeRow {
        id: row.get(0)?,
        swiper_id: row.get(1)?,
        swiped_id: row.get(2)?,
        is_like: row.get(3)?,
        is_super_like: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn swipe_exists(conn: &Connection, swiper: StudentId, swiped: StudentId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM swipes WHERE swiper_id = ?1 AND swiped_id = ?2)",
        params![swiper, swiped],
        |r| r.get(0),
    )?;
    Ok(exists)
}

/// Returns `None` when a swipe for the ordered pair already exists.
pub fn insert_swipe(
    conn: &Connection,
    swiper: StudentId,
    swiped: StudentId,
    is_like: bool,
    is_super_like: bool,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    let result = conn.execute(
        "INSERT INTO swipes (swiper_id, swiped_id, is_like, is_super_like, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![swiper, swiped, is_like, is_super_like, now],
    );

    match result {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn like_exists(conn: &Connection, swiper: StudentId, swiped: StudentId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM swipes WHERE swiper_id = ?1 AND swiped_id = ?2 AND is_like = 1)",
        params![swiper, swiped],
        |r| r.get(0),
    )?;
    Ok(exists)
}

/// Most recent swipe made by `swiper`. Ties on `created_at` go to the higher id.
pub fn latest_swipe_by(conn: &Connection, swiper: StudentId) -> Result<Option<SwipeRow>> {
    let sql = format!(
        "SELECT {} FROM swipes WHERE swiper_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
        SWIPE_COLUMNS
    );
    let row = conn.query_row(&sql, [swiper], map_swipe).optional()?;
    Ok(row)
}

pub fn delete_swipe(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM swipes WHERE id = ?1", [id])?;
    Ok(deleted == 1)
}

// -- Matches --

fn map_match(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: row.get(0)?,
        student1_id: row.get(1)?,
        student2_id: row.get(2)?,
        created_at: row.get(3)?,
        is_active: row.get(4)?,
    })
}

pub fn match_by_pair(conn: &Connection, a: StudentId, b: StudentId) -> Result<Option<MatchRow>> {
    let (s1, s2) = canonical_pair(a, b);
    let sql = format!(
        "SELECT {} FROM matches WHERE student1_id = ?1 AND student2_id = ?2",
        MATCH_COLUMNS
    );
    let row = conn.query_row(&sql, params![s1, s2], map_match).optional()?;
    Ok(row)
}

pub fn match_by_id(conn: &Connection, id: i64) -> Result<Option<MatchRow>> {
    let sql = format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS);
    let row = conn.query_row(&sql, [id], map_match).optional()?;
    Ok(row)
}

/// Insert the canonical pair. Returns `None` if the unique constraint on
/// the pair rejected the row.
pub fn insert_match(conn: &Connection, a: StudentId, b: StudentId, now: DateTime<Utc>) -> Result<Option<i64>> {
    let (s1, s2) = canonical_pair(a, b);
    let result = conn.execute(
        "INSERT INTO matches (student1_id, student2_id, created_at, is_active) VALUES (?1, ?2, ?3, 1)",
        params![s1, s2, now],
    );

    match result {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn deactivate_match(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE matches SET is_active = 0 WHERE id = ?1 AND is_active = 1",
        [id],
    )?;
    Ok(changed == 1)
}

/// Active matches for a student, paired with the other party's name. Newest first.
pub fn active_matches_for(conn: &Connection, student_id: StudentId) -> Result<Vec<(MatchRow, String)>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.student1_id, m.student2_id, m.created_at, m.is_active, s.name
         FROM matches m
         JOIN students s
           ON s.id = CASE WHEN m.student1_id = ?1 THEN m.student2_id ELSE m.student1_id END
         WHERE (m.student1_id = ?1 OR m.student2_id = ?1) AND m.is_active = 1
         ORDER BY m.created_at DESC, m.id DESC",
    )?;

    let rows = stmt
        .query_map([student_id], |row| Ok((map_match(row)?, row.get::<_, String>(5)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
