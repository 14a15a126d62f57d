use chrono::{DateTime, Months, NaiveDate, Utc};

use campus_db::queries;
use campus_db::rusqlite::Connection;
use campus_types::models::{Student, StudentId};

use crate::error::{MatchError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;
const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub student: Student,
    pub age: u32,
    pub distance_km: Option<f64>,
    pub boosted: bool,
}

/// Great-circle distance between two `(lat, lon)` points in degrees.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Inclusive date-of-birth range for an age window on `today`, widened by a
/// day on each side. The exact age check still runs on every row.
fn birth_range(today: NaiveDate, min_age: u32, max_age: u32) -> (NaiveDate, NaiveDate) {
    let years_back = |years: u32| today.checked_sub_months(Months::new(years.saturating_mul(12)));
    let earliest = years_back(max_age.saturating_add(1)).unwrap_or(NaiveDate::MIN);
    let latest = years_back(min_age).unwrap_or(NaiveDate::MIN);
    (earliest.pred_opt().unwrap_or(earliest), latest.succ_opt().unwrap_or(latest))
}

/// Profiles `viewer` has not swiped on yet, filtered by their preferences.
/// Distance is only enforced when both sides have a location and the viewer
/// set a maximum.
pub fn discover(
    conn: &Connection,
    viewer_id: StudentId,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Candidate>> {
    let viewer = queries::student_by_id(conn, viewer_id)?
        .ok_or(MatchError::StudentNotFound)?
        .into_student();
    let prefs = &viewer.preferences;
    let origin = viewer.latitude.zip(viewer.longitude);
    let today = now.date_naive();
    let born = birth_range(today, prefs.min_age, prefs.max_age);
    let page_size = limit.max(PAGE_SIZE);

    let mut candidates = Vec::with_capacity(limit);
    let mut offset = 0;
    while candidates.len() < limit {
        let rows = queries::discovery_candidates(
            conn,
            viewer_id,
            prefs.preferred_gender.as_deref(),
            born,
            now,
            page_size,
            offset,
        )?;
        let exhausted = rows.len() < page_size;
        offset += rows.len();

        for student in rows.into_iter().map(|row| row.into_student()) {
            if candidates.len() == limit {
                break;
            }

            let age = student.age_on(today);
            if age < prefs.min_age || age > prefs.max_age {
                continue;
            }

            let distance_km = origin
                .zip(student.latitude.zip(student.longitude))
                .map(|(from, to)| haversine_km(from, to));
            if let (Some(max), Some(d)) = (prefs.max_distance_km, distance_km) {
                if d > max {
                    continue;
                }
            }

            let boosted = student.boosted_until.is_some_and(|until| until > now);
            candidates.push(Candidate {
                student,
                age,
                distance_km,
                boosted,
            });
        }

        if exhausted {
            break;
        }
    }

    Ok(candidates)
}
