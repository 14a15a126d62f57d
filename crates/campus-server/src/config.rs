use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use tracing::info;

use campus_match::{PlanLimits, QuotaPolicy};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Up to one year. A non-positive window would refill on every read.
const WINDOW_HOURS: RangeInclusive<i64> = 1..=24 * 366;
const BOOST_MINUTES: RangeInclusive<i64> = 1..=24 * 60;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub email_domain: Option<String>,
    pub quota: QuotaPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("CAMPUS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CAMPUS_JWT_SECRET is unset or still a placeholder");
        }

        let defaults = QuotaPolicy::default();
        let quota = QuotaPolicy {
            free: PlanLimits {
                super_likes: try_load("CAMPUS_FREE_SUPER_LIKES", defaults.free.super_likes)?,
                rewinds: try_load("CAMPUS_FREE_REWINDS", defaults.free.rewinds)?,
                boosts: try_load("CAMPUS_FREE_BOOSTS", defaults.free.boosts)?,
            },
            premium: PlanLimits {
                super_likes: try_load("CAMPUS_PREMIUM_SUPER_LIKES", defaults.premium.super_likes)?,
                rewinds: try_load("CAMPUS_PREMIUM_REWINDS", defaults.premium.rewinds)?,
                boosts: try_load("CAMPUS_PREMIUM_BOOSTS", defaults.premium.boosts)?,
            },
            window: Duration::hours(within(
                "CAMPUS_QUOTA_WINDOW_HOURS",
                try_load("CAMPUS_QUOTA_WINDOW_HOURS", 24)?,
                WINDOW_HOURS,
            )?),
            boost_duration: Duration::minutes(within(
                "CAMPUS_BOOST_MINUTES",
                try_load("CAMPUS_BOOST_MINUTES", 30)?,
                BOOST_MINUTES,
            )?),
        };

        Ok(Self {
            host: try_load("CAMPUS_HOST", "0.0.0.0".to_string())?,
            port: try_load("CAMPUS_PORT", 3000)?,
            db_path: PathBuf::from(try_load("CAMPUS_DB_PATH", "campusmatch.db".to_string())?),
            jwt_secret,
            email_domain: env::var("CAMPUS_EMAIL_DOMAIN").ok().filter(|d| !d.is_empty()),
            quota,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("Invalid {} value: {}", key, raw)),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

fn within(key: &str, value: i64, range: RangeInclusive<i64>) -> Result<i64> {
    if !range.contains(&value) {
        bail!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(value)
}
