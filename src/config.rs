use anyhow::{Context, Result};
use chrono::{Duration, NaiveTime};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub log_dir: String,

    // Rate limiting
    pub rate_kiosk_per_min: u32,
    pub rate_admin_per_min: u32,

    pub api_prefix: String,

    pub policy: AttendancePolicy,
}

/// Business-time thresholds used by the resolver.
#[derive(Debug, Clone)]
pub struct AttendancePolicy {
    /// An Entry older than this is closed automatically on the next scan.
    pub stale_entry: Duration,
    /// Shortest gap accepted between an Entry and its Exit.
    pub min_interval: Duration,
    /// Grace window for late entries and early exits.
    pub tolerance: Duration,
    pub skip_weekends: bool,
    pub auto_close: AutoClosePolicy,
}

/// Where a synthetic Exit lands, based on the time of day of the stale Entry.
#[derive(Debug, Clone)]
pub struct AutoClosePolicy {
    pub shift_length: Duration,
    pub morning_start: NaiveTime,
    pub afternoon_start: NaiveTime,
    pub afternoon_end: NaiveTime,
    pub afternoon_fixed_exit: NaiveTime,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            stale_entry: Duration::hours(12),
            min_interval: Duration::minutes(30),
            tolerance: Duration::minutes(10),
            skip_weekends: true,
            auto_close: AutoClosePolicy::default(),
        }
    }
}

impl Default for AutoClosePolicy {
    fn default() -> Self {
        Self {
            shift_length: Duration::hours(9),
            morning_start: hm(5, 0),
            afternoon_start: hm(13, 30),
            afternoon_end: hm(21, 0),
            afternoon_fixed_exit: hm(21, 30),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_kiosk_per_min: env_or("RATE_KIOSK_PER_MIN", 120)?,
            rate_admin_per_min: env_or("RATE_ADMIN_PER_MIN", 600)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            policy: AttendancePolicy::from_env()?,
        })
    }
}

impl AttendancePolicy {
    pub fn from_env() -> Result<Self> {
        let defaults = AutoClosePolicy::default();

        Ok(Self {
            stale_entry: hours(env_or("STALE_ENTRY_HOURS", 12)?),
            min_interval: minutes(env_or("MIN_INTERVAL_MINUTES", 30)?),
            tolerance: minutes(env_or("TOLERANCE_MINUTES", 10)?),
            skip_weekends: env_or("SKIP_WEEKENDS", true)?,
            auto_close: AutoClosePolicy {
                shift_length: hours(env_or("AUTO_CLOSE_SHIFT_HOURS", 9)?),
                morning_start: env_time_or("MORNING_WINDOW_START", defaults.morning_start)?,
                afternoon_start: env_time_or("AFTERNOON_WINDOW_START", defaults.afternoon_start)?,
                afternoon_end: env_time_or("AFTERNOON_WINDOW_END", defaults.afternoon_end)?,
                afternoon_fixed_exit: env_time_or(
                    "AFTERNOON_FIXED_EXIT",
                    defaults.afternoon_fixed_exit,
                )?,
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

// Unsigned input keeps thresholds non-negative and inside chrono's range.
fn hours(value: u32) -> Duration {
    Duration::hours(i64::from(value))
}

fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

fn env_time_or(key: &str, default: NaiveTime) -> Result<NaiveTime> {
    match env::var(key) {
        Ok(raw) => parse_time_of_day(&raw).with_context(|| format!("{key} must look like HH:MM")),
        Err(_) => Ok(default),
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("invalid time of day {raw:?}"))
}
