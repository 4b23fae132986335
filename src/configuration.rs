use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use route_structure::fallback::DEFAULT_ROUTE_ID;

use crate::eta::DEFAULT_CRUISE_SPEED_KMPH;

pub const DEFAULT_DB_PATH: &str = "routepulse.db";
/// Value of `ROUTEPULSE_DB` that opts out of on-disk cursor state.
pub const IN_MEMORY_DB: &str = "memory";

pub struct Configuration {
    pub route_id: String,
    /// URL template containing `{id}`; no live provider when unset
    pub live_url: Option<String>,
    pub live_token: Option<String>,
    pub poll_interval: std::time::Duration,
    pub frame_interval: std::time::Duration,
    pub animation_duration: Duration,
    pub cruise_speed_kmph: f64,
    /// SQLite file for cursor state; `None` keeps it in memory only
    pub db_path: Option<PathBuf>,
    pub port: u16,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            route_id: DEFAULT_ROUTE_ID.to_string(),
            live_url: None,
            live_token: None,
            poll_interval: std::time::Duration::from_secs(30),
            frame_interval: std::time::Duration::from_millis(1000),
            animation_duration: Duration::seconds(30),
            cruise_speed_kmph: DEFAULT_CRUISE_SPEED_KMPH,
            db_path: Some(PathBuf::from(DEFAULT_DB_PATH)),
            port: 3030,
        }
    }
}

impl Configuration {
    /// Reads `ROUTEPULSE_*` variables; the first CLI argument overrides the route id.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), std::env::args().nth(1))
    }

    fn from_lookup<F>(lookup: F, route_arg: Option<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Configuration::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let route_id = route_arg
            .or_else(|| non_empty("ROUTEPULSE_ROUTE_ID"))
            .unwrap_or(defaults.route_id);

        let poll_secs: u64 = parse_or(&non_empty, "ROUTEPULSE_POLL_SECS", 30)?;
        let frame_millis: u64 = parse_or(&non_empty, "ROUTEPULSE_FRAME_MILLIS", 1000)?;
        let animation_millis: i64 = parse_or(&non_empty, "ROUTEPULSE_ANIMATION_MILLIS", 30_000)?;
        let cruise_speed_kmph: f64 =
            parse_or(&non_empty, "ROUTEPULSE_CRUISE_KMPH", DEFAULT_CRUISE_SPEED_KMPH)?;
        let port: u16 = parse_or(&non_empty, "ROUTEPULSE_PORT", defaults.port)?;

        if !(cruise_speed_kmph.is_finite() && cruise_speed_kmph > 0.0) {
            bail!("ROUTEPULSE_CRUISE_KMPH must be positive, got {cruise_speed_kmph}");
        }
        if poll_secs == 0 || frame_millis == 0 {
            bail!("Poll and frame intervals must be non-zero");
        }
        if animation_millis < 0 {
            bail!("ROUTEPULSE_ANIMATION_MILLIS must not be negative");
        }

        Ok(Configuration {
            route_id,
            live_url: non_empty("ROUTEPULSE_LIVE_URL"),
            live_token: non_empty("ROUTEPULSE_LIVE_TOKEN"),
            poll_interval: std::time::Duration::from_secs(poll_secs),
            frame_interval: std::time::Duration::from_millis(frame_millis),
            animation_duration: Duration::milliseconds(animation_millis),
            cruise_speed_kmph,
            db_path: match non_empty("ROUTEPULSE_DB") {
                Some(v) if v.trim().eq_ignore_ascii_case(IN_MEMORY_DB) => None,
                Some(v) => Some(PathBuf::from(v)),
                None => defaults.db_path,
            },
            port,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
