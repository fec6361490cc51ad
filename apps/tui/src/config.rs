use color_eyre::eyre::{eyre, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{UnitScale, DEFAULT_DISTANCE_DIVISOR, DEFAULT_THRESHOLD_DIVISOR};
use crate::fetcher::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SCAN_PATH: &str = "/lidar/data";
/// Display magnification applied to every radius and point offset.
pub const DEFAULT_SCALE: f64 = 2.0;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Runtime settings for the viewer
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub base_url: String,
    pub scan_path: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub scale: f64,
    pub units: UnitScale,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            scan_path: DEFAULT_SCAN_PATH.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            scale: DEFAULT_SCALE,
            units: UnitScale::default(),
        }
    }
}

impl ViewerConfig {
    /// Loads `.env`, then reads overrides from the process environment
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("LIDAR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let scan_path = lookup("LIDAR_SCAN_PATH").unwrap_or_else(|| DEFAULT_SCAN_PATH.to_string());

        let poll_ms = parse_or(&lookup, "LIDAR_POLL_MS", duration_ms(DEFAULT_POLL_INTERVAL))?;
        if poll_ms == 0 {
            return Err(eyre!("LIDAR_POLL_MS must be greater than zero"));
        }
        let timeout_ms = parse_or(
            &lookup,
            "LIDAR_TIMEOUT_MS",
            duration_ms(DEFAULT_REQUEST_TIMEOUT),
        )?;

        let scale = positive(parse_or(&lookup, "LIDAR_SCALE", DEFAULT_SCALE)?, "LIDAR_SCALE")?;
        let threshold_divisor = positive(
            parse_or(&lookup, "LIDAR_THRESHOLD_DIVISOR", DEFAULT_THRESHOLD_DIVISOR)?,
            "LIDAR_THRESHOLD_DIVISOR",
        )?;
        let distance_divisor = positive(
            parse_or(&lookup, "LIDAR_DISTANCE_DIVISOR", DEFAULT_DISTANCE_DIVISOR)?,
            "LIDAR_DISTANCE_DIVISOR",
        )?;

        Ok(Self {
            base_url,
            scan_path,
            poll_interval: Duration::from_millis(poll_ms),
            request_timeout: Duration::from_millis(timeout_ms),
            scale,
            units: UnitScale {
                threshold_divisor,
                distance_divisor,
            },
        })
    }

    pub fn scan_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.scan_path.trim_start_matches('/')
        )
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid value for {key}: {raw} ({e})")),
        None => Ok(default),
    }
}

fn positive(value: f64, key: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(eyre!("{key} must be a positive number, got {value}"))
    }
}

/// Gets the path of the log file used while the terminal UI is active
pub fn get_log_path() -> PathBuf {
    env::var("LIDAR_LOG_FILE").map_or_else(|_| PathBuf::from("./lidar-gate-viz.log"), PathBuf::from)
}
