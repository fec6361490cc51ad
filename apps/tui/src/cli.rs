use clap::{CommandFactory, Parser};

use crate::messaging::WindowRole;

#[derive(Debug, Parser)]
#[command(name = "lidar-gate-viz", version, about = "Live radar view of a lidar gate")]
pub struct CliArgs {
    /// Base URL of the scan server
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Path of the scan snapshot endpoint
    #[arg(long = "scan-path", value_name = "PATH")]
    pub scan_path: Option<String>,

    /// Polling interval in milliseconds
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Display magnification
    #[arg(long)]
    pub scale: Option<f64>,

    /// Divisor converting the native threshold into display units
    #[arg(long = "threshold-divisor")]
    pub threshold_divisor: Option<f64>,

    /// Divisor converting native point distances into display units
    #[arg(long = "distance-divisor")]
    pub distance_divisor: Option<f64>,

    /// Whether this window may open secondary displays
    #[arg(long, value_enum, default_value_t = WindowRole::Primary)]
    pub role: WindowRole,

    /// Relay address (host:port) delivering display requests
    #[arg(long, value_name = "ADDR")]
    pub relay: Option<String>,

    /// Program used to open a secondary display
    #[arg(long = "open-with", value_name = "PROGRAM")]
    pub open_with: Option<String>,

    /// Fetch one snapshot, print stats and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless stats as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override log file path
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(endpoint) = &self.endpoint {
            std::env::set_var("LIDAR_BASE_URL", endpoint);
        }
        if let Some(path) = &self.scan_path {
            std::env::set_var("LIDAR_SCAN_PATH", path);
        }
        if let Some(ms) = self.interval_ms {
            std::env::set_var("LIDAR_POLL_MS", ms.to_string());
        }
        if let Some(scale) = self.scale {
            std::env::set_var("LIDAR_SCALE", scale.to_string());
        }
        if let Some(divisor) = self.threshold_divisor {
            std::env::set_var("LIDAR_THRESHOLD_DIVISOR", divisor.to_string());
        }
        if let Some(divisor) = self.distance_divisor {
            std::env::set_var("LIDAR_DISTANCE_DIVISOR", divisor.to_string());
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("LIDAR_LOG_FILE", path);
        }
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_primary_role() {
        let args = CliArgs::parse_from(["lidar-gate-viz"]);
        assert_eq!(args.role, WindowRole::Primary);
        assert!(!args.headless);
    }

    #[test]
    fn parses_overrides() {
        let args = CliArgs::parse_from([
            "lidar-gate-viz",
            "--endpoint",
            "http://timer.local:5000",
            "--interval-ms",
            "250",
            "--role",
            "secondary",
            "--headless",
            "--json",
        ]);
        assert_eq!(args.endpoint.as_deref(), Some("http://timer.local:5000"));
        assert_eq!(args.interval_ms, Some(250));
        assert_eq!(args.role, WindowRole::Secondary);
        assert!(args.headless && args.json);
    }

    #[test]
    fn help_mentions_endpoint() {
        assert!(CliArgs::help_text().contains("--endpoint"));
    }
}
