//! Dashboard configuration.
//!
//! Loaded once at startup from a TOML file and handed to the router as part
//! of its state; nothing reads configuration from globals afterwards. Every
//! field has a default, so a missing file or an empty one yields a working
//! local setup.
//!
//! ```toml
//! api_url = "https://danepubliczne.imgw.pl/api/data/hydro2"
//! snapshot_path = "hydro_data.csv"
//! boundary_path = "poland.geojson"
//! report_style = "map"
//! bind_addr = "0.0.0.0:5000"
//!
//! [logging]
//! level = "debug"
//! file = "hydro_dashboard.log"
//! ```

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ingest::imgw::{DEFAULT_TIMEOUT_SECS, IMGW_HYDRO_URL};
use crate::logging::LogLevel;
use crate::model::HydroError;
use crate::report::ReportStyle;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "HYDRO_DASHBOARD_CONFIG";

/// Configuration file used when `HYDRO_DASHBOARD_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "hydro_dashboard.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// IMGW hydro endpoint.
    pub api_url: String,
    /// Snapshot file, rewritten on every refresh.
    pub snapshot_path: PathBuf,
    /// GeoJSON country outline used by the map report.
    pub boundary_path: PathBuf,
    pub report_style: ReportStyle,
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    /// When set, every rendered index page is also written here.
    pub artifact_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: IMGW_HYDRO_URL.to_string(),
            snapshot_path: PathBuf::from("hydro_data.csv"),
            boundary_path: PathBuf::from("poland.geojson"),
            report_style: ReportStyle::Table,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            artifact_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, HydroError> {
        let config: Config = toml::from_str(text).map_err(|e| HydroError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, HydroError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(HydroError::Config(format!("cannot read {}: {}", path.display(), e))),
        }
    }

    /// Load `.env`, then the file named by `HYDRO_DASHBOARD_CONFIG`
    /// (or `hydro_dashboard.toml`).
    pub fn load() -> Result<Self, HydroError> {
        dotenv::dotenv().ok();
        let path = env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_level(&self) -> Result<LogLevel, HydroError> {
        self.logging.level.parse().map_err(HydroError::Config)
    }

    fn validate(&self) -> Result<(), HydroError> {
        if self.api_url.trim().is_empty() {
            return Err(HydroError::Config("api_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(HydroError::Config("request_timeout_secs must be positive".to_string()));
        }
        self.log_level()?;
        Ok(())
    }
}
