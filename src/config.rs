//! Application configuration loaded from environment variables (and `.env`)

use std::env;

use crate::error::ConfigError;
use crate::map::DEFAULT_ZOOM;
use crate::workout::Coords;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the workouts
    pub db_path: String,
    /// Position reported to the map; `None` means geolocation is unavailable
    pub home: Option<Coords>,
    /// Zoom for centering and panning
    pub zoom: f64,
    /// Log file used while the terminal UI owns the screen
    pub log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "stridelog.db".to_string(),
            home: None,
            zoom: DEFAULT_ZOOM,
            log_path: "stridelog.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            db_path: env::var("STRIDELOG_DB").unwrap_or(defaults.db_path),
            home: env::var("STRIDELOG_HOME")
                .ok()
                .map(|v| parse_coords("STRIDELOG_HOME", &v))
                .transpose()?,
            zoom: match env::var("STRIDELOG_ZOOM") {
                Ok(v) => parse_zoom("STRIDELOG_ZOOM", &v)?,
                Err(_) => defaults.zoom,
            },
            log_path: env::var("STRIDELOG_LOG").unwrap_or(defaults.log_path),
        })
    }
}

/// Parse `"lat,lng"`
pub fn parse_coords(key: &'static str, value: &str) -> Result<Coords, ConfigError> {
    let invalid = || ConfigError::Invalid { key, value: value.to_string() };

    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Coords::new(lat, lng).validate().map_err(|_| invalid())
}

pub fn parse_zoom(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(z) if (0.0..=20.0).contains(&z) => Ok(z),
        _ => Err(ConfigError::Invalid { key, value: value.to_string() }),
    }
}
