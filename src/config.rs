//! Runtime settings from the environment.
//!
//! HOST (default 0.0.0.0), PORT (8080), LEAGUE_DATA_DIR (optional CSV dataset),
//! RECONCILE_WRITE_ATTEMPTS (3, at least 1).

use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub write_attempts: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_write_attempts() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: None,
            write_attempts: default_write_attempts(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("HOST").unwrap_or_else(default_host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            data_dir: lookup("LEAGUE_DATA_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            write_attempts: lookup("RECONCILE_WRITE_ATTEMPTS")
                .and_then(|n| n.parse().ok())
                .unwrap_or_else(default_write_attempts)
                .max(1),
        }
    }
}
