//! Runtime configuration
//!
//! Collects the credential, endpoint, locale and cache settings the service
//! needs. The binary builds a [`Config`] from parsed CLI arguments; library
//! users construct one directly or start from [`Config::default`].

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::data::weather::{usable_credential, OPENWEATHERMAP_BASE_URL};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the weather service
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenWeatherMap API key, possibly a placeholder
    pub api_key: Option<String>,
    /// API host, without a trailing slash
    pub base_url: String,
    /// Unit system passed to the API ("metric")
    pub units: String,
    /// Response language passed to the API ("kr")
    pub lang: String,
    /// Deadline applied to every HTTP request
    pub request_timeout: Duration,
    /// Directory for the on-disk cache; `None` uses the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// Keep the cache in memory only
    pub memory_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENWEATHERMAP_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "kr".to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            cache_dir: None,
            memory_cache: false,
        }
    }
}

impl Config {
    /// The API key, unless it is missing or a placeholder
    pub fn credential(&self) -> Option<&str> {
        usable_credential(self.api_key.as_deref())
    }

    /// Resolves the cache directory
    ///
    /// Uses `~/.cache/nalssi/` on Linux, or the equivalent XDG path on other
    /// platforms. Returns `None` if no directory can be determined and none
    /// was configured.
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(|| {
            ProjectDirs::from("", "", "nalssi").map(|dirs| dirs.cache_dir().to_path_buf())
        })
    }
}
