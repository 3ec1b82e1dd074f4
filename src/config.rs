//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the platform config directory, or the file given with `--config`
//! 3. `WALLSTASH_*` environment variables (e.g. `WALLSTASH_CACHE_CAPACITY=20`)
//! 4. CLI flags, applied by the caller after loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::download::{DownloadConfig, DEFAULT_WORKERS, MAX_QUALITY};

/// Folder created inside the user's pictures directory.
pub const DOWNLOAD_FOLDER: &str = "WallHaven Wallpapers";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "WALLSTASH_";

const DEFAULT_API_BASE_URL: &str = "https://wallhaven.cc/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has the wrong types.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// The merged values are out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where downloaded wallpapers are saved and indexed.
    pub download_dir: PathBuf,
    /// Number of full photos kept in memory.
    pub cache_capacity: usize,
    /// Encoder quality (0-100) for lossy formats.
    pub save_quality: u8,
    /// Worker threads used for downloads.
    pub download_workers: usize,
    /// Root of the wallpaper site's JSON API.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            save_quality: MAX_QUALITY,
            download_workers: DEFAULT_WORKERS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `{Pictures}/WallHaven Wallpapers`, falling back to `~/Pictures` and then
/// to a relative `Pictures` directory.
fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| {
            dirs.picture_dir()
                .map(Path::to_path_buf)
                .or_else(|| Some(dirs.home_dir().join("Pictures")))
        })
        .unwrap_or_else(|| PathBuf::from("Pictures"))
        .join(DOWNLOAD_FOLDER)
}

impl Config {
    /// Load defaults, the config file and environment overrides.
    ///
    /// With `explicit_path` the file must exist; otherwise the platform
    /// config file is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or the result fails
    /// [`validate`](Self::validate).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::config_path().filter(|p| p.is_file()) {
                    log::debug!("Using config file {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero cache capacity, a quality
    /// above 100, zero workers, or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.save_quality > MAX_QUALITY {
            return Err(ConfigError::Invalid(format!(
                "save_quality must be between 0 and {MAX_QUALITY}, got {}",
                self.save_quality
            )));
        }
        if self.download_workers == 0 {
            return Err(ConfigError::Invalid(
                "download_workers must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Platform-specific path of `config.toml`.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("cc", "wallstash", "wallstash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Downloader settings derived from this configuration.
    #[must_use]
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::default()
            .with_save_quality(self.save_quality)
            .with_workers(self.download_workers)
            .with_cache_capacity(self.cache_capacity)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Render as TOML, as accepted by [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
