// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "h5transcode";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub profiles: ProfilesConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// ffmpeg binary, looked up on PATH unless absolute
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Binary for the mp4 fast-start rewrite (`qt-faststart <in> <out>`)
    #[serde(default = "default_faststart_path")]
    pub faststart_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Searched in order; the built-in profile directory is always appended
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Keep detected capabilities between runs
    #[serde(default = "default_true")]
    pub persistent: bool,

    /// Overrides the platform cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Container used when neither flag nor extension says otherwise
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_faststart_path() -> PathBuf {
    PathBuf::from("qt-faststart")
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "mp4".to_string()
}

fn default_profile() -> String {
    "default".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            faststart_path: default_faststart_path(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persistent: true,
            dir: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            profile: default_profile(),
        }
    }
}

impl CacheConfig {
    /// Directory for the persistent cache, `None` for an in-memory cache
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        if !self.persistent {
            return None;
        }
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR)))
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only config directory should not stop a conversion
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "could not create default config file, using built-in defaults"
                );
            }

            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
