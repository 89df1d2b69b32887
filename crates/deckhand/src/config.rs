//! Configuration handling for deckhand.

use anyhow::Context;
use deckhand_core::{ImageFormat, ImageSize, MetadataConfig};
use deckhand_describe::{DEFAULT_MAX_CONCURRENT, DEFAULT_MODEL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Slide image configuration
    #[serde(default)]
    pub images: ImagesConfig,

    /// Which document properties to extract
    #[serde(default = "MetadataConfig::all")]
    pub metadata: MetadataConfig,

    /// Description generation configuration
    #[serde(default)]
    pub describe: DescribeConfig,

    /// External tool configuration
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images: ImagesConfig::default(),
            metadata: MetadataConfig::all(),
            describe: DescribeConfig::default(),
            convert: ConvertConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default config file, or defaults when none exists.
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(Some(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit config file path.
    pub fn load_from(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Path of the config file, if a config directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample config file with every default spelled out.
    pub fn sample_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Slide image configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Output encoding
    #[serde(default)]
    pub format: ImageFormat,

    /// Render resolution
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Target width (with `height`, stretches images exactly)
    pub width: Option<u32>,

    /// Target height
    pub height: Option<u32>,
}

impl ImagesConfig {
    /// Configured target size, when both dimensions are set.
    pub fn size(&self) -> Option<ImageSize> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(ImageSize { width, height }),
            _ => None,
        }
    }
}

fn default_dpi() -> u32 {
    150
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            dpi: default_dpi(),
            width: None,
            height: None,
        }
    }
}

/// Description generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Prompt applied to every slide image
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Use the bounded worker pool
    #[serde(default)]
    pub parallel: bool,

    /// Worker pool bound
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Seconds to wait before every AI call
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,

    /// Stage images via the Files API instead of inline bytes
    #[serde(default)]
    pub remote_upload: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt() -> String {
    "Describe this presentation slide for a search index.".to_string()
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_pacing_secs() -> u64 {
    1
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            prompt: default_prompt(),
            parallel: false,
            max_concurrent: default_max_concurrent(),
            pacing_secs: default_pacing_secs(),
            remote_upload: false,
        }
    }
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// LibreOffice binary
    #[serde(default = "default_soffice")]
    pub soffice_binary: PathBuf,

    /// pdftoppm binary
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm_binary: PathBuf,

    /// Bound on a whole-document conversion (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_soffice() -> PathBuf {
    PathBuf::from("soffice")
}

fn default_pdftoppm() -> PathBuf {
    PathBuf::from("pdftoppm")
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            soffice_binary: default_soffice(),
            pdftoppm_binary: default_pdftoppm(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the config directory for deckhand.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DECKHAND_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "deckhand").map(|dirs| dirs.config_dir().to_path_buf())
}
