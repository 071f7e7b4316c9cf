//! Configuration file loading.
//!
//! Settings live in a TOML file, `echelon.toml` in the working directory by
//! default. The `IMAGE_ECHELON_SETTINGS` environment variable points at an
//! alternative file. The loaded value is immutable and handed to each
//! component at construction.

use crate::elo::{EloModel, KSchedule, KStep, DEFAULT_BETA, DEFAULT_K, DEFAULT_RATING};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an alternative configuration file.
pub const SETTINGS_ENV: &str = "IMAGE_ECHELON_SETTINGS";

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Rating settings are out of range.
    #[error("Invalid rating settings: {0}")]
    InvalidSchedule(String),
}

/// Rating engine settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatingConfig {
    /// Rating assigned to new items. Defaults to 1200.0.
    #[serde(default = "default_initial_rating")]
    pub initial_rating: f64,
    /// Spread constant. Defaults to 200.0.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// K-factor used when no schedule step applies. Defaults to 10.0.
    #[serde(default = "default_k")]
    pub k: f64,
    /// Optional variable-K steps keyed on the match ordinal.
    #[serde(default)]
    pub k_schedule: Vec<KStep>,
}

fn default_initial_rating() -> f64 {
    DEFAULT_RATING
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

fn default_k() -> f64 {
    DEFAULT_K
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_RATING,
            beta: DEFAULT_BETA,
            k: DEFAULT_K,
            k_schedule: Vec::new(),
        }
    }
}

impl RatingConfig {
    /// Check that every numeric setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_rating.is_finite() {
            return Err(ConfigError::InvalidSchedule(
                "initial_rating must be finite".to_string(),
            ));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(ConfigError::InvalidSchedule(format!(
                "beta must be positive, got {}",
                self.beta
            )));
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(ConfigError::InvalidSchedule(format!(
                "k must be positive, got {}",
                self.k
            )));
        }
        for step in &self.k_schedule {
            if !(step.k.is_finite() && step.k > 0.0) {
                return Err(ConfigError::InvalidSchedule(format!(
                    "k for threshold {} must be positive, got {}",
                    step.threshold, step.k
                )));
            }
        }
        Ok(())
    }

    /// Build the Elo model described by these settings.
    pub fn model(&self) -> EloModel {
        EloModel::new(self.beta, KSchedule::new(self.k_schedule.clone(), self.k))
    }
}

/// Prompt text and reference images shown around each comparison.
///
/// Served to the front-end as `GET /api/settings`; the two reference images
/// are served at `/defaultimage1` and `/defaultimage2`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Short question shown above the pair.
    pub head_text: String,
    /// Longer instructions shown before the first comparison.
    pub full_description: String,
    /// First reference image.
    pub image_1: ReferenceImage,
    /// Second reference image.
    pub image_2: ReferenceImage,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            head_text: "Which image do you prefer?".to_string(),
            full_description: "Two images are shown side by side. Click the one that better \
                               matches the reference images."
                .to_string(),
            image_1: ReferenceImage {
                label: "Reference 1:".to_string(),
                ..ReferenceImage::default()
            },
            image_2: ReferenceImage {
                label: "Reference 2:".to_string(),
                ..ReferenceImage::default()
            },
        }
    }
}

/// A captioned example image.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReferenceImage {
    pub label: String,
    pub text: String,
    /// Display width in pixels, 0 for full size.
    pub width: u32,
    /// Display height in pixels, 0 for full size.
    pub height: u32,
    /// Image file to serve. Nothing is served when unset.
    pub default_image: Option<PathBuf>,
}

impl Default for ReferenceImage {
    fn default() -> Self {
        Self {
            label: String::new(),
            text: String::new(),
            width: 400,
            height: 400,
            default_image: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EchelonConfig {
    /// SQLite database file.
    #[serde(default = "default_db")]
    pub db: PathBuf,
    /// Directory of images used for seeding and served under `/images`.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Front-end assets served as the fallback route.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Rating engine settings.
    #[serde(default)]
    pub rating: RatingConfig,
    /// Prompt text and reference images.
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_db() -> PathBuf {
    PathBuf::from("data/image-echelon.db")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("data/images")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9767
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for EchelonConfig {
    fn default() -> Self {
        Self {
            db: default_db(),
            image_dir: default_image_dir(),
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            rating: RatingConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl EchelonConfig {
    /// Loads the configuration from the default location.
    ///
    /// Uses the file named by `IMAGE_ECHELON_SETTINGS` when set, otherwise
    /// [`Self::config_path()`]. A missing default file yields the defaults;
    /// a missing file named by the environment variable is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if it contains invalid TOML, or
    /// [`ConfigError::InvalidSchedule`] if the rating settings are unusable.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let config_path = Self::config_path();
                if config_path.exists() {
                    Self::load_from(&config_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads and validates the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.rating.validate()?;
        Ok(config)
    }

    /// Returns the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        PathBuf::from("echelon.toml")
    }

    /// Make relative paths absolute against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let references = [
            &mut self.display.image_1.default_image,
            &mut self.display.image_2.default_image,
        ];
        for path in [&mut self.db, &mut self.image_dir, &mut self.static_dir]
            .into_iter()
            .chain(references.into_iter().flatten())
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
