use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::player::TickMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub quiz: QuizConfig,

    #[serde(default)]
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Trigger window for backends with native time updates.
    #[serde(default = "default_native_tolerance")]
    pub native_tolerance_secs: f64,

    /// Trigger window for polled backends; must cover one poll interval.
    #[serde(default = "default_polled_tolerance")]
    pub polled_tolerance_secs: f64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    #[serde(default = "default_native_margin")]
    pub native_resume_margin_secs: f64,

    #[serde(default = "default_polled_margin")]
    pub polled_resume_margin_secs: f64,

    #[serde(default = "default_seek_settle")]
    pub seek_settle_secs: f64,

    #[serde(default = "default_volume")]
    pub default_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerValidation {
    /// Trust the `isCorrect` flag shipped with the checkpoint.
    #[default]
    Client,
    /// Ask the answer endpoint for the verdict.
    Server,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default)]
    pub auto_submit: bool,

    #[serde(default)]
    pub answer_validation: AnswerValidation,

    #[serde(default = "default_correct_delay")]
    pub correct_delay_ms: u64,

    #[serde(default = "default_incorrect_delay")]
    pub incorrect_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be at least 1 second, got {value}")]
    MarginTooSmall { field: &'static str, value: f64 },

    #[error("correct_delay_ms must be within 1200..=1500, got {0}")]
    CorrectDelayOutOfRange(u64),

    #[error("default_volume must be within 0.0..=1.0, got {0}")]
    VolumeOutOfRange(f64),

    #[error("invalid base_url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl Config {
    /// Load from the default location, writing defaults if the file is absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.validate().context("Invalid configuration")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("quizgate").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let playback = &self.playback;
        for (field, value) in [
            ("native_tolerance_secs", playback.native_tolerance_secs),
            ("polled_tolerance_secs", playback.polled_tolerance_secs),
            ("poll_interval_ms", playback.poll_interval_ms as f64),
            ("ready_timeout_secs", playback.ready_timeout_secs as f64),
            ("seek_settle_secs", playback.seek_settle_secs),
            ("report_interval_secs", self.progress.report_interval_secs as f64),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("native_resume_margin_secs", playback.native_resume_margin_secs),
            ("polled_resume_margin_secs", playback.polled_resume_margin_secs),
        ] {
            if !(value >= 1.0) {
                return Err(ConfigError::MarginTooSmall { field, value });
            }
        }

        if !(1200..=1500).contains(&self.quiz.correct_delay_ms) {
            return Err(ConfigError::CorrectDelayOutOfRange(self.quiz.correct_delay_ms));
        }

        if !(0.0..=1.0).contains(&playback.default_volume) {
            return Err(ConfigError::VolumeOutOfRange(playback.default_volume));
        }

        url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.api.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

impl PlaybackConfig {
    /// Trigger window for the given tick cadence.
    pub fn tolerance_for(&self, mode: TickMode) -> f64 {
        match mode {
            TickMode::Continuous => self.native_tolerance_secs,
            TickMode::Polled(_) => self.polled_tolerance_secs,
        }
    }

    /// Distance past a solved checkpoint at which playback resumes.
    pub fn resume_margin_for(&self, mode: TickMode) -> f64 {
        match mode {
            TickMode::Continuous => self.native_resume_margin_secs,
            TickMode::Polled(_) => self.polled_resume_margin_secs,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl QuizConfig {
    pub fn correct_delay(&self) -> Duration {
        Duration::from_millis(self.correct_delay_ms)
    }

    pub fn incorrect_delay(&self) -> Duration {
        Duration::from_millis(self.incorrect_delay_ms)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            session_cookie: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            native_tolerance_secs: default_native_tolerance(),
            polled_tolerance_secs: default_polled_tolerance(),
            poll_interval_ms: default_poll_interval(),
            ready_timeout_secs: default_ready_timeout(),
            native_resume_margin_secs: default_native_margin(),
            polled_resume_margin_secs: default_polled_margin(),
            seek_settle_secs: default_seek_settle(),
            default_volume: default_volume(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            auto_submit: false,
            answer_validation: AnswerValidation::default(),
            correct_delay_ms: default_correct_delay(),
            incorrect_delay_ms: default_incorrect_delay(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

// Default value functions
fn default_base_url() -> String { "http://localhost:3000".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_native_tolerance() -> f64 { 0.5 }
fn default_polled_tolerance() -> f64 { 1.0 }
fn default_poll_interval() -> u64 { 500 }
fn default_ready_timeout() -> u64 { 15 }
fn default_native_margin() -> f64 { 1.0 }
fn default_polled_margin() -> f64 { 2.0 }
fn default_seek_settle() -> f64 { 2.0 }
fn default_volume() -> f64 { 1.0 }
fn default_correct_delay() -> u64 { 1500 }
fn default_incorrect_delay() -> u64 { 2000 }
fn default_report_interval() -> u64 { 5 }
