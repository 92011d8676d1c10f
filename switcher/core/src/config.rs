//! TOML Configuration File Support
//!
//! Centralized configuration loading for the engine, supporting a TOML
//! configuration file at `~/.config/switcher/switcher.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest
//! first):
//! 1. Environment variables (`SWITCHER_*`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [refresh]
//! poll_ms = 1000
//! qa_ms = 2000
//!
//! [animation]
//! enter_delay_ms = 100
//! enter_style = "slideUp"
//! exit_style = "fade"
//! background_first = true
//! frame_ms = 16
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{AnimationConfig, TransitionStyle};

/// Operator-tunable enter delay ceiling in milliseconds
pub const MAX_ENTER_DELAY_MS: u64 = 10_000;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Refresh-cadence section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshToml {
    /// Poll vote freshness cadence in milliseconds
    pub poll_ms: Option<u64>,

    /// Q&A queue-status freshness cadence in milliseconds
    pub qa_ms: Option<u64>,
}

/// Animation section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationToml {
    /// Enter delay in milliseconds (0-10000)
    pub enter_delay_ms: Option<u64>,

    /// Enter transition style
    pub enter_style: Option<TransitionStyle>,

    /// Exit transition style
    pub exit_style: Option<TransitionStyle>,

    /// Whether the background layer enters before the content
    pub background_first: Option<bool>,

    /// Frame interval for the paint-commit wait in milliseconds
    pub frame_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherToml {
    /// Refresh-cadence configuration section
    pub refresh: RefreshToml,

    /// Animation configuration section
    pub animation: AnimationToml,
}

/// Engine configuration for the output surfaces
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Poll vote freshness cadence
    pub poll_refresh: Duration,

    /// Q&A queue-status freshness cadence
    pub qa_refresh: Duration,

    /// Animation orchestrator tuning
    pub animation: AnimationConfig,

    /// Frame interval for the paint-commit wait
    pub frame_interval: Duration,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_refresh: Duration::from_millis(1000),
            qa_refresh: Duration::from_millis(2000),
            animation: AnimationConfig::default(),
            frame_interval: Duration::from_millis(16),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check invariants the surfaces depend on
    ///
    /// # Errors
    ///
    /// Returns an error if a refresh cadence or the frame interval is
    /// zero (a zero-period interval would spin the event loop).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_refresh.is_zero() || self.qa_refresh.is_zero() {
            return Err(ConfigError::ValidationError(
                "refresh cadences must be nonzero".into(),
            ));
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "frame interval must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

/// Clamp an enter delay to the operator-tunable range
fn clamp_enter_delay(ms: u64) -> Duration {
    Duration::from_millis(ms.min(MAX_ENTER_DELAY_MS))
}

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/switcher/switcher.toml` or
/// `~/.config/switcher/switcher.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("switcher").join("switcher.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting configuration fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SwitcherToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut EngineConfig, toml: &SwitcherToml) {
    if let Some(ms) = toml.refresh.poll_ms {
        config.poll_refresh = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.refresh.qa_ms {
        config.qa_refresh = Duration::from_millis(ms);
    }

    if let Some(ms) = toml.animation.enter_delay_ms {
        config.animation.enter_delay = clamp_enter_delay(ms);
    }
    if let Some(style) = toml.animation.enter_style {
        config.animation.enter_style = style;
    }
    if let Some(style) = toml.animation.exit_style {
        config.animation.exit_style = style;
    }
    if let Some(background_first) = toml.animation.background_first {
        config.animation.background_first = background_first;
    }
    if let Some(ms) = toml.animation.frame_ms {
        config.frame_interval = Duration::from_millis(ms);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut EngineConfig) {
    apply_env_overrides(config, |key| std::env::var(key).ok());
}

/// Apply `SWITCHER_*` overrides through an injectable lookup
///
/// The lookup seam keeps the override rules testable without touching the
/// process-global environment.
fn apply_env_overrides(config: &mut EngineConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = lookup("SWITCHER_POLL_REFRESH_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.poll_refresh = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(ms) = lookup("SWITCHER_QA_REFRESH_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.qa_refresh = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(ms) = lookup("SWITCHER_ENTER_DELAY_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.animation.enter_delay = clamp_enter_delay(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(enabled) = lookup("SWITCHER_BACKGROUND_FIRST") {
        config.animation.background_first = enabled != "0" && enabled.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn clear_config_env_vars() {
        std::env::remove_var("SWITCHER_POLL_REFRESH_MS");
        std::env::remove_var("SWITCHER_QA_REFRESH_MS");
        std::env::remove_var("SWITCHER_ENTER_DELAY_MS");
        std::env::remove_var("SWITCHER_BACKGROUND_FIRST");
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.poll_refresh, Duration::from_millis(1000));
        assert_eq!(config.qa_refresh, Duration::from_millis(2000));
        assert_eq!(config.animation.enter_delay, Duration::from_millis(100));
        assert!(!config.animation.background_first);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.to_string_lossy().contains("switcher"));
            assert!(path.to_string_lossy().contains("switcher.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        clear_config_env_vars();

        let toml_content = r#"
[refresh]
poll_ms = 500
qa_ms = 4000

[animation]
enter_delay_ms = 250
enter_style = "slideUp"
exit_style = "scale"
background_first = true
frame_ms = 32
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.poll_refresh, Duration::from_millis(500));
        assert_eq!(config.qa_refresh, Duration::from_millis(4000));
        assert_eq!(config.animation.enter_delay, Duration::from_millis(250));
        assert_eq!(config.animation.enter_style, TransitionStyle::SlideUp);
        assert_eq!(config.animation.exit_style, TransitionStyle::Scale);
        assert!(config.animation.background_first);
        assert_eq!(config.frame_interval, Duration::from_millis(32));
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        clear_config_env_vars();

        let toml_content = r#"
[refresh]
poll_ms = 750
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.poll_refresh, Duration::from_millis(750));
        assert_eq!(config.qa_refresh, Duration::from_millis(2000));
        assert_eq!(config.animation.enter_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_missing_file_graceful() {
        clear_config_env_vars();

        let path = PathBuf::from("/nonexistent/path/switcher.toml");
        let config = load_config_from_path(Some(path)).unwrap();
        assert_eq!(config.poll_refresh, Duration::from_millis(1000));
    }

    #[test]
    fn test_malformed_toml_error() {
        let toml_content = r#"
[refresh
poll_ms = "not a number"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_enter_delay_clamped() {
        clear_config_env_vars();

        let toml_content = r#"
[animation]
enter_delay_ms = 99999
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.animation.enter_delay,
            Duration::from_millis(MAX_ENTER_DELAY_MS)
        );
    }

    #[test]
    fn test_zero_cadence_rejected() {
        clear_config_env_vars();

        let toml_content = r#"
[refresh]
poll_ms = 0
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file_value() {
        let mut config = EngineConfig::default();
        let toml: SwitcherToml = toml::from_str("[refresh]\npoll_ms = 500").unwrap();
        apply_toml_config(&mut config, &toml);
        assert_eq!(config.poll_refresh, Duration::from_millis(500));

        apply_env_overrides(&mut config, |key| {
            (key == "SWITCHER_POLL_REFRESH_MS").then(|| "250".to_string())
        });

        assert_eq!(config.poll_refresh, Duration::from_millis(250));
        assert_eq!(config.source, ConfigSource::Env);
    }

    #[test]
    fn test_env_enter_delay_clamped() {
        let mut config = EngineConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == "SWITCHER_ENTER_DELAY_MS").then(|| "99999".to_string())
        });
        assert_eq!(
            config.animation.enter_delay,
            Duration::from_millis(MAX_ENTER_DELAY_MS)
        );
    }

    #[test]
    fn test_env_background_first_parsing() {
        let mut config = EngineConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == "SWITCHER_BACKGROUND_FIRST").then(|| "1".to_string())
        });
        assert!(config.animation.background_first);

        apply_env_overrides(&mut config, |key| {
            (key == "SWITCHER_BACKGROUND_FIRST").then(|| "false".to_string())
        });
        assert!(!config.animation.background_first);
    }

    #[test]
    fn test_unparsable_env_value_ignored() {
        let mut config = EngineConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == "SWITCHER_POLL_REFRESH_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.poll_refresh, Duration::from_millis(1000));
        assert_eq!(config.source, ConfigSource::Default);
    }

    #[test]
    fn test_toml_round_trip() {
        let original = SwitcherToml {
            refresh: RefreshToml {
                poll_ms: Some(800),
                ..Default::default()
            },
            animation: AnimationToml {
                enter_style: Some(TransitionStyle::SlideDown),
                background_first: Some(true),
                ..Default::default()
            },
        };

        let toml_string = toml::to_string(&original).unwrap();
        let parsed: SwitcherToml = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.refresh.poll_ms, Some(800));
        assert_eq!(parsed.animation.enter_style, Some(TransitionStyle::SlideDown));
        assert_eq!(parsed.animation.background_first, Some(true));
    }
}
