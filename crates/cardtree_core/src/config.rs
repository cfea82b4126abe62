//! Engine configuration.
//!
//! Loaded with [`confique`] from an optional TOML file; every key falls back
//! to a compiled default.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `base_hue` | `210` | Hue of the first root card |
//! | `hue_step` | `47` | Hue added per root position |
//! | `saturation` | `65` | Saturation of every card color (percent) |
//! | `base_lightness` | `88` | Lightness of root cards (percent) |
//! | `lightness_step` | `8` | Lightness removed per depth level |
//! | `min_lightness` | `20` | Lightness floor for deep cards |
//! | `autoscroll_edge` | `40` | Height of the autoscroll trigger band (px) |
//! | `autoscroll_speed` | `12` | Scroll distance per animation frame (px) |
//! | `log_level` | build default | `trace|debug|info|warn|error` |

use crate::drag::autoscroll::AutoScrollSettings;
use crate::logging::default_log_level;
use crate::model::color::Palette;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Errors from configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read or parsed.
    Load(confique::Error),
    /// A value parsed but is outside its allowed range.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<confique::Error> for ConfigError {
    fn from(value: confique::Error) -> Self {
        Self::Load(value)
    }
}

/// Configuration for the board engine, stored in `cardtree.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    #[config(default = 210.0)]
    pub base_hue: f64,
    #[config(default = 47.0)]
    pub hue_step: f64,
    #[config(default = 65.0)]
    pub saturation: f64,
    #[config(default = 88.0)]
    pub base_lightness: f64,
    #[config(default = 8.0)]
    pub lightness_step: f64,
    #[config(default = 20.0)]
    pub min_lightness: f64,
    #[config(default = 40.0)]
    pub autoscroll_edge: f32,
    #[config(default = 12.0)]
    pub autoscroll_speed: f32,
    /// When absent, the build-mode default level is used.
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let palette = Palette::default();
        let scroll = AutoScrollSettings::default();
        Self {
            base_hue: palette.base_hue,
            hue_step: palette.hue_step,
            saturation: palette.saturation,
            base_lightness: palette.base_lightness,
            lightness_step: palette.lightness_step,
            min_lightness: palette.min_lightness,
            autoscroll_edge: scroll.edge,
            autoscroll_speed: scroll.speed,
            log_level: None,
        }
    }
}

impl EngineConfig {
    /// Loads config from `path` when it exists, else returns defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config = Self::builder().file(path).load()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would break the cascade or autoscroll.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lightness_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lightness_step must be positive, got {}",
                self.lightness_step
            )));
        }
        if !(0.0..=100.0).contains(&self.min_lightness)
            || !(0.0..=100.0).contains(&self.base_lightness)
            || self.min_lightness > self.base_lightness
        {
            return Err(ConfigError::Invalid(format!(
                "lightness range {}..{} is not within 0..100",
                self.min_lightness, self.base_lightness
            )));
        }
        if self.autoscroll_edge <= 0.0 || self.autoscroll_speed <= 0.0 {
            return Err(ConfigError::Invalid(
                "autoscroll_edge and autoscroll_speed must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn palette(&self) -> Palette {
        Palette {
            base_hue: self.base_hue,
            hue_step: self.hue_step,
            saturation: self.saturation,
            base_lightness: self.base_lightness,
            lightness_step: self.lightness_step,
            min_lightness: self.min_lightness,
        }
    }

    pub fn autoscroll(&self) -> AutoScrollSettings {
        AutoScrollSettings {
            edge: self.autoscroll_edge,
            speed: self.autoscroll_speed,
        }
    }

    /// Log level to hand to `init_logging`.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use crate::model::color::Palette;
    use std::io::Write;

    #[test]
    fn default_config_matches_palette_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.palette(), Palette::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn unset_log_level_uses_build_default() {
        let config = EngineConfig::default();
        assert_eq!(config.log_level(), crate::logging::default_log_level());
    }

    #[test]
    fn file_overrides_selected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cardtree.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "base_hue = 10.0\nlog_level = \"warn\"").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.base_hue, 10.0);
        assert_eq!(config.hue_step, 47.0);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn validate_rejects_non_positive_lightness_step() {
        let config = EngineConfig {
            lightness_step: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
