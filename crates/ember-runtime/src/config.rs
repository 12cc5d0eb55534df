//! Runtime configuration
//!
//! Config is resolved with two layers of precedence (highest wins):
//! 1. Environment variables: `EMBER_DESIRED_FPS`, `EMBER_SPEED`
//! 2. A TOML file (or the built-in defaults when no file is given)

use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_DESIRED_FPS: &str = "EMBER_DESIRED_FPS";
pub const ENV_SPEED: &str = "EMBER_SPEED";

/// Scheduler and registry settings for a [`Game`](crate::Game)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed-rate ticks per second
    #[serde(default = "default_desired_fps")]
    pub desired_fps: f64,
    /// Multiplier on the delta handed to fixed-rate ticks
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Most fixed steps one frame may bank
    #[serde(default = "default_max_catch_up_steps")]
    pub max_catch_up_steps: u32,
    /// Tag given to timers created without one
    #[serde(default = "default_timer_tag")]
    pub default_timer_tag: String,
}

fn default_desired_fps() -> f64 {
    60.0
}
fn default_speed() -> f64 {
    1.0
}
fn default_max_catch_up_steps() -> u32 {
    3
}
fn default_timer_tag() -> String {
    "0".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            desired_fps: default_desired_fps(),
            speed: default_speed(),
            max_catch_up_steps: default_max_catch_up_steps(),
            default_timer_tag: default_timer_tag(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file and apply environment overrides on top of it
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: GameConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `EMBER_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(ENV_DESIRED_FPS) {
            self.desired_fps = parse_env_number(ENV_DESIRED_FPS, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_SPEED) {
            self.speed = parse_env_number(ENV_SPEED, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("desired_fps", self.desired_fps)?;
        check_positive("speed", self.speed)?;
        if self.max_catch_up_steps == 0 {
            return Err(EmberError::InvalidConfiguration(
                "max_catch_up_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// True for finite values strictly greater than zero
pub fn is_valid_rate(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_positive(field: &str, value: f64) -> Result<()> {
    if is_valid_rate(value) {
        Ok(())
    } else {
        Err(EmberError::InvalidConfiguration(format!(
            "{field} must be a positive finite number, got {value}"
        )))
    }
}

fn parse_env_number(var: &str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|e| {
        EmberError::InvalidConfiguration(format!("{var}={value:?} is not a number: {e}"))
    })
}
