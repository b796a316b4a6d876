use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use config::{Config, Environment, File};
use gesture::{ClassifierConfig, DebounceConfig, DebounceKind, PerceptionMode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::session::SessionSettings;

pub const DEFAULT_CONFIG_FILE: &str = "gesture-controller.toml";
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub perception_mode: PerceptionMode,
    /// Longest wait for the next perception frame.
    pub frame_timeout_ms: u64,
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub session: SessionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            perception_mode: PerceptionMode::Landmarks,
            frame_timeout_ms: 5_000,
            classifier: ClassifierConfig::default(),
            debounce: DebounceConfig::default(),
            session: SessionSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file (`path`, or `gesture-controller.toml` if
    /// present), then `APP__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("failed to parse settings")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        for (name, value) in [
            ("classifier.pinch_threshold", c.pinch_threshold),
            ("classifier.heart_proximity_threshold", c.heart_proximity_threshold),
            ("classifier.thumb_direction_threshold", c.thumb_direction_threshold),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be a positive number, got {value}"
            );
        }
        ensure!(
            (0.0..=1.0).contains(&c.min_confidence),
            "classifier.min_confidence must be within [0, 1], got {}",
            c.min_confidence
        );

        match self.debounce.mode {
            DebounceKind::ChangeOrPeriodic => ensure!(
                self.debounce.every_n_frames > 0,
                "debounce.every_n_frames must be at least 1"
            ),
            DebounceKind::Cooldown => ensure!(
                self.debounce.cooldown_ms > 0,
                "debounce.cooldown_ms must be positive"
            ),
        }

        for (name, value) in [
            ("frame_timeout_ms", self.frame_timeout_ms),
            ("session.connect_timeout_ms", self.session.connect_timeout_ms),
            ("session.handshake_timeout_ms", self.session.handshake_timeout_ms),
            ("session.ack_timeout_ms", self.session.ack_timeout_ms),
        ] {
            ensure!(value > 0, "{name} must be positive");
        }

        let endpoint = Url::parse(&self.session.endpoint)
            .with_context(|| format!("invalid session.endpoint: {}", self.session.endpoint))?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            bail!(
                "session.endpoint must start with ws:// or wss://, got {}",
                self.session.endpoint
            );
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render settings")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
