//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `voxhome.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use voxhome_adapter_llm_http::LlmConfig;
use voxhome_adapter_virtual::OutletSpec;
use voxhome_app::controller::ControlTimeouts;
use voxhome_app::dispatch::DispatchSettings;
use voxhome_domain::command::Command;
use voxhome_domain::error::VoxHomeError;
use voxhome_domain::scene::{Scene, SceneAction, SceneCatalog};

/// Upper bound for every interval and timeout, one week.
const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub discovery: DiscoveryConfig,
    pub control: ControlConfig,
    pub voice: VoiceConfig,
    /// Completion endpoint used to interpret utterances.
    pub interpreter: LlmConfig,
    /// Simulated outlets served by the virtual protocol adapter.
    #[serde(rename = "virtual")]
    pub simulation: VirtualConfig,
    /// Scenes by name.
    pub scenes: ScenesConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Background discovery cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub interval_secs: u64,
    pub scan_timeout_secs: u64,
}

/// Device call deadlines.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
}

/// Speech capture settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub listen_timeout_secs: u64,
    /// Utterance that ends the program.
    pub exit_phrase: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Outlets to simulate. The built-in set is used when empty.
    pub devices: Vec<OutletSpec>,
}

/// `[scenes.<name>]` tables.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ScenesConfig(pub BTreeMap<String, SceneConfig>);

#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    pub actions: Vec<SceneAction>,
}

impl Config {
    /// Load configuration from `voxhome.toml` (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("voxhome.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = var("VOXHOME_DISCOVERY_INTERVAL").and_then(|v| v.parse().ok()) {
            self.discovery.interval_secs = secs;
        }
        if let Some(val) = var("VOXHOME_EXIT_PHRASE") {
            self.voice.exit_phrase = val;
        }
        if let Some(val) = var("VOXHOME_LLM_BASE_URL") {
            self.interpreter.base_url = val;
        }
        if let Some(val) = var("VOXHOME_LLM_MODEL") {
            self.interpreter.model = val;
        }
        if self.interpreter.api_key.is_none() {
            self.interpreter.api_key = var("OPENAI_API_KEY");
        }
        if let Some(val) = var("VOXHOME_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("discovery.interval_secs", self.discovery.interval_secs),
            ("discovery.scan_timeout_secs", self.discovery.scan_timeout_secs),
            ("control.connect_timeout_secs", self.control.connect_timeout_secs),
            ("control.command_timeout_secs", self.control.command_timeout_secs),
            ("voice.listen_timeout_secs", self.voice.listen_timeout_secs),
            ("interpreter.timeout_secs", self.interpreter.timeout_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }
        if let Some((name, _)) = durations
            .iter()
            .find(|(_, secs)| *secs > MAX_DURATION_SECS)
        {
            return Err(ConfigError::Validation(format!(
                "{name} must not exceed {MAX_DURATION_SECS} seconds"
            )));
        }
        if self.voice.exit_phrase.trim().is_empty() {
            return Err(ConfigError::Validation(
                "voice.exit_phrase must not be empty".to_string(),
            ));
        }
        self.scene_catalog()
            .map_err(|err| ConfigError::Validation(format!("scenes: {err}")))?;
        Ok(())
    }

    /// Build the scene catalog from the `[scenes]` tables.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty scene, a blank device name or
    /// two scenes whose names differ only by case.
    pub fn scene_catalog(&self) -> Result<SceneCatalog, VoxHomeError> {
        let scenes = self
            .scenes
            .0
            .iter()
            .map(|(name, scene)| Scene {
                name: name.clone(),
                actions: scene.actions.clone(),
            })
            .collect::<Vec<_>>();
        SceneCatalog::new(scenes)
    }

    #[must_use]
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery.interval_secs)
    }

    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery.scan_timeout_secs)
    }

    #[must_use]
    pub fn control_timeouts(&self) -> ControlTimeouts {
        ControlTimeouts {
            connect: Duration::from_secs(self.control.connect_timeout_secs),
            command: Duration::from_secs(self.control.command_timeout_secs),
        }
    }

    #[must_use]
    pub fn interpreter_timeout(&self) -> Duration {
        Duration::from_secs(self.interpreter.timeout_secs)
    }

    #[must_use]
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            listen_timeout: Duration::from_secs(self.voice.listen_timeout_secs),
            exit_phrase: self.voice.exit_phrase.clone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "voxhomed=info,voxhome=info".to_string(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            scan_timeout_secs: 30,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            command_timeout_secs: 10,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: 5,
            exit_phrase: "exit".to_string(),
        }
    }
}

impl Default for ScenesConfig {
    fn default() -> Self {
        let scene = |actions: [(&str, Command); 2]| SceneConfig {
            actions: actions
                .into_iter()
                .map(|(device, command)| SceneAction::new(device, command))
                .collect(),
        };
        Self(BTreeMap::from([
            (
                "evening".to_string(),
                scene([
                    ("living room light", Command::On),
                    ("kitchen outlet", Command::Off),
                ]),
            ),
            (
                "work".to_string(),
                scene([("office light", Command::On), ("fan", Command::On)]),
            ),
        ]))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
