//! `model.json` configuration and per-user prompt overrides.
//!
//! ```rust
//! use kazamidori::ModelConfig;
//!
//! let config = ModelConfig::from_json(
//!     r#"{
//!         "name": "kazamidori",
//!         "model_name": "gemini-2.5-pro",
//!         "prompts": { "default": "You are a weather-aware assistant." }
//!     }"#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.max_history_size, 10);
//! assert_eq!(config.prompt_for("anyone"), "You are a weather-aware assistant.");
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MODEL_CONFIG_FILE_NAME: &str = "model.json";
pub const CUSTOM_PROMPTS_FILE_NAME: &str = "custom_model.json";
pub const DEFAULT_PROMPT_KEY: &str = "default";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/generate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Io,
    Parse,
    Invalid,
    MissingEnvironment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Io, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }

    pub fn missing_environment(variable: &str) -> Self {
        Self::new(
            ConfigErrorKind::MissingEnvironment,
            format!("environment variable {variable} is not set"),
        )
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ollama_endpoint")]
    pub api_endpoint: String,
    #[serde(default)]
    pub model_name: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_endpoint: default_ollama_endpoint(),
            model_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_provider_secs")]
    pub provider_secs: u64,
    #[serde(default = "default_tool_secs")]
    pub tool_secs: u64,
}

impl TimeoutConfig {
    pub fn provider(&self) -> Duration {
        Duration::from_secs(self.provider_secs)
    }

    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_secs: default_provider_secs(),
            tool_secs: default_tool_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_model_name: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,
    #[serde(default)]
    pub prompts: BTreeMap<String, String>,
    #[serde(default)]
    pub about: AboutConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl ModelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ConfigError::io(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| ConfigError::parse(format!("invalid model config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("model_name must not be empty"));
        }

        let has_default = self
            .prompts
            .get(DEFAULT_PROMPT_KEY)
            .is_some_and(|prompt| !prompt.trim().is_empty());
        if !has_default {
            return Err(ConfigError::invalid("default prompt not defined"));
        }

        if self.max_history_size == 0 {
            return Err(ConfigError::invalid(
                "max_history_size must be greater than zero",
            ));
        }

        if self.ollama.enabled {
            if self.ollama.model_name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "ollama.model_name must be set when ollama is enabled",
                ));
            }
            if self.ollama.api_endpoint.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "ollama.api_endpoint must be set when ollama is enabled",
                ));
            }
        }

        if self.timeouts.provider_secs == 0 || self.timeouts.tool_secs == 0 {
            return Err(ConfigError::invalid("timeouts must be greater than zero"));
        }

        Ok(())
    }

    /// Returns the prompt configured for `username`, or the `default` one.
    pub fn prompt_for(&self, username: &str) -> &str {
        self.prompts
            .get(username)
            .or_else(|| self.prompts.get(DEFAULT_PROMPT_KEY))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Secondary model name, ignoring blank values.
    pub fn secondary_model(&self) -> Option<&str> {
        self.secondary_model_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CustomPromptFile {
    #[serde(default)]
    prompts: BTreeMap<String, String>,
}

/// Per-user prompt overrides persisted in `custom_model.json`.
#[derive(Debug)]
pub struct CustomPrompts {
    path: Option<PathBuf>,
    prompts: Mutex<BTreeMap<String, String>>,
}

impl CustomPrompts {
    pub fn empty() -> Self {
        Self {
            path: None,
            prompts: Mutex::new(BTreeMap::new()),
        }
    }

    /// A missing or empty file is an empty set, and so is malformed JSON.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let prompts = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str::<CustomPromptFile>(&raw) {
                Ok(file) => file.prompts,
                Err(err) => {
                    tracing::warn!(
                        phase = "config",
                        event = "custom_prompts_malformed",
                        path = %path.display(),
                        error = %err
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(ConfigError::io(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path: Some(path),
            prompts: Mutex::new(prompts),
        })
    }

    pub fn get(&self, username: &str) -> Option<String> {
        self.prompts
            .lock()
            .ok()
            .and_then(|prompts| prompts.get(username).cloned())
    }

    pub fn set(
        &self,
        username: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let mut prompts = self.lock()?;
        prompts.insert(username.into(), prompt.into());
        Ok(())
    }

    pub fn remove(&self, username: &str) -> Result<Option<String>, ConfigError> {
        let mut prompts = self.lock()?;
        Ok(prompts.remove(username))
    }

    /// Writes the overrides back to the file they were loaded from.
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = self.path.as_ref() else {
            return Err(ConfigError::invalid(
                "custom prompts were not loaded from a file",
            ));
        };

        let file = CustomPromptFile {
            prompts: self.lock()?.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)
            .map_err(|err| ConfigError::parse(format!("failed to encode custom prompts: {err}")))?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                ConfigError::io(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        std::fs::write(path, raw)
            .map_err(|err| ConfigError::io(format!("failed to write {}: {err}", path.display())))
    }

    pub fn len(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, ConfigError> {
        self.prompts
            .lock()
            .map_err(|_| ConfigError::io("custom prompt lock poisoned"))
    }
}

impl Default for CustomPrompts {
    fn default() -> Self {
        Self::empty()
    }
}

/// A custom override wins over the model's per-user and default prompts.
pub fn resolve_system_prompt(
    model: &ModelConfig,
    custom: &CustomPrompts,
    username: &str,
) -> String {
    custom
        .get(username)
        .filter(|prompt| !prompt.trim().is_empty())
        .unwrap_or_else(|| model.prompt_for(username).to_string())
}

fn default_max_history_size() -> usize {
    10
}

fn default_provider_secs() -> u64 {
    90
}

fn default_tool_secs() -> u64 {
    15
}

fn default_ollama_endpoint() -> String {
    DEFAULT_OLLAMA_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{
        ConfigErrorKind, CustomPrompts, ModelConfig, TimeoutConfig, resolve_system_prompt,
    };

    const FULL_CONFIG: &str = r#"{
        "name": "kazamidori",
        "model_name": "gemini-2.5-pro",
        "secondary_model_name": "gemini-2.0-flash",
        "icon": "https://example.com/icon.png",
        "max_history_size": 4,
        "prompts": {
            "default": "You are helpful.",
            "alice": "You are terse with alice."
        },
        "about": { "title": "Kazamidori", "description": "weather bot", "url": "https://example.com" },
        "ollama": { "enabled": true, "api_endpoint": "http://ollama:11434/api/generate", "model_name": "llama3.2" },
        "timeouts": { "provider_secs": 30 }
    }"#;

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("kazamidori-{label}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("temp dir should be created");
        dir
    }

    #[test]
    fn full_config_parses_with_partial_timeouts() {
        let config = ModelConfig::from_json(FULL_CONFIG).expect("config should parse");

        assert_eq!(config.secondary_model(), Some("gemini-2.0-flash"));
        assert_eq!(config.max_history_size, 4);
        assert!(config.ollama.enabled);
        assert_eq!(config.ollama.model_name, "llama3.2");
        assert_eq!(
            config.timeouts,
            TimeoutConfig {
                provider_secs: 30,
                tool_secs: 15
            }
        );
        assert_eq!(config.about.title, "Kazamidori");
    }

    #[test]
    fn prompt_for_falls_back_to_default() {
        let config = ModelConfig::from_json(FULL_CONFIG).expect("config should parse");

        assert_eq!(config.prompt_for("alice"), "You are terse with alice.");
        assert_eq!(config.prompt_for("bob"), "You are helpful.");
    }

    #[test]
    fn missing_default_prompt_is_rejected() {
        let error = ModelConfig::from_json(
            r#"{ "name": "k", "model_name": "gemini-2.5-pro", "prompts": { "alice": "hi" } }"#,
        )
        .expect_err("missing default should fail");

        assert_eq!(error.kind, ConfigErrorKind::Invalid);
        assert!(error.message.contains("default prompt"));
    }

    #[test]
    fn enabled_ollama_requires_a_model_name() {
        let error = ModelConfig::from_json(
            r#"{
                "name": "k",
                "model_name": "gemini-2.5-pro",
                "prompts": { "default": "hi" },
                "ollama": { "enabled": true }
            }"#,
        )
        .expect_err("ollama without model should fail");

        assert_eq!(error.kind, ConfigErrorKind::Invalid);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let error = ModelConfig::from_json("{ not json").expect_err("parse should fail");
        assert_eq!(error.kind, ConfigErrorKind::Parse);
    }

    #[test]
    fn blank_secondary_model_is_treated_as_absent() {
        let config = ModelConfig::from_json(
            r#"{
                "name": "k",
                "model_name": "gemini-2.5-pro",
                "secondary_model_name": "  ",
                "prompts": { "default": "hi" }
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.secondary_model(), None);
    }

    #[test]
    fn custom_prompts_load_leniently() {
        let dir = temp_dir("custom-lenient");

        let missing = CustomPrompts::load(dir.join("absent.json")).expect("missing is empty");
        assert!(missing.is_empty());

        let malformed_path = dir.join("malformed.json");
        std::fs::write(&malformed_path, "{ broken").expect("write should succeed");
        let malformed = CustomPrompts::load(&malformed_path).expect("malformed is empty");
        assert!(malformed.is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn custom_prompts_round_trip_through_save() {
        let dir = temp_dir("custom-save");
        let path = dir.join("nested").join("custom_model.json");

        let prompts = CustomPrompts::load(&path).expect("load should succeed");
        prompts.set("alice", "Speak like a pirate.").expect("set");
        prompts.set("bob", "Be formal.").expect("set");
        assert_eq!(prompts.remove("bob").expect("remove"), Some("Be formal.".to_string()));
        prompts.save().expect("save should succeed");

        let reloaded = CustomPrompts::load(&path).expect("reload should succeed");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("alice").as_deref(), Some("Speak like a pirate."));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn save_without_a_file_is_rejected() {
        let error = CustomPrompts::empty().save().expect_err("save should fail");
        assert_eq!(error.kind, ConfigErrorKind::Invalid);
    }

    #[test]
    fn custom_prompt_wins_over_model_prompts() {
        let config = ModelConfig::from_json(FULL_CONFIG).expect("config should parse");
        let custom = CustomPrompts::empty();

        assert_eq!(
            resolve_system_prompt(&config, &custom, "alice"),
            "You are terse with alice."
        );

        custom.set("alice", "Only answer in haiku.").expect("set");
        assert_eq!(
            resolve_system_prompt(&config, &custom, "alice"),
            "Only answer in haiku."
        );
        assert_eq!(resolve_system_prompt(&config, &custom, "carol"), "You are helpful.");
    }
}
