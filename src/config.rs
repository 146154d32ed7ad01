use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, ZirnevisError};
use crate::translate::{
    SubjectProfile, AVAILABLE_MODELS, DEFAULT_CONTEXT_WINDOW, DEFAULT_MODEL, MAX_CONTEXT_WINDOW,
};

/// Environment variable consulted when the configured one is unset
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

// Default values for fields that may be left out of config.toml
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_subject() -> String {
    SubjectProfile::Film.label().to_string()
}

fn default_context_window_size() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

fn default_max_retry_passes() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Gemini API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Gemini model to use, must be one of the available models
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Subject profile label (e.g. "Film", "TV Series")
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Neighbouring lines sent on each side of a cue (0-10)
    #[serde(default = "default_context_window_size")]
    pub context_window_size: usize,
    /// Retry passes over failed lines after the first pass
    #[serde(default = "default_max_retry_passes")]
    pub max_retry_passes: u32,
    /// HTTP timeout for a single translation request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for translated files; next to the input when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Write the output even when no line was translated
    #[serde(default)]
    pub allow_partial: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            subject: default_subject(),
            context_window_size: default_context_window_size(),
            max_retry_passes: default_max_retry_passes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslateConfig {
    /// Resolve the configured subject, falling back to the generic profile
    pub fn subject_profile(&self) -> SubjectProfile {
        match self.subject.parse() {
            Ok(profile) => profile,
            Err(_) => {
                warn!("Unknown subject '{}', using generic instructions", self.subject);
                SubjectProfile::Generic
            }
        }
    }

    /// Context window clamped to the supported range
    pub fn context_window(&self) -> usize {
        self.context_window_size.min(MAX_CONTEXT_WINDOW)
    }

    /// Read the API key from the configured variable, then from `API_KEY`
    pub fn api_key(&self) -> Option<String> {
        [self.api_key_env.as_str(), FALLBACK_API_KEY_ENV]
            .into_iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ZirnevisError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ZirnevisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ZirnevisError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the translator cannot work with
    pub fn validate(&self) -> Result<()> {
        if !AVAILABLE_MODELS.contains(&self.translate.model.as_str()) {
            return Err(ZirnevisError::Config(format!(
                "Model '{}' is not available. Valid models: {}",
                self.translate.model,
                AVAILABLE_MODELS.join(", ")
            )));
        }

        if self.translate.context_window_size > MAX_CONTEXT_WINDOW {
            warn!(
                "Context window {} exceeds {}, clamping",
                self.translate.context_window_size, MAX_CONTEXT_WINDOW
            );
        }

        if self.translate.endpoint.trim().is_empty() {
            return Err(ZirnevisError::Config("Translation endpoint must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.translate.model, DEFAULT_MODEL);
        assert_eq!(config.translate.context_window(), 4);
        assert_eq!(config.translate.subject_profile(), SubjectProfile::Film);
        assert!(!config.output.allow_partial);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            "[translate]\nsubject = \"Documentary\"\ncontext_window_size = 25\n",
        )
        .unwrap();
        assert_eq!(config.translate.subject_profile(), SubjectProfile::Documentary);
        assert_eq!(config.translate.context_window(), MAX_CONTEXT_WINDOW);
        assert_eq!(config.translate.max_retry_passes, 1);
        assert_eq!(config.translate.endpoint, default_endpoint());
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = Config::from_toml("[translate]\nmodel = \"gpt-4\"\n").unwrap_err();
        assert!(matches!(err, ZirnevisError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_toml_error() {
        let err = Config::from_toml("[translate\nmodel = ").unwrap_err();
        assert!(matches!(err, ZirnevisError::Toml(_)));
    }

    #[test]
    fn test_unknown_subject_falls_back_to_generic() {
        let config = TranslateConfig {
            subject: "Cooking Show".to_string(),
            ..TranslateConfig::default()
        };
        assert_eq!(config.subject_profile(), SubjectProfile::Generic);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.translate.subject = "TV Series".to_string();
        config.output.allow_partial = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.subject, "TV Series");
        assert!(loaded.output.allow_partial);
    }
}
