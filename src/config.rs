//! Engine configuration.
//!
//! Embedding applications configure the engine through a TOML file (or
//! any other source deserializing into [`EngineConfig`]) and hand the
//! result to [`planner_from_config`]. Everything stays explicit: model,
//! credentials, endpoint, timeouts, and retry policy travel through the
//! constructor, never through globals.
//!
//! ```toml
//! [backend]
//! base_url = "https://api.openai.com"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [planner]
//! session_timeout_secs = 45
//! retry_max_attempts = 2
//! validation = "strict"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::backend::openai::{OpenAiBackend, OpenAiConfig};
use crate::error::PlanError;
use crate::planner::types::{
    DEFAULT_MAX_CONCURRENT_SESSIONS, DEFAULT_MAX_RETRY_ATTEMPTS, DEFAULT_MAX_TURNS,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_SESSION_TIMEOUT_SECS,
};
use crate::planner::{Planner, PlannerConfig, RetryPolicy};
use crate::validate::ValidationMode;

/// Environment variable consulted when no key source is configured.
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Root configuration for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Reasoning-backend endpoint and credentials.
    #[serde(default)]
    pub backend: BackendSettings,
    /// Session behavior.
    #[serde(default)]
    pub planner: PlannerSettings,
}

/// Backend endpoint and credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Inline API key. Prefer `api_key_env` outside of tests.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: None,
        }
    }
}

impl BackendSettings {
    /// Resolve the API key: inline value first, then the configured
    /// environment variable, then `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Config`] when no source yields a key.
    pub fn resolve_api_key(&self) -> Result<String, PlanError> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Ok(key.clone());
        }
        let var = self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        std::env::var(var)
            .map_err(|_| PlanError::Config(format!("no API key: set {var} or [backend] api_key")))
    }
}

/// Session behavior settings, mirroring [`PlannerConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Maximum backend round trips per session.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Overall deadline for one session attempt, in seconds.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// Cap on concurrent sessions.
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
    /// Retry attempts beyond the first.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Strict or lenient validation.
    #[serde(default)]
    pub validation: ValidationMode,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            session_timeout_secs: default_session_timeout_secs(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            validation: ValidationMode::default(),
        }
    }
}

impl PlannerSettings {
    /// Convert into the planner's runtime configuration.
    pub fn to_planner_config(&self) -> PlannerConfig {
        PlannerConfig::new()
            .with_max_turns(self.max_turns)
            .with_session_timeout_secs(self.session_timeout_secs)
            .with_max_concurrent_sessions(self.max_concurrent_sessions)
            .with_retry(
                RetryPolicy::new()
                    .with_max_attempts(self.retry_max_attempts)
                    .with_base_delay_ms(self.retry_base_delay_ms)
                    .with_max_delay_ms(self.retry_max_delay_ms),
            )
            .with_validation(self.validation)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

fn default_session_timeout_secs() -> u64 {
    DEFAULT_SESSION_TIMEOUT_SECS
}

fn default_max_concurrent_sessions() -> usize {
    DEFAULT_MAX_CONCURRENT_SESSIONS
}

fn default_retry_max_attempts() -> u32 {
    DEFAULT_MAX_RETRY_ATTEMPTS
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_retry_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}

/// The built-in default configuration.
pub fn default_config() -> EngineConfig {
    EngineConfig::default()
}

/// Parse a TOML string into a validated [`EngineConfig`].
///
/// # Errors
///
/// Returns [`PlanError::Config`] on TOML syntax errors or invalid values.
pub fn parse_config(text: &str) -> Result<EngineConfig, PlanError> {
    let config: EngineConfig =
        toml::from_str(text).map_err(|e| PlanError::Config(format!("invalid config: {e}")))?;
    validate_config(&config)?;
    Ok(config)
}

/// Read and validate a TOML config file.
///
/// # Errors
///
/// Returns [`PlanError::Config`] when the file cannot be read or fails
/// validation.
pub fn read_config(path: &Path) -> Result<EngineConfig, PlanError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PlanError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&text)
}

/// Check config invariants.
///
/// # Errors
///
/// Returns [`PlanError::Config`] naming the first invalid field.
pub fn validate_config(config: &EngineConfig) -> Result<(), PlanError> {
    if config.backend.model.trim().is_empty() {
        return Err(PlanError::Config("backend model is empty".to_string()));
    }
    if config.backend.base_url.trim().is_empty() {
        return Err(PlanError::Config("backend base_url is empty".to_string()));
    }
    if config.planner.max_turns == 0 {
        return Err(PlanError::Config("planner max_turns must be at least 1".to_string()));
    }
    if config.planner.session_timeout_secs == 0 {
        return Err(PlanError::Config(
            "planner session_timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Build a ready-to-use [`Planner`] over an OpenAI-compatible backend
/// from a validated config.
///
/// # Errors
///
/// Returns [`PlanError::Config`] on invalid settings or a missing API key.
pub fn planner_from_config(config: &EngineConfig) -> Result<Planner, PlanError> {
    validate_config(config)?;
    let api_key = config.backend.resolve_api_key()?;
    let backend = OpenAiBackend::new(
        OpenAiConfig::new(api_key, config.backend.model.clone())
            .with_base_url(config.backend.base_url.clone()),
    );
    Ok(Planner::new(
        Arc::new(backend),
        config.planner.to_planner_config(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&default_config()).is_ok());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config = parse_config(
            r#"
            [backend]
            model = "llama3:8b"
            base_url = "http://localhost:11434"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.backend.model, "llama3:8b");
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert_eq!(config.planner.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.planner.validation, ValidationMode::Strict);
    }

    #[test]
    fn parse_lenient_validation_mode() {
        let config = parse_config(
            r#"
            [planner]
            validation = "lenient"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.planner.validation, ValidationMode::Lenient);
    }

    #[test]
    fn parse_rejects_bad_toml() {
        let err = parse_config("[backend\nmodel = ").expect_err("syntax error");
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut config = default_config();
        config.backend.model = "  ".to_string();
        let err = validate_config(&config).expect_err("empty model");
        assert_eq!(err.code(), "CONFIG_INVALID");
        assert!(err.message().contains("model"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = default_config();
        config.planner.session_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_zero_turns() {
        let mut config = default_config();
        config.planner.max_turns = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn read_config_round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tempora.toml");
        let mut file = std::fs::File::create(&path).expect("create file");
        writeln!(
            file,
            "[backend]\nmodel = \"gpt-4o\"\n\n[planner]\nmax_turns = 3"
        )
        .expect("write config");

        let config = read_config(&path).expect("valid config");
        assert_eq!(config.backend.model, "gpt-4o");
        assert_eq!(config.planner.max_turns, 3);
    }

    #[test]
    fn read_config_missing_file_is_config_error() {
        let err = read_config(Path::new("/nonexistent/tempora.toml")).expect_err("missing file");
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn resolve_api_key_prefers_inline() {
        let settings = BackendSettings {
            api_key: Some("sk-inline".to_string()),
            ..BackendSettings::default()
        };
        assert_eq!(settings.resolve_api_key().expect("inline key"), "sk-inline");
    }

    #[test]
    fn resolve_api_key_missing_everywhere_is_config_error() {
        let settings = BackendSettings {
            api_key: None,
            api_key_env: Some("TEMPORA_TEST_KEY_THAT_DOES_NOT_EXIST".to_string()),
            ..BackendSettings::default()
        };
        let err = settings.resolve_api_key().expect_err("no key");
        assert_eq!(err.code(), "CONFIG_INVALID");
        assert!(err.message().contains("TEMPORA_TEST_KEY_THAT_DOES_NOT_EXIST"));
    }

    #[test]
    fn planner_from_config_builds_with_inline_key() {
        let mut config = default_config();
        config.backend.api_key = Some("sk-test".to_string());
        config.planner.validation = ValidationMode::Lenient;
        let planner = planner_from_config(&config).expect("planner");
        assert_eq!(planner.config().validation, ValidationMode::Lenient);
    }

    #[test]
    fn to_planner_config_carries_retry_settings() {
        let settings = PlannerSettings {
            retry_max_attempts: 5,
            retry_base_delay_ms: 10,
            ..PlannerSettings::default()
        };
        let config = settings.to_planner_config();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 10);
    }
}
