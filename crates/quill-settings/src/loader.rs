//! Settings loading, validation, and environment variable overrides.
//!
//! Loading flow:
//! 1. Read and parse the JSON file (missing file or required key is an error)
//! 2. Apply `QUILL_*` environment overrides (highest priority)
//! 3. Validate the merged result

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{BotConfig, QuillSettings};

/// Load settings from a specific path, apply env overrides, and validate.
pub fn load_settings_from_path(path: &Path) -> Result<QuillSettings> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.display().to_string()));
    }

    debug!(?path, "loading settings from file");
    let content = std::fs::read_to_string(path)?;
    let mut settings: QuillSettings = serde_json::from_str(&content)?;

    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Reject values that would leave the server unable to do its job.
pub fn validate(settings: &QuillSettings) -> Result<()> {
    validate_bot("summary_bot", &settings.llm_config.summary_bot)?;
    validate_bot("writing_bot", &settings.llm_config.writing_bot)?;

    let app = &settings.app_config;
    if app.text_length_threshold == 0 {
        return Err(SettingsError::InvalidValue(
            "app_config.text_length_threshold must be positive".into(),
        ));
    }
    if app.port == 0 {
        return Err(SettingsError::InvalidValue("app_config.port must be non-zero".into()));
    }
    if app.max_file_size_mb == 0 {
        return Err(SettingsError::InvalidValue(
            "app_config.max_file_size_mb must be positive".into(),
        ));
    }
    if app.session_ttl_secs.is_some() && app.eviction_interval_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "app_config.eviction_interval_secs must be positive when a session TTL is set".into(),
        ));
    }
    Ok(())
}

fn validate_bot(name: &str, bot: &BotConfig) -> Result<()> {
    if bot.model.trim().is_empty() {
        return Err(SettingsError::InvalidValue(format!("llm_config.{name}.model is empty")));
    }
    if bot.model_server.trim().is_empty() {
        return Err(SettingsError::InvalidValue(format!(
            "llm_config.{name}.model_server is empty"
        )));
    }
    if !bot.model_server.starts_with("http://") && !bot.model_server.starts_with("https://") {
        return Err(SettingsError::InvalidValue(format!(
            "llm_config.{name}.model_server must be an http(s) URL"
        )));
    }
    if bot.api_key.expose_secret().is_empty() {
        return Err(SettingsError::InvalidValue(format!("llm_config.{name}.api_key is empty")));
    }
    Ok(())
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (file value stays).
pub fn apply_env_overrides(settings: &mut QuillSettings) {
    if let Some(v) = read_env_string("QUILL_HOST") {
        settings.app_config.host = v;
    }
    if let Some(v) = read_env_parsed::<u16>("QUILL_PORT").filter(|p| *p > 0) {
        settings.app_config.port = v;
    }
    if let Some(v) = read_env_parsed::<usize>("QUILL_TEXT_LENGTH_THRESHOLD").filter(|t| *t > 0) {
        settings.app_config.text_length_threshold = v;
    }
    if let Some(v) = read_env_parsed::<u64>("QUILL_SESSION_TTL_SECS").filter(|t| *t > 0) {
        settings.app_config.session_ttl_secs = Some(v);
    }
    if let Some(v) = read_env_string("QUILL_SUMMARY_API_KEY") {
        settings.llm_config.summary_bot.api_key = SecretString::from(v);
    }
    if let Some(v) = read_env_string("QUILL_WRITING_API_KEY") {
        settings.llm_config.writing_bot.api_key = SecretString::from(v);
    }
}

/// Parse an env value, `None` when unparsable.
pub fn parse_value<T: std::str::FromStr>(val: &str) -> Option<T> {
    val.trim().parse().ok()
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let val = std::env::var(name).ok()?;
    let result = parse_value(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid env override, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::types::AppConfig;

    const VALID: &str = r#"{
        "llm_config": {
            "summary_bot": {
                "model": "qwen-long",
                "model_server": "https://dashscope.example.com/compatible-mode/v1",
                "api_key": "sk-summary",
                "generate_cfg": {"top_p": 0.8}
            },
            "writing_bot": {
                "model": "qwen-max",
                "model_server": "https://dashscope.example.com/compatible-mode/v1",
                "api_key": "sk-writing",
                "generate_cfg": {"top_p": 0.9, "temperature": 0.7}
            }
        },
        "instructions": {
            "summary_instruction": "Summarize the story.",
            "writing_instruction": "Continue the story."
        },
        "app_config": {"text_length_threshold": 5000, "port": 8000}
    }"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_file() {
        let file = write_config(VALID);
        let settings = load_settings_from_path(file.path()).unwrap();
        assert_eq!(settings.llm_config.summary_bot.model, "qwen-long");
        assert_eq!(settings.llm_config.writing_bot.generate_cfg.temperature, Some(0.7));
        assert_eq!(settings.llm_config.writing_bot.api_key.expose_secret(), "sk-writing");
        assert_eq!(settings.instructions.writing_instruction, "Continue the story.");
        assert_eq!(settings.app_config.text_length_threshold, 5000);
        assert_eq!(settings.app_config.chunk_delay_ms, 10);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings_from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let file = write_config("{not json");
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn missing_writing_bot_is_rejected() {
        let file = write_config(
            r#"{
                "llm_config": {
                    "summary_bot": {"model": "m", "model_server": "http://x", "api_key": "k", "generate_cfg": {}}
                },
                "instructions": {"summary_instruction": "s", "writing_instruction": "w"}
            }"#,
        );
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("writing_bot"), "got: {err}");
    }

    #[test]
    fn missing_generate_cfg_is_rejected() {
        let file = write_config(
            r#"{
                "llm_config": {
                    "summary_bot": {"model": "m", "model_server": "http://x", "api_key": "k"},
                    "writing_bot": {"model": "m", "model_server": "http://x", "api_key": "k", "generate_cfg": {}}
                },
                "instructions": {"summary_instruction": "s", "writing_instruction": "w"},
                "app_config": {}
            }"#,
        );
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("generate_cfg"), "got: {err}");
    }

    #[test]
    fn missing_app_config_is_rejected() {
        let without_app = VALID.replace(
            ",\n        \"app_config\": {\"text_length_threshold\": 5000, \"port\": 8000}",
            "",
        );
        assert!(!without_app.contains("app_config"));
        let file = write_config(&without_app);
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
        assert!(err.to_string().contains("app_config"), "got: {err}");
    }

    #[test]
    fn empty_app_config_takes_defaults() {
        let file = write_config(&VALID.replace(
            "{\"text_length_threshold\": 5000, \"port\": 8000}",
            "{}",
        ));
        let settings = load_settings_from_path(file.path()).unwrap();
        assert_eq!(settings.app_config, AppConfig::default());
    }

    #[test]
    fn empty_model_fails_validation() {
        let file = write_config(&VALID.replace("qwen-max", " "));
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        assert!(err.to_string().contains("writing_bot.model"));
    }

    #[test]
    fn non_http_server_fails_validation() {
        let file = write_config(&VALID.replace(
            "https://dashscope.example.com/compatible-mode/v1",
            "dashscope",
        ));
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("http(s) URL"));
    }

    #[test]
    fn zero_threshold_fails_validation() {
        let file = write_config(&VALID.replace("5000", "0"));
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("text_length_threshold"));
    }

    #[test]
    fn parse_value_cases() {
        assert_eq!(parse_value::<u16>("8080"), Some(8080));
        assert_eq!(parse_value::<u16>(" 42 "), Some(42));
        assert_eq!(parse_value::<u16>("70000"), None);
        assert_eq!(parse_value::<usize>("abc"), None);
    }
}
