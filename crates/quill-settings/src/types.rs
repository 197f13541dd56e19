use std::time::Duration;

use quill_core::RestartRollback;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level settings file.
#[derive(Clone, Debug, Deserialize)]
pub struct QuillSettings {
    pub llm_config: LlmConfig,
    pub instructions: Instructions,
    /// Required section; fields left out take their defaults.
    pub app_config: AppConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmConfig {
    pub summary_bot: BotConfig,
    pub writing_bot: BotConfig,
}

/// Connection settings for one OpenAI-compatible model server.
#[derive(Clone, Debug, Deserialize)]
pub struct BotConfig {
    pub model: String,
    pub model_server: String,
    #[serde(deserialize_with = "secret_string")]
    pub api_key: SecretString,
    pub generate_cfg: GenerateConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GenerateConfig {
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// System messages for the two agents.
#[derive(Clone, Debug, Deserialize)]
pub struct Instructions {
    pub summary_instruction: String,
    pub writing_instruction: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sources longer than this many characters are summarized first.
    pub text_length_threshold: usize,
    pub max_file_size_mb: u64,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    /// Pause after each streamed chunk. Zero disables it.
    pub chunk_delay_ms: u64,
    /// Idle sessions older than this are evicted. `None` keeps them forever.
    pub session_ttl_secs: Option<u64>,
    pub eviction_interval_secs: u64,
    pub restart_rollback: RestartRollback,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text_length_threshold: 100_000,
            max_file_size_mb: 16,
            host: "0.0.0.0".into(),
            port: 5000,
            debug: false,
            chunk_delay_ms: 10,
            session_ttl_secs: None,
            eviction_interval_secs: 60,
            restart_rollback: RestartRollback::Discard,
        }
    }
}

impl AppConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        self.session_ttl_secs.map(Duration::from_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_file_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

fn secret_string<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}
