use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use quill_core::Agent;
use quill_engine::{GenerationOrchestrator, OrchestratorConfig};
use quill_llm::{ChatAgentConfig, ChatCompletionsAgent, Summarizer, WritingAdapter};
use quill_settings::{BotConfig, QuillSettings};
use quill_store::SessionStore;
use quill_telemetry::TelemetryConfig;

#[derive(Parser, Debug)]
#[command(name = "quill", about = "Streaming story continuation server")]
struct Cli {
    /// Path to the JSON settings file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn chat_agent(name: &str, bot: &BotConfig, system_message: &str) -> anyhow::Result<Arc<dyn Agent>> {
    let agent = ChatCompletionsAgent::new(ChatAgentConfig {
        name: name.to_string(),
        model: bot.model.clone(),
        base_url: bot.model_server.clone(),
        api_key: bot.api_key.clone(),
        system_message: system_message.to_string(),
        top_p: bot.generate_cfg.top_p,
        temperature: bot.generate_cfg.temperature,
        max_tokens: bot.generate_cfg.max_tokens,
    })
    .with_context(|| format!("failed to build {name} agent"))?;
    Ok(Arc::new(agent))
}

fn build_orchestrator(
    settings: &QuillSettings,
    store: Arc<SessionStore>,
) -> anyhow::Result<GenerationOrchestrator> {
    let summary_agent = chat_agent(
        "summary_bot",
        &settings.llm_config.summary_bot,
        &settings.instructions.summary_instruction,
    )?;
    let writing_agent = chat_agent(
        "writing_bot",
        &settings.llm_config.writing_bot,
        &settings.instructions.writing_instruction,
    )?;

    let app = &settings.app_config;
    Ok(GenerationOrchestrator::new(
        store,
        Summarizer::new(summary_agent),
        WritingAdapter::new(writing_agent),
        OrchestratorConfig {
            threshold: app.text_length_threshold,
            chunk_delay: app.chunk_delay(),
            restart_rollback: app.restart_rollback,
            ..OrchestratorConfig::default()
        },
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = quill_settings::load_settings_from_path(&cli.config)
        .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
    let app = &settings.app_config;

    let telemetry = if app.debug {
        TelemetryConfig::debug()
    } else {
        TelemetryConfig::default()
    };
    quill_telemetry::init_telemetry(&telemetry);

    tracing::info!(
        summary_model = %settings.llm_config.summary_bot.model,
        writing_model = %settings.llm_config.writing_bot.model,
        model_server = %settings.llm_config.writing_bot.model_server,
        threshold = app.text_length_threshold,
        "configuration loaded"
    );

    let store = Arc::new(SessionStore::new());
    let orchestrator = Arc::new(build_orchestrator(&settings, Arc::clone(&store))?);

    let shutdown = CancellationToken::new();
    let eviction = app.session_ttl().map(|ttl| {
        tracing::info!(ttl_secs = ttl.as_secs(), "idle session eviction enabled");
        quill_store::start_eviction_task(
            Arc::clone(&store),
            ttl,
            app.eviction_interval(),
            shutdown.clone(),
        )
    });

    let server_config = quill_server::ServerConfig {
        host: app.host.clone(),
        port: app.port,
        max_upload_bytes: app.max_upload_bytes(),
    };
    let handle = quill_server::start(server_config, orchestrator)
        .await
        .context("failed to start server")?;

    tracing::info!(host = %app.host, port = handle.port, "quill ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    shutdown.cancel();
    if let Some(task) = eviction {
        let _ = task.await;
    }
    handle.stop().await;
    Ok(())
}
