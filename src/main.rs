//! Colloquy - multi-character LLM dialogue simulator
//!
//! Loads a cast of characters, lets them take turns talking through one
//! LLM backend, and saves the transcript (plus an optional summary that
//! seeds the next run).

mod character;
mod config;
mod interactive;
mod llm;
mod memory;
mod orchestrator;
mod provider;
mod summary;
mod system_prompt;
mod transcript;

#[cfg(test)]
mod testing;

use character::CharacterRegistry;
use config::Settings;
use interactive::Prompter;
use llm::LlmConfig;
use memory::MemoryStore;
use orchestrator::Orchestrator;
use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colloquy=info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the conversation itself
    if std::env::var_os("COLLOQUY_LOG_JSON").is_some() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn interactive_enabled() -> bool {
    std::env::var_os("COLLOQUY_NON_INTERACTIVE").is_none() && std::io::stdin().is_terminal()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_logging();

    let mut settings = Settings::from_env();
    let memory = MemoryStore::new(&settings.memory_path);
    let registry = CharacterRegistry::load(&settings.characters_dir)?;
    if registry.is_empty() {
        tracing::warn!(dir = %settings.characters_dir.display(), "Roster is empty; nobody will speak");
    }

    if interactive_enabled() {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        interactive::configure(&mut settings, &memory, &mut prompter)?;
    }

    let llm_config = LlmConfig::from_env();
    let llm = llm::create_service(settings.provider_type, &llm_config)?;
    let provider = provider::for_backend(settings.provider_type, llm);

    tracing::info!(
        provider = %settings.provider_type,
        model = %llm_config.model_for(settings.provider_type),
        characters = registry.len(),
        turns = settings.turns,
        memory = %memory.path().display(),
        "Starting conversation"
    );

    let report = Orchestrator::new(
        &registry,
        provider.as_ref(),
        &settings,
        &memory,
        std::io::stdout(),
    )
    .run()
    .await;

    tracing::info!(
        stop = ?report.stop,
        messages = report.transcript.len(),
        memory_saved = report.memory_saved,
        "Run finished"
    );
    if let Some(path) = &report.saved_to {
        println!("\nConversation saved to {}", path.display());
    }

    Ok(())
}
