// src/main.rs
// promptbrain CLI: analyze a single prompt and print the result as JSON (SPEC_FULL.md §2.1).

use std::io::{self, Read};
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use promptbrain::config::EngineConfig;
use promptbrain::history::Repository;
use promptbrain::llm::{LlmProvider, ReqwestLlmProvider};
use promptbrain::{Orchestrator, Prompt};

#[derive(Parser, Debug)]
#[command(name = "promptbrain", about = "Analyze a developer prompt against the GOLDEN framework")]
struct Cli {
    /// Prompt text to analyze. Reads from stdin if omitted.
    prompt: Option<String>,

    /// Originating application (e.g. "cursor", "claude-code")
    #[arg(long)]
    source_app: Option<String>,

    /// Project path the prompt was captured in
    #[arg(long)]
    project_path: Option<String>,

    /// Skip persisting the analysis to the history store
    #[arg(long)]
    no_persist: bool,
}

fn read_stdin_prompt() -> anyhow::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    config.validate()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.logging.level.parse::<Level>().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let text = match cli.prompt {
        Some(text) => text,
        None => read_stdin_prompt()?,
    };

    let mut prompt = Prompt::new(text);
    if let Some(source_app) = cli.source_app {
        prompt = prompt.with_source_app(source_app);
    }
    if let Some(project_path) = cli.project_path {
        prompt = prompt.with_project_path(project_path);
    }

    let provider: Arc<dyn LlmProvider> = Arc::new(ReqwestLlmProvider::new(
        config.ai_rewriter.endpoint.clone(),
        config.ai_rewriter.api_key.clone(),
        config.ai_rewriter.model.clone(),
        config.ai_rewriter.max_tokens,
    ));

    let repository = if cli.no_persist {
        None
    } else {
        Some(
            Repository::connect(
                &config.database.url,
                config.database.max_connections,
                config.golden.weakness_threshold_int(),
            )
            .await?,
        )
    };

    let orchestrator = Orchestrator::new(provider, repository, config);
    let result = orchestrator.analyze(prompt, None).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
