//! protoqa CLI
//!
//! Main entry point for the protoqa command-line tool.
//! Turns PDF-extracted clinical protocols into question-answer datasets and
//! scores them with retrieval-augmented-generation metrics.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ApplySummariesCommand, ChunkCommand, EvaluateCommand, GenerateCommand, InventoryCommand,
    SummarizeCommand,
};
use protoqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// protoqa - QA dataset generation and evaluation for clinical protocols
#[derive(Parser, Debug)]
#[command(name = "protoqa")]
#[command(about = "QA dataset generation and evaluation for clinical protocols", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PROTOQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PROTOQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "PROTOQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "PROTOQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment every document folder into section chunks
    Chunk(ChunkCommand),

    /// List figures and tables with the text nested under them
    Inventory(InventoryCommand),

    /// Summarize inventory figures and tables
    Summarize(SummarizeCommand),

    /// Write inventory summaries back into a structured document
    ApplySummaries(ApplySummariesCommand),

    /// Generate QA pairs from section chunks
    Generate(GenerateCommand),

    /// Score QA pairs with RAG metrics
    Evaluate(EvaluateCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and the workspace config file
    let mut config = AppConfig::load()?;
    if let Some(path) = cli.config.as_deref() {
        config = config.merge_yaml(path)?;
    }

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_dir.as_deref(),
    )?;

    tracing::info!("protoqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Chunk(_) => "chunk",
        Commands::Inventory(_) => "inventory",
        Commands::Summarize(_) => "summarize",
        Commands::ApplySummaries(_) => "apply-summaries",
        Commands::Generate(_) => "generate",
        Commands::Evaluate(_) => "evaluate",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Chunk(cmd) => cmd.execute(&config),
        Commands::Inventory(cmd) => cmd.execute(&config),
        Commands::Summarize(cmd) => cmd.execute(&config).await,
        Commands::ApplySummaries(cmd) => cmd.execute(&config),
        Commands::Generate(cmd) => cmd.execute(&config).await,
        Commands::Evaluate(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
