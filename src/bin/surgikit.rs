//! surgikit - surgical-supply procurement agent
//!
//! Usage:
//!   surgikit                          → chat (default session name)
//!   surgikit chat --session pabellon3 → chat on a named session
//!   surgikit config > surgikit.toml   → print the default config
//!   surgikit version                  → show version

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use surgikit::{build_runtime, chat, config, SurgikitConfig};
use surgikit_agent::SessionKey;
use surgikit_llm::AnthropicProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "surgikit",
    about = "Conversational surgical-supply procurement agent",
    version = env!("CARGO_PKG_VERSION"),
    long_about = "surgikit identifies a surgery, proposes its historical kit, waits for \
                  the professional to confirm it, then reconciles the final list against \
                  stock and records the usage.\n\
                  Requires ANTHROPIC_API_KEY for chat."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file (TOML)
    #[arg(short, long, global = true, default_value = "surgikit.toml")]
    config: PathBuf,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent in the terminal
    Chat {
        /// Session name (default: timestamped)
        #[arg(short, long)]
        session: Option<String>,
        /// Model to use (overrides the config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print the default config as TOML
    Config,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("surgikit v{}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => {
            print!("{}", SurgikitConfig::default().to_toml());
        }
        Some(Commands::Chat { session, model }) => {
            let _guard = init_tracing(cli.log_file.as_deref())?;
            start_chat(&cli.config, session, model).await?;
        }
        None => {
            let _guard = init_tracing(cli.log_file.as_deref())?;
            start_chat(&cli.config, None, None).await?;
        }
    }

    Ok(())
}

/// Stderr logging plus an optional log file. The returned guard flushes the
/// file writer on drop and must outlive the program.
fn init_tracing(
    log_file: Option<&std::path::Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "surgikit=info".into());
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {}", path.display(), e))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

async fn start_chat(
    config_path: &std::path::Path,
    session: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let api_key = config::api_key()?;

    let mut config = SurgikitConfig::load(config_path);
    if let Some(model) = model {
        config.model.name = model;
    }

    let provider = Arc::new(AnthropicProvider::new(api_key));
    let runtime = build_runtime(&config, provider)?;

    let key = SessionKey::new(
        session.unwrap_or_else(|| chrono::Utc::now().format("chat-%Y%m%d-%H%M%S").to_string()),
    );
    tracing::info!("Starting chat on session {}", key);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    chat::run(&runtime, &key, stdin).await
}
