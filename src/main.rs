//! marsdash main entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use marsdash_api::start_server;
use marsdash_config::Config;
use marsdash_core::{default_range, get_snapshot, JsonlOverlayLog, Ledger};
use marsdash_parser::DefaultBeancountParser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::RwLock;

#[derive(Parser, Debug)]
#[command(name = "marsdash")]
#[command(version = "0.1.0")]
#[command(about = "Daily balance dashboard for Beancount ledgers", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API (default)
    Serve,
    /// Print the snapshot for a date range as JSON
    Snapshot {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Print the default date range as JSON
    DefaultRange,
    /// Print the default configuration file
    InitConfig,
}

fn print_default_config() -> anyhow::Result<()> {
    print!("{}", Config::generate_default());
    Ok(())
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn load_ledger(config: &Config) -> Ledger {
    let parser = Arc::new(DefaultBeancountParser);
    let mut ledger = Ledger::new(config, parser);

    let data_path = config.ledger_path();
    if data_path.exists() {
        if let Err(e) = ledger.load(data_path.clone()).await {
            log::error!("Failed to load ledger {}: {}", data_path.display(), e);
        }
    } else {
        log::warn!("Ledger file not found: {}", data_path.display());
    }
    ledger
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let ledger = load_ledger(&config).await;
    let overlay = Arc::new(JsonlOverlayLog::new(config.overlay_path()));

    match command {
        Command::Snapshot { start, end } => {
            let snapshot = get_snapshot(
                &ledger,
                overlay.as_ref(),
                Some(start.as_str()),
                Some(end.as_str()),
                &config.dashboard,
            )
            .await
            .map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::DefaultRange => {
            let range = default_range(&ledger).map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;
            println!("{}", serde_json::to_string_pretty(&range)?);
            Ok(())
        }
        Command::InitConfig => print_default_config(),
        Command::Serve => start_server(config, Arc::new(RwLock::new(ledger)), overlay).await,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve);

    // Needs no configuration file
    if let Command::InitConfig = command {
        return print_default_config();
    }

    let config = Config::load(args.config.clone())
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    init_logging(&config.logging.level);
    log::info!(
        "Config loaded: data path={}, main_file={}",
        config.data.path.display(),
        config.data.main_file
    );

    let rt = Runtime::new()?;
    rt.block_on(run(command, config))
}
