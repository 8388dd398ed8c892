//! Token tracker console binary

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracker_core::{Config, Console, Context, Ledger};

/// Interactive token balance tracker
#[derive(Debug, Parser)]
#[command(name = "token-tracker", version)]
struct Args {
    /// RPC endpoint of the chain client
    #[arg(long = "rpc")]
    rpc_endpoint: Option<String>,

    /// WebSocket endpoint of the chain client
    #[arg(long = "ws")]
    ws_endpoint: Option<String>,

    /// Program ID for the token tracker
    #[arg(long = "program")]
    program_id: Option<String>,

    /// TOML config file, applied before environment and flags
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_filter))
                .context("Invalid log filter")?,
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config));
    // A pending stdin read would otherwise hold up runtime shutdown.
    runtime.shutdown_background();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        rpc = %config.rpc_endpoint,
        ws = %config.ws_endpoint,
        "Starting token tracker"
    );

    let ledger = Ledger::open(config).context("Failed to initialize token tracker")?;

    let shutdown = CancellationToken::new();
    let ctx = Context::with_token(shutdown.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            shutdown.cancel();
        }
    });

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run(&ctx, &ledger).await.context("CLI error")?;

    let metrics = ledger.metrics();
    tracing::info!(
        accounts = ledger.account_count(),
        deposits = metrics.deposits_total.get(),
        withdrawals = metrics.withdrawals_total.get(),
        "Shutting down token tracker"
    );
    Ok(())
}

/// Defaults, then config file, then `TRACKER_*` environment, then flags
fn load_config(args: Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;

    if let Some(endpoint) = args.rpc_endpoint {
        config.rpc_endpoint = endpoint;
    }
    if let Some(endpoint) = args.ws_endpoint {
        config.ws_endpoint = endpoint;
    }
    if let Some(program_id) = args.program_id {
        config.program_id = Some(program_id);
    }

    if config.program_id.as_deref().map_or(true, str::is_empty) {
        anyhow::bail!("Program ID is required");
    }
    config.validate()?;

    Ok(config)
}
