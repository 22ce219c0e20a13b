use anyhow::Context;
use api_client::{CoinbaseClient, ExchangeClient};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use configuration::{LogLevel, Settings};
use core_types::{Credentials, Wallet};
use std::path::PathBuf;
use std::sync::Arc;
use valuation::{ValuationEngine, WalletSession};

/// The main entry point for the Warchest wallet tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load CB_API_KEY / CB_API_SECRET from a .env file when one is present.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = configuration::load_settings(cli.config.as_deref())
        .context("Failed to load settings")?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    let _log_guard = configuration::init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Wallet => handle_wallet(&settings).await,
        Commands::Ledger(args) => handle_ledger(&settings, args).await,
        Commands::User => handle_user(&settings).await,
        Commands::Serve(args) => handle_serve(settings, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks the value and profit of the crypto coins held in a Coinbase wallet.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file (defaults to ./warchest.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the supported coins held at the exchange and print their valuation.
    Wallet,
    /// Value the purchases recorded in a local ledger file at current exchange rates.
    Ledger(LedgerArgs),
    /// Print the exchange user id the configured API key belongs to.
    User,
    /// Serve the wallet and the static front-end over HTTP.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct LedgerArgs {
    /// The ledger file to read (defaults to `wallet.ledger_path`).
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// The interface to bind to (defaults to `server.host`).
    #[arg(long)]
    host: Option<String>,

    /// The port to listen on (defaults to `server.port`).
    #[arg(long)]
    port: Option<u16>,

    /// Serve the purchases of a local ledger file instead of discovering the exchange wallet.
    #[arg(long)]
    ledger: Option<PathBuf>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_engine(settings: &Settings) -> anyhow::Result<ValuationEngine> {
    let client = CoinbaseClient::new(&settings.exchange).context("Failed to build exchange client")?;
    Ok(ValuationEngine::new(
        Arc::new(client),
        &settings.wallet.supported_coins,
    ))
}

/// Rates are public, so a ledger can be valued without API credentials.
fn credentials_or_anonymous() -> Credentials {
    configuration::load_credentials().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "No exchange credentials, continuing with public endpoints only.");
        Credentials::default()
    })
}

fn load_ledger_wallet(settings: &Settings, file: Option<PathBuf>) -> anyhow::Result<Wallet> {
    let path = file
        .or_else(|| settings.wallet.ledger_path.clone())
        .context("No ledger file given; pass --file or set WARCHEST_CONFIG")?;
    let ledger = configuration::load_ledger(&path)?;
    Ok(ledger.into_wallet()?)
}

async fn handle_wallet(settings: &Settings) -> anyhow::Result<()> {
    let credentials = configuration::load_credentials()?;
    let engine = build_engine(settings)?;

    let wallet = engine
        .discover_wallet(&credentials)
        .await
        .context("Failed to discover wallet")?;

    print_wallet(&wallet);
    Ok(())
}

async fn handle_ledger(settings: &Settings, args: LedgerArgs) -> anyhow::Result<()> {
    let mut wallet = load_ledger_wallet(settings, args.file)?;
    let engine = build_engine(settings)?;

    engine
        .refresh_wallet(&mut wallet, &credentials_or_anonymous())
        .await;

    print_wallet(&wallet);
    Ok(())
}

async fn handle_user(settings: &Settings) -> anyhow::Result<()> {
    let credentials = configuration::load_credentials()?;
    let client = CoinbaseClient::new(&settings.exchange)?;

    let user_id = client
        .get_user_id(&credentials)
        .await
        .context("Failed to retrieve user")?;

    println!("{user_id}");
    Ok(())
}

async fn handle_serve(mut settings: Settings, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    let engine = build_engine(&settings)?;
    let session = match args.ledger {
        Some(path) => {
            let wallet = load_ledger_wallet(&settings, Some(path))?;
            tracing::info!(coins = wallet.coins.len(), "Serving wallet from local ledger.");
            WalletSession::from_wallet(engine, credentials_or_anonymous(), wallet)
        }
        None => WalletSession::new(engine, configuration::load_credentials()?),
    };

    web_server::run_server(&settings.server, Arc::new(session)).await
}

fn print_wallet(wallet: &Wallet) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Coin",
        "USD Rate",
        "Amount",
        "Cost",
        "Current Value",
        "Profit",
    ]);

    for coin in wallet.coins.values() {
        table.add_row(vec![
            Cell::new(&coin.symbol),
            Cell::new(coin.rates.usd).set_alignment(CellAlignment::Right),
            Cell::new(coin.amount).set_alignment(CellAlignment::Right),
            Cell::new(coin.cost.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(
                coin.current_value()
                    .map_or_else(|| "-".to_string(), |value| value.round_dp(2).to_string()),
            )
            .set_alignment(CellAlignment::Right),
            Cell::new(coin.profit.round_dp(2)).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
    println!("Net profit: {} USD", wallet.net_profit.round_dp(2));
}
