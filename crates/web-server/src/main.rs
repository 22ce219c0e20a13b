use anyhow::Context;
use api_client::CoinbaseClient;
use std::sync::Arc;
use valuation::{ValuationEngine, WalletSession};

// This main function is the entry point when running `cargo run -p web-server`.
// It wires a live wallet session from the environment and hands it to `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = configuration::load_settings(None).context("Failed to load settings")?;
    let _log_guard = configuration::init_tracing(&settings.logging)?;
    let credentials = configuration::load_credentials()?;

    let client = CoinbaseClient::new(&settings.exchange)?;
    let engine = ValuationEngine::new(Arc::new(client), &settings.wallet.supported_coins);
    let session = Arc::new(WalletSession::new(engine, credentials));

    web_server::run_server(&settings.server, session).await
}
