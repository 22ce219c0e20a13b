use crate::error::ConfigError;
use core_types::Credentials;
use std::env;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod ledger;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use ledger::{load_ledger, Ledger, LedgerPurchase};
pub use logging::init_tracing;
pub use settings::{
    ExchangeSettings, LogLevel, LoggingSettings, ServerSettings, Settings, WalletSettings,
};

pub const DEFAULT_SETTINGS_FILE: &str = "warchest.toml";
pub const DEFAULT_BASE_URL: &str = "https://api.coinbase.com";

pub const API_KEY_ENV: &str = "CB_API_KEY";
pub const API_SECRET_ENV: &str = "CB_API_SECRET";
const STATIC_PATH_ENV: &str = "WARCHEST_STATIC_PATH";
const LEDGER_PATH_ENV: &str = "WARCHEST_CONFIG";

/// Loads the application settings.
///
/// Sources, lowest precedence first: compiled-in defaults, the TOML file (`warchest.toml`
/// unless a path is given; only an explicitly given file is required to exist),
/// `WARCHEST_*` environment variables using `__` between sections
/// (e.g. `WARCHEST_SERVER__PORT=9000`), and finally the `WARCHEST_STATIC_PATH` and
/// `WARCHEST_CONFIG` shortcuts.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

    let builder = config::Config::builder()
        .set_default("exchange.base_url", DEFAULT_BASE_URL)?
        .set_default("exchange.timeout_secs", 10_i64)?
        .set_default("wallet.supported_coins", vec!["DOGE", "SHIB"])?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("server.static_path", "./public")?
        .set_default("logging.level", "info")?
        .add_source(config::File::from(file).required(path.is_some()))
        .add_source(
            config::Environment::with_prefix("WARCHEST")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("wallet.supported_coins")
                .try_parsing(true),
        )
        .set_override_option("server.static_path", env::var(STATIC_PATH_ENV).ok())?
        .set_override_option("wallet.ledger_path", env::var(LEDGER_PATH_ENV).ok())?
        .build()?;

    let mut settings = builder.try_deserialize::<Settings>()?;
    validate(&mut settings)?;
    Ok(settings)
}

fn validate(settings: &mut Settings) -> Result<(), ConfigError> {
    if settings.exchange.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "exchange.timeout_secs must be greater than zero".to_string(),
        ));
    }

    settings.exchange.base_url = settings.exchange.base_url.trim_end_matches('/').to_string();

    settings.wallet.supported_coins = settings
        .wallet
        .supported_coins
        .iter()
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect();
    if settings.wallet.supported_coins.is_empty() {
        return Err(ConfigError::ValidationError(
            "wallet.supported_coins must name at least one coin".to_string(),
        ));
    }

    Ok(())
}

/// Reads the exchange API key pair from `CB_API_KEY` and `CB_API_SECRET`.
pub fn load_credentials() -> Result<Credentials, ConfigError> {
    let api_key = env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingCredential(API_KEY_ENV))?;
    let api_secret =
        env::var(API_SECRET_ENV).map_err(|_| ConfigError::MissingCredential(API_SECRET_ENV))?;
    Ok(Credentials::new(api_key, api_secret))
}
