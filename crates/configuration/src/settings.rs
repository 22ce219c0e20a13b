use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub exchange: ExchangeSettings,
    pub wallet: WalletSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Connection parameters for the exchange API.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSettings {
    /// Scheme and host of the exchange API, without a trailing slash.
    pub base_url: String,
    /// Client-side timeout applied to every outbound request.
    pub timeout_secs: u64,
    /// Sent as the `CB-VERSION` header when present.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Controls which holdings are valued.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSettings {
    /// Allow-list of coin symbols that discovery keeps.
    pub supported_coins: Vec<String>,
    /// Optional JSON file of locally-recorded purchases.
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding the browser front-end.
    pub static_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: LogLevel,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
