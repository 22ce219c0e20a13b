use crate::error::ConfigError;
use core_types::{CoinTransaction, Wallet, WarchestCoin};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Purchases recorded by hand, for holdings the exchange does not know about.
///
/// The file looks like:
///
/// ```json
/// { "coin_purchases": [
///     { "coin_symbol": "DOGE", "amount": 100, "purchased_price_usd": 0.05, "transaction_fee": 1.99 }
/// ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Ledger {
    pub coin_purchases: Vec<LedgerPurchase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerPurchase {
    pub coin_symbol: String,
    pub amount: Decimal,
    /// Price paid per unit, in USD.
    pub purchased_price_usd: Decimal,
    #[serde(default)]
    pub transaction_fee: Decimal,
}

impl Ledger {
    /// Groups the purchases by symbol into coins with preloaded transactions.
    ///
    /// Rates are left at zero, so each coin's profit starts as the negative of its cost
    /// until the first refresh prices it. Fails if a coin's purchases cannot be totalled.
    pub fn into_wallet(self) -> Result<Wallet, ConfigError> {
        let mut coins: BTreeMap<String, WarchestCoin> = BTreeMap::new();

        for purchase in self.coin_purchases {
            let symbol = purchase.coin_symbol.trim().to_uppercase();
            let coin = coins
                .entry(symbol.clone())
                .or_insert_with(|| WarchestCoin::new(String::new(), symbol));
            coin.transactions.push(CoinTransaction {
                num_coins: purchase.amount,
                purchased_price: purchase.purchased_price_usd,
                transaction_fee: purchase.transaction_fee,
            });
        }

        for coin in coins.values_mut() {
            coin.recompute_cost()
                .and_then(|()| coin.recompute_profit())
                .map_err(|source| ConfigError::LedgerOverflow {
                    symbol: coin.symbol.clone(),
                    source,
                })?;
        }

        Ok(Wallet::new(coins))
    }
}

/// Reads and parses a ledger file.
pub fn load_ledger(path: &Path) -> Result<Ledger, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::LedgerNotFound(path.to_path_buf()),
        _ => ConfigError::LedgerRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let ledger = serde_json::from_str::<Ledger>(&contents).map_err(|source| {
        ConfigError::MalformedLedger {
            path: path.to_path_buf(),
            source,
        }
    })?;

    tracing::debug!(
        path = %path.display(),
        purchases = ledger.coin_purchases.len(),
        "Loaded ledger file."
    );
    Ok(ledger)
}
