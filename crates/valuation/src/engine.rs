use crate::error::ValuationError;
use api_client::ExchangeClient;
use api_client::error::ApiError;
use core_types::{CoinRates, CoreError, Credentials, Wallet, WarchestCoin};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The result of one step of the per-coin pipeline.
///
/// A failed step never aborts the pipeline. The affected data is reset to its neutral value
/// and the failure is carried here so the caller can still see that it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Fresh,
    /// The exchange call failed.
    Degraded(ApiError),
    /// The exchange answered with figures too large to compute with.
    Overflowed(CoreError),
}

impl StepOutcome {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, StepOutcome::Fresh)
    }
}

/// What happened while one coin was brought up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinUpdate {
    pub symbol: String,
    /// `None` when the already-loaded transactions were reused without trouble.
    pub transactions: Option<StepOutcome>,
    pub rates: StepOutcome,
}

impl CoinUpdate {
    pub fn is_degraded(&self) -> bool {
        self.rates.is_degraded()
            || self
                .transactions
                .as_ref()
                .is_some_and(StepOutcome::is_degraded)
    }
}

/// Turns exchange accounts into priced, cost-adjusted coins.
///
/// Every coin moves through the same fixed sequence: load transactions, compute cost,
/// load rates, compute profit. Coins are processed one at a time and each step awaits the
/// previous one, so no two exchange calls are ever in flight together.
pub struct ValuationEngine {
    client: Arc<dyn ExchangeClient>,
    supported_coins: BTreeSet<String>,
}

impl ValuationEngine {
    /// Creates an engine that only values the given coin symbols (case-insensitive).
    pub fn new<I, S>(client: Arc<dyn ExchangeClient>, supported_coins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            client,
            supported_coins: supported_coins
                .into_iter()
                .map(|symbol| symbol.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn is_supported(&self, symbol: &str) -> bool {
        self.supported_coins.contains(&symbol.trim().to_uppercase())
    }

    /// Replaces the coin's transactions with the exchange's list, or with nothing on failure.
    pub async fn load_transactions(
        &self,
        coin: &mut WarchestCoin,
        credentials: &Credentials,
    ) -> StepOutcome {
        match self.client.get_transactions(&coin.account_id, credentials).await {
            Ok(transactions) => {
                tracing::debug!(symbol = %coin.symbol, count = transactions.len(), "Loaded transactions.");
                coin.transactions = transactions;
                StepOutcome::Fresh
            }
            Err(e) => {
                tracing::warn!(symbol = %coin.symbol, error = %e, "Failed retrieving transactions, treating coin as empty.");
                coin.transactions.clear();
                StepOutcome::Degraded(e)
            }
        }
    }

    /// Derives `amount` and `cost` from the coin's transactions.
    ///
    /// Transactions that cannot be totalled are dropped, leaving the coin empty.
    pub fn compute_cost(coin: &mut WarchestCoin) -> Result<(), CoreError> {
        if let Err(e) = coin.recompute_cost() {
            tracing::warn!(symbol = %coin.symbol, error = %e, "Transactions cannot be totalled, treating coin as empty.");
            coin.transactions.clear();
            coin.amount = Decimal::ZERO;
            coin.cost = Decimal::ZERO;
            return Err(e);
        }
        tracing::debug!(symbol = %coin.symbol, amount = %coin.amount, cost = %coin.cost, "Computed cost basis.");
        Ok(())
    }

    /// Overwrites the coin's rates with the exchange's, or with zeros on failure.
    pub async fn load_rates(&self, coin: &mut WarchestCoin) -> StepOutcome {
        match self.client.get_exchange_rate(&coin.symbol).await {
            Ok(rates) => {
                coin.rates = rates;
                StepOutcome::Fresh
            }
            Err(e) => {
                tracing::warn!(symbol = %coin.symbol, error = %e, "Failed to retrieve market rates, resetting to zero.");
                coin.rates = CoinRates::ZERO;
                StepOutcome::Degraded(e)
            }
        }
    }

    /// Derives `profit` from the coin's current USD rate, amount and cost.
    ///
    /// Rates that value the holding out of range are reset to zero, as if they had not loaded.
    pub fn compute_profit(coin: &mut WarchestCoin) -> Result<(), CoreError> {
        if let Err(e) = coin.recompute_profit() {
            tracing::warn!(symbol = %coin.symbol, error = %e, "Holding cannot be valued, resetting rates to zero.");
            coin.rates = CoinRates::ZERO;
            coin.profit = -coin.cost;
            return Err(e);
        }
        tracing::debug!(symbol = %coin.symbol, usd = %coin.rates.usd, profit = %coin.profit, "Computed profit.");
        Ok(())
    }

    /// Runs the full pipeline for one coin, overwriting every derived field.
    pub async fn update_coin(&self, coin: &mut WarchestCoin, credentials: &Credentials) -> CoinUpdate {
        let mut transactions = self.load_transactions(coin, credentials).await;
        if let Err(e) = Self::compute_cost(coin) {
            transactions = StepOutcome::Overflowed(e);
        }
        let mut rates = self.load_rates(coin).await;
        if let Err(e) = Self::compute_profit(coin) {
            rates = StepOutcome::Overflowed(e);
        }

        CoinUpdate {
            symbol: coin.symbol.clone(),
            transactions: Some(transactions),
            rates,
        }
    }

    /// Re-prices a coin whose transactions are already current.
    async fn reprice_coin(&self, coin: &mut WarchestCoin) -> CoinUpdate {
        let transactions = Self::compute_cost(coin).err().map(StepOutcome::Overflowed);
        let mut rates = self.load_rates(coin).await;
        if let Err(e) = Self::compute_profit(coin) {
            rates = StepOutcome::Overflowed(e);
        }

        CoinUpdate {
            symbol: coin.symbol.clone(),
            transactions,
            rates,
        }
    }

    /// Brings every coin in the wallet up to date and returns the new net profit.
    ///
    /// Coins without transactions go through the full pipeline; the rest keep their
    /// transactions and are only re-priced. Never fails: per-coin failures degrade to
    /// zeroed data and the sum is always produced.
    pub async fn refresh_wallet(&self, wallet: &mut Wallet, credentials: &Credentials) -> Decimal {
        let mut degraded = 0usize;

        for coin in wallet.coins.values_mut() {
            let update = if coin.transactions.is_empty() {
                self.update_coin(coin, credentials).await
            } else {
                self.reprice_coin(coin).await
            };
            if update.is_degraded() {
                degraded += 1;
            }
        }

        let net_profit = wallet.recompute_net_profit();
        tracing::info!(
            coins = wallet.coins.len(),
            degraded,
            net_profit = %net_profit,
            "Wallet refreshed."
        );
        net_profit
    }

    /// Lists the user's accounts and values every supported coin among them.
    ///
    /// Only a failure of the account listing itself is returned; failures while valuing an
    /// individual coin degrade that coin instead.
    pub async fn discover_coins(
        &self,
        credentials: &Credentials,
    ) -> Result<BTreeMap<String, WarchestCoin>, ValuationError> {
        let page = self.client.get_accounts(credentials).await?;
        tracing::info!(accounts = page.accounts.len(), "Retrieved exchange accounts.");

        let mut coins = BTreeMap::new();
        for account in page.accounts {
            if !self.is_supported(&account.currency_code) {
                tracing::debug!(symbol = %account.currency_code, "Skipping unsupported coin.");
                continue;
            }

            let symbol = account.currency_code.trim().to_uppercase();
            if coins.contains_key(&symbol) {
                tracing::warn!(%symbol, account_id = %account.account_id, "Ignoring duplicate account for coin.");
                continue;
            }

            let mut coin = WarchestCoin::new(account.account_id, symbol.clone());
            self.update_coin(&mut coin, credentials).await;
            coins.insert(symbol, coin);
        }

        tracing::info!(coins = coins.len(), "Discovered supported coins.");
        Ok(coins)
    }

    /// Discovers the user's coins and wraps them in a wallet with its net profit derived.
    pub async fn discover_wallet(&self, credentials: &Credentials) -> Result<Wallet, ValuationError> {
        Ok(Wallet::new(self.discover_coins(credentials).await?))
    }
}
