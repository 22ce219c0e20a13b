use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The API key pair used to sign exchange requests.
///
/// Immutable once constructed. The secret never leaves this struct except as an HMAC key,
/// and the `Debug` output redacts it so credentials can be passed through `tracing` spans safely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Spot exchange rates for a single coin. Each rate is independently zero when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRates {
    pub eur: Decimal,
    pub gbp: Decimal,
    pub usd: Decimal,
}

impl CoinRates {
    /// The neutral value used whenever a rate lookup fails.
    pub const ZERO: CoinRates = CoinRates {
        eur: Decimal::ZERO,
        gbp: Decimal::ZERO,
        usd: Decimal::ZERO,
    };
}

/// One historical acquisition of a coin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTransaction {
    /// Units of the coin received.
    pub num_coins: Decimal,
    pub purchased_price: Decimal,
    pub transaction_fee: Decimal,
}

impl CoinTransaction {
    /// The contribution of this transaction to the coin's cost basis, or `None` on overflow.
    pub fn cost(&self) -> Option<Decimal> {
        self.num_coins
            .checked_mul(self.purchased_price)?
            .checked_add(self.transaction_fee)
    }
}

/// A single balance held at the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    /// The coin symbol, e.g. "BTC".
    pub currency_code: String,
    pub balance_amount: Decimal,
}

/// A held coin together with its transactions and the figures derived from them.
///
/// `amount`, `cost` and `profit` are never set directly; they are rebuilt from
/// `transactions` and `rates` by [`recompute_cost`](Self::recompute_cost) and
/// [`recompute_profit`](Self::recompute_profit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarchestCoin {
    pub account_id: String,
    pub symbol: String,
    pub rates: CoinRates,
    pub amount: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub transactions: Vec<CoinTransaction>,
}

impl WarchestCoin {
    /// Creates a coin with no transactions and zeroed derived fields.
    pub fn new(account_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            symbol: symbol.into(),
            rates: CoinRates::ZERO,
            amount: Decimal::ZERO,
            cost: Decimal::ZERO,
            profit: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    /// Rebuilds `amount` and `cost` from the transaction list.
    ///
    /// On overflow nothing is modified.
    pub fn recompute_cost(&mut self) -> Result<(), CoreError> {
        let (amount, cost) = self.transactions.iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(amount, cost), tx| {
                let amount = amount
                    .checked_add(tx.num_coins)
                    .ok_or(CoreError::Overflow("amount"))?;
                let cost = tx
                    .cost()
                    .and_then(|tx_cost| cost.checked_add(tx_cost))
                    .ok_or(CoreError::Overflow("cost"))?;
                Ok::<_, CoreError>((amount, cost))
            },
        )?;
        self.amount = amount;
        self.cost = cost;
        Ok(())
    }

    /// Rebuilds `profit` from the current USD rate, `amount` and `cost`.
    ///
    /// On overflow nothing is modified.
    pub fn recompute_profit(&mut self) -> Result<(), CoreError> {
        self.profit = self
            .current_value()
            .and_then(|value| value.checked_sub(self.cost))
            .ok_or(CoreError::Overflow("profit"))?;
        Ok(())
    }

    /// The USD value of the held units at the current rate, or `None` on overflow.
    pub fn current_value(&self) -> Option<Decimal> {
        self.rates.usd.checked_mul(self.amount)
    }
}

/// The aggregate root: every valued coin keyed by its symbol, plus the summed profit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub coins: BTreeMap<String, WarchestCoin>,
    pub net_profit: Decimal,
}

impl Wallet {
    /// Builds a wallet from already-valued coins, deriving `net_profit`.
    pub fn new(coins: BTreeMap<String, WarchestCoin>) -> Self {
        let mut wallet = Self {
            coins,
            net_profit: Decimal::ZERO,
        };
        wallet.recompute_net_profit();
        wallet
    }

    /// Sums the profit of every coin currently in the wallet into `net_profit`.
    ///
    /// The sum saturates at the `Decimal` bounds instead of overflowing.
    pub fn recompute_net_profit(&mut self) -> Decimal {
        self.net_profit = self
            .coins
            .values()
            .fold(Decimal::ZERO, |sum, coin| sum.saturating_add(coin.profit));
        self.net_profit
    }

    pub fn get_coin(&self, symbol: &str) -> Option<&WarchestCoin> {
        self.coins.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(num_coins: Decimal, purchased_price: Decimal, transaction_fee: Decimal) -> CoinTransaction {
        CoinTransaction {
            num_coins,
            purchased_price,
            transaction_fee,
        }
    }

    #[test]
    fn cost_sums_units_price_and_fee() {
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![tx(dec!(1.0), dec!(10.0), dec!(1.0)), tx(dec!(0.5), dec!(20.0), dec!(0.25))];

        coin.recompute_cost().unwrap();

        assert_eq!(coin.amount, dec!(1.5));
        assert_eq!(coin.cost, dec!(21.25));
    }

    #[test]
    fn recomputing_cost_twice_is_stable() {
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![tx(dec!(2), dec!(3.5), dec!(0.1))];

        coin.recompute_cost().unwrap();
        let first = (coin.amount, coin.cost);
        coin.recompute_cost().unwrap();

        assert_eq!((coin.amount, coin.cost), first);
    }

    #[test]
    fn profit_is_value_at_usd_rate_minus_cost() {
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![tx(dec!(1.0), dec!(10.0), dec!(1.0))];
        coin.rates.usd = dec!(12.99);

        coin.recompute_cost().unwrap();
        coin.recompute_profit().unwrap();

        assert_eq!(coin.cost, dec!(11.0));
        assert_eq!(coin.profit, dec!(1.99));
    }

    #[test]
    fn coin_without_transactions_is_all_zero() {
        let mut coin = WarchestCoin::new("A1", "DOGE");
        coin.rates.usd = dec!(0.25);

        coin.recompute_cost().unwrap();
        coin.recompute_profit().unwrap();

        assert!(coin.amount.is_zero());
        assert!(coin.cost.is_zero());
        assert!(coin.profit.is_zero());
    }

    #[test]
    fn net_profit_sums_every_coin() {
        let mut up = WarchestCoin::new("A1", "ETH");
        up.profit = dec!(1.99);
        let mut down = WarchestCoin::new("A2", "DOGE");
        down.profit = dec!(-3.50);

        let wallet = Wallet::new(BTreeMap::from([
            ("ETH".to_string(), up),
            ("DOGE".to_string(), down),
        ]));

        assert_eq!(wallet.net_profit, dec!(-1.51));
    }

    #[test]
    fn cost_overflow_is_reported_and_leaves_the_coin_untouched() {
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![tx(dec!(100000000000000000000), dec!(10000000000), dec!(0))];

        assert_eq!(coin.recompute_cost(), Err(CoreError::Overflow("cost")));
        assert!(coin.amount.is_zero());
        assert!(coin.cost.is_zero());
    }

    #[test]
    fn profit_overflow_is_reported_and_leaves_the_profit_untouched() {
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![tx(dec!(100000000000000000000), dec!(0), dec!(0))];
        coin.rates.usd = dec!(10000000000);
        coin.recompute_cost().unwrap();

        assert_eq!(coin.current_value(), None);
        assert_eq!(coin.recompute_profit(), Err(CoreError::Overflow("profit")));
        assert!(coin.profit.is_zero());
    }

    #[test]
    fn net_profit_saturates_instead_of_overflowing() {
        let mut a = WarchestCoin::new("A1", "ETH");
        a.profit = Decimal::MAX;
        let mut b = WarchestCoin::new("A2", "DOGE");
        b.profit = Decimal::MAX;

        let wallet = Wallet::new(BTreeMap::from([
            ("ETH".to_string(), a),
            ("DOGE".to_string(), b),
        ]));

        assert_eq!(wallet.net_profit, Decimal::MAX);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let credentials = Credentials::new("key", "super-secret");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("super-secret"));
    }
}
