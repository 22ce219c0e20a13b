use core_types::{Account, CoinRates, CoinTransaction};
use rust_decimal::Decimal;
use serde::Deserialize;

// Only the fields we read are declared; serde ignores the rest of each Coinbase payload.

/// The `{ "data": ... }` envelope wrapping every v2 response.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// The envelope of list endpoints such as `GET /v2/accounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_uri: Option<String>,
}

/// A money value as Coinbase sends it, e.g. `{"amount": "1.00", "currency": "ETH"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoneyHash {
    pub amount: Decimal,
}

/// A single account from `GET /v2/accounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub currency: AccountCurrency,
    pub balance: MoneyHash,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountCurrency {
    pub code: String,
}

impl From<AccountResponse> for Account {
    fn from(raw: AccountResponse) -> Self {
        Account {
            account_id: raw.id,
            currency_code: raw.currency.code,
            balance_amount: raw.balance.amount,
        }
    }
}

/// The `data` object of `GET /v2/exchange-rates?currency=<SYMBOL>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRatesResponse {
    pub rates: RatesResponse,
}

/// Rates arrive as decimal strings keyed by fiat code; absent codes read as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatesResponse {
    #[serde(rename = "EUR", default)]
    pub eur: Decimal,
    #[serde(rename = "GBP", default)]
    pub gbp: Decimal,
    #[serde(rename = "USD", default)]
    pub usd: Decimal,
}

impl From<RatesResponse> for CoinRates {
    fn from(raw: RatesResponse) -> Self {
        CoinRates {
            eur: raw.eur,
            gbp: raw.gbp,
            usd: raw.usd,
        }
    }
}

/// A single entry from `GET /v2/accounts/{id}/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    pub amount: MoneyHash,
    pub native_amount: MoneyHash,
}

impl From<TransactionResponse> for CoinTransaction {
    /// The exchange folds its fee into `native_amount`, so no separate fee is recorded.
    fn from(raw: TransactionResponse) -> Self {
        CoinTransaction {
            num_coins: raw.amount.amount,
            purchased_price: raw.native_amount.amount,
            transaction_fee: Decimal::ZERO,
        }
    }
}

/// The `data` object of `GET /v2/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
}
