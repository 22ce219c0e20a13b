use crate::error::ApiError;
use crate::responses::{
    AccountResponse, DataEnvelope, ExchangeRatesResponse, PaginatedResponse, TransactionResponse,
    UserResponse,
};
use async_trait::async_trait;
use configuration::ExchangeSettings;
use core_types::{Account, CoinRates, CoinTransaction, Credentials};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub mod auth;
pub mod error;
pub mod responses;
pub mod transport;
// --- Public API ---
pub use auth::{sign, sign_at, AuthHeaders};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};

pub const ACCOUNTS_PATH: &str = "/v2/accounts";
pub const EXCHANGE_RATES_PATH: &str = "/v2/exchange-rates";
pub const USER_PATH: &str = "/v2/user";
pub const VERSION_HEADER: &str = "CB-VERSION";

/// The first page of the user's accounts.
///
/// Pagination cursors are not followed; `next_uri` is kept only so callers can tell that
/// the listing was truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountsPage {
    pub accounts: Vec<Account>,
    pub next_uri: Option<String>,
}

/// The generic, abstract interface for an exchange API client.
/// This trait is the contract that the valuation engine uses, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetches the first page of the user's accounts. (Authenticated)
    async fn get_accounts(&self, credentials: &Credentials) -> Result<AccountsPage, ApiError>;

    /// Fetches the spot rates of a coin. (Public)
    async fn get_exchange_rate(&self, symbol: &str) -> Result<CoinRates, ApiError>;

    /// Fetches the transactions recorded against one account. (Authenticated)
    async fn get_transactions(
        &self,
        account_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<CoinTransaction>, ApiError>;

    /// Fetches the opaque identifier of the account holder. (Authenticated)
    async fn get_user_id(&self, credentials: &Credentials) -> Result<String, ApiError>;
}

/// A concrete implementation of the `ExchangeClient` for the Coinbase v2 API.
#[derive(Clone)]
pub struct CoinbaseClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_version: Option<String>,
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(msg) => ApiError::Connection(msg),
            TransportError::Body(msg) => ApiError::Decoding(msg),
        }
    }
}

impl CoinbaseClient {
    /// Builds a client talking to the configured exchange over HTTP.
    pub fn new(settings: &ExchangeSettings) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(Duration::from_secs(settings.timeout_secs))?;
        let client = Self::with_transport(settings.base_url.clone(), Arc::new(transport));
        Ok(match &settings.api_version {
            Some(version) => client.with_api_version(version.clone()),
            None => client,
        })
    }

    /// Builds a client over any transport, e.g. an in-memory fake.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_version: None,
        }
    }

    /// Pins the API version sent in the `CB-VERSION` header.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Performs a GET against `path` (path plus query, no host) and decodes the body.
    ///
    /// When credentials are given the request is signed over exactly `path`.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::get(format!("{}{}", self.base_url, path));
        if let Some(version) = &self.api_version {
            request = request.with_header(VERSION_HEADER, version.as_str());
        }
        if let Some(credentials) = credentials {
            let headers = auth::sign(credentials, request.method.as_str(), path, &request.body);
            for (name, value) in headers.into_pairs() {
                request = request.with_header(name, value);
            }
        }

        tracing::debug!(path, signed = credentials.is_some(), "Sending exchange request.");
        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(path, error = %e, "Exchange request failed.");
            ApiError::from(e)
        })?;

        serde_json::from_slice::<T>(&response.body).map_err(|e| {
            tracing::warn!(path, status = %response.status, error = %e, "Unexpected response body.");
            ApiError::Unmarshal(format!("status {}: {}", response.status, e))
        })
    }
}

#[async_trait]
impl ExchangeClient for CoinbaseClient {
    async fn get_accounts(&self, credentials: &Credentials) -> Result<AccountsPage, ApiError> {
        let page: PaginatedResponse<AccountResponse> =
            self.get(ACCOUNTS_PATH, Some(credentials)).await?;

        let next_uri = page
            .pagination
            .and_then(|p| p.next_uri)
            .filter(|uri| !uri.is_empty());
        if let Some(uri) = &next_uri {
            tracing::warn!(next_uri = %uri, "Account listing has additional pages that are not followed.");
        }

        Ok(AccountsPage {
            accounts: page.data.into_iter().map(Account::from).collect(),
            next_uri,
        })
    }

    async fn get_exchange_rate(&self, symbol: &str) -> Result<CoinRates, ApiError> {
        let path = format!("{}?currency={}", EXCHANGE_RATES_PATH, symbol);
        let envelope: DataEnvelope<ExchangeRatesResponse> = self.get(&path, None).await?;
        Ok(envelope.data.rates.into())
    }

    async fn get_transactions(
        &self,
        account_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<CoinTransaction>, ApiError> {
        let path = format!("{}/{}/transactions", ACCOUNTS_PATH, account_id);
        let page: PaginatedResponse<TransactionResponse> =
            self.get(&path, Some(credentials)).await?;
        tracing::debug!(account_id, count = page.data.len(), "Fetched transactions.");
        Ok(page.data.into_iter().map(CoinTransaction::from).collect())
    }

    async fn get_user_id(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let envelope: DataEnvelope<UserResponse> = self.get(USER_PATH, Some(credentials)).await?;
        Ok(envelope.data.id)
    }
}
