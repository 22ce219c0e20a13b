use crate::engine::ValuationEngine;
use crate::error::ValuationError;
use core_types::{Credentials, Wallet};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No wallet has been discovered yet; the next refresh runs discovery.
    Uninitialized,
    /// A wallet exists; the next refresh re-prices it in place.
    Ready,
}

struct SessionInner {
    state: SessionState,
    wallet: Wallet,
}

/// The process-wide wallet shared by every request.
///
/// The first successful refresh discovers the wallet; later ones bring it up to date. All
/// refreshes are serialized behind one lock, so concurrent callers never interleave their
/// exchange calls or observe a half-updated wallet.
pub struct WalletSession {
    engine: ValuationEngine,
    credentials: Credentials,
    inner: Mutex<SessionInner>,
}

impl WalletSession {
    pub fn new(engine: ValuationEngine, credentials: Credentials) -> Self {
        Self {
            engine,
            credentials,
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                wallet: Wallet::default(),
            }),
        }
    }

    /// Starts from an already-built wallet, e.g. one loaded from a local ledger.
    pub fn from_wallet(engine: ValuationEngine, credentials: Credentials, wallet: Wallet) -> Self {
        Self {
            engine,
            credentials,
            inner: Mutex::new(SessionInner {
                state: SessionState::Ready,
                wallet,
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Brings the wallet up to date and returns a copy of it.
    ///
    /// Fails only while uninitialized and only when the account listing fails; the session
    /// then stays uninitialized and the next call retries discovery.
    pub async fn refresh(&self) -> Result<Wallet, ValuationError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        match inner.state {
            SessionState::Uninitialized => {
                tracing::info!("Discovering wallet.");
                inner.wallet = self.engine.discover_wallet(&self.credentials).await?;
                inner.state = SessionState::Ready;
            }
            SessionState::Ready => {
                self.engine
                    .refresh_wallet(&mut inner.wallet, &self.credentials)
                    .await;
            }
        }

        Ok(inner.wallet.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use api_client::{AccountsPage, ExchangeClient};
    use async_trait::async_trait;
    use core_types::{Account, CoinRates, CoinTransaction, WarchestCoin};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the account listing a set number of times, then serves one ETH account.
    struct FlakyExchange {
        failures_left: AtomicUsize,
        account_calls: AtomicUsize,
        transaction_calls: AtomicUsize,
    }

    impl FlakyExchange {
        fn failing(times: usize) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicUsize::new(times),
                account_calls: AtomicUsize::new(0),
                transaction_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExchangeClient for FlakyExchange {
        async fn get_accounts(&self, _credentials: &Credentials) -> Result<AccountsPage, ApiError> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures_left.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_left.store(remaining - 1, Ordering::SeqCst);
                return Err(ApiError::Connection("refused".to_string()));
            }
            Ok(AccountsPage {
                accounts: vec![Account {
                    account_id: "A1".to_string(),
                    currency_code: "ETH".to_string(),
                    balance_amount: dec!(1),
                }],
                next_uri: None,
            })
        }

        async fn get_exchange_rate(&self, _symbol: &str) -> Result<CoinRates, ApiError> {
            Ok(CoinRates {
                eur: dec!(11),
                gbp: dec!(10),
                usd: dec!(12.99),
            })
        }

        async fn get_transactions(
            &self,
            _account_id: &str,
            _credentials: &Credentials,
        ) -> Result<Vec<CoinTransaction>, ApiError> {
            self.transaction_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CoinTransaction {
                num_coins: dec!(1),
                purchased_price: dec!(11),
                transaction_fee: dec!(0),
            }])
        }

        async fn get_user_id(&self, _credentials: &Credentials) -> Result<String, ApiError> {
            Ok("user".to_string())
        }
    }

    fn session(exchange: Arc<FlakyExchange>) -> WalletSession {
        WalletSession::new(
            ValuationEngine::new(exchange, ["ETH"]),
            Credentials::new("key", "secret"),
        )
    }

    #[tokio::test]
    async fn first_refresh_discovers_and_later_ones_reprice() {
        let exchange = FlakyExchange::failing(0);
        let session = session(exchange.clone());
        assert_eq!(session.state().await, SessionState::Uninitialized);

        let first = session.refresh().await.unwrap();
        assert_eq!(session.state().await, SessionState::Ready);
        assert_eq!(first.net_profit, dec!(1.99));

        let second = session.refresh().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(exchange.account_calls.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.transaction_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_discovery_is_retried_on_the_next_refresh() {
        let exchange = FlakyExchange::failing(1);
        let session = session(exchange.clone());

        let err = session.refresh().await.unwrap_err();
        assert_eq!(err, ValuationError::Discovery(ApiError::Connection("refused".to_string())));
        assert_eq!(session.state().await, SessionState::Uninitialized);

        let wallet = session.refresh().await.unwrap();
        assert_eq!(session.state().await, SessionState::Ready);
        assert!(wallet.get_coin("ETH").is_some());
        assert_eq!(exchange.account_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_refreshes_discover_only_once() {
        let exchange = FlakyExchange::failing(0);
        let session = Arc::new(session(exchange.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.refresh().await })
            })
            .collect();
        for handle in handles {
            let wallet = handle.await.unwrap().unwrap();
            assert_eq!(wallet.net_profit, dec!(1.99));
        }

        assert_eq!(exchange.account_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_built_from_a_wallet_skips_discovery() {
        let exchange = FlakyExchange::failing(0);
        let mut coin = WarchestCoin::new("A1", "ETH");
        coin.transactions = vec![CoinTransaction {
            num_coins: dec!(2),
            purchased_price: dec!(5),
            transaction_fee: dec!(1),
        }];
        let wallet = Wallet::new(BTreeMap::from([("ETH".to_string(), coin)]));
        let session = WalletSession::from_wallet(
            ValuationEngine::new(exchange.clone(), ["ETH"]),
            Credentials::default(),
            wallet,
        );
        assert_eq!(session.state().await, SessionState::Ready);

        let refreshed = session.refresh().await.unwrap();

        // 2 * 12.99 - (2 * 5 + 1)
        assert_eq!(refreshed.net_profit, dec!(14.98));
        assert_eq!(exchange.account_calls.load(Ordering::SeqCst), 0);
        assert_eq!(exchange.transaction_calls.load(Ordering::SeqCst), 0);
    }
}
