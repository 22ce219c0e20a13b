use crate::{error::AppError, AppState};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use core_types::Wallet;
use serde_json::{json, Value};
use std::sync::Arc;

pub const INDEX_PATH: &str = "/static/index.html";

/// # GET /api/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// # GET /api/wallet
/// Refreshes the shared wallet (discovering it on first use) and returns it.
pub async fn get_wallet(State(state): State<Arc<AppState>>) -> Result<Json<Wallet>, AppError> {
    let wallet = state.session.refresh().await?;
    tracing::debug!(coins = wallet.coins.len(), net_profit = %wallet.net_profit, "Serving wallet.");
    Ok(Json(wallet))
}

/// # GET /
pub async fn index_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, INDEX_PATH)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use api_client::error::ApiError;
    use api_client::{AccountsPage, ExchangeClient};
    use async_trait::async_trait;
    use core_types::{Account, CoinRates, CoinTransaction, Credentials};
    use rust_decimal_macros::dec;
    use std::net::SocketAddr;
    use std::path::Path;
    use valuation::{ValuationEngine, WalletSession};

    /// Serves one ETH account bought at 11 and priced at 12.99, or fails every listing.
    struct StubExchange {
        reachable: bool,
    }

    #[async_trait]
    impl ExchangeClient for StubExchange {
        async fn get_accounts(&self, _credentials: &Credentials) -> Result<AccountsPage, ApiError> {
            if !self.reachable {
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
                usd: dec!(12.99),
                ..CoinRates::ZERO
            })
        }

        async fn get_transactions(
            &self,
            _account_id: &str,
            _credentials: &Credentials,
        ) -> Result<Vec<CoinTransaction>, ApiError> {
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

    fn session(reachable: bool) -> Arc<WalletSession> {
        let engine = ValuationEngine::new(Arc::new(StubExchange { reachable }), ["ETH"]);
        Arc::new(WalletSession::new(engine, Credentials::new("key", "secret")))
    }

    async fn spawn_app(reachable: bool, static_path: &Path) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(session(reachable), static_path);
        tokio::spawn(crate::serve(listener, app));
        addr
    }

    fn http() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        let Json(body) = ping().await;
        assert_eq!(body, json!({ "message": "pong" }));
    }

    #[tokio::test]
    async fn wallet_handler_returns_the_refreshed_wallet() {
        let state = State(Arc::new(AppState {
            session: session(true),
        }));

        let Json(wallet) = get_wallet(state).await.unwrap();

        assert_eq!(wallet.net_profit, dec!(1.99));
        assert_eq!(wallet.coins["ETH"].cost, dec!(11));
    }

    #[tokio::test]
    async fn discovery_failure_is_a_bad_gateway_with_json_error() {
        let state = State(Arc::new(AppState {
            session: session(false),
        }));

        let response = get_wallet(state).await.unwrap_err().into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn routes_are_served_over_http() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>warchest</h1>").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css").join("app.css"), "body {}").unwrap();
        let addr = spawn_app(true, dir.path()).await;
        let client = http();

        let ping: Value = client
            .get(format!("http://{addr}/api/ping"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ping, json!({ "message": "pong" }));

        let root = client.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(root.status(), reqwest::StatusCode::MOVED_PERMANENTLY);
        assert_eq!(root.headers()["location"], INDEX_PATH);

        let index = client
            .get(format!("http://{addr}{INDEX_PATH}"))
            .send()
            .await
            .unwrap();
        assert_eq!(index.text().await.unwrap(), "<h1>warchest</h1>");

        let css = client
            .get(format!("http://{addr}/css/app.css"))
            .send()
            .await
            .unwrap();
        assert_eq!(css.text().await.unwrap(), "body {}");

        let wallet: Value = client
            .get(format!("http://{addr}/api/wallet"))
            .header("Origin", "http://elsewhere.test")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(wallet["net_profit"], json!("1.99"));
        assert_eq!(wallet["coins"]["ETH"]["symbol"], json!("ETH"));
    }

    #[tokio::test]
    async fn wallet_route_sets_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_app(false, dir.path()).await;

        let response = http()
            .get(format!("http://{addr}/api/wallet"))
            .header("Origin", "http://elsewhere.test")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
