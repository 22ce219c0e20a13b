use axum::{routing::get, Router};
use configuration::ServerSettings;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use valuation::WalletSession;

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<WalletSession>,
}

/// Builds the application router.
///
/// `/static` serves `static_path` itself, while `/js` and `/css` serve the matching
/// sub-directories so the bundled front-end can use root-relative asset URLs.
pub fn build_router(session: Arc<WalletSession>, static_path: &Path) -> Router {
    let app_state = Arc::new(AppState { session });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    Router::new()
        .route("/", get(handlers::index_redirect))
        .route("/api/ping", get(handlers::ping))
        .route("/api/wallet", get(handlers::get_wallet))
        .nest_service("/static", ServeDir::new(static_path))
        .nest_service("/js", ServeDir::new(static_path.join("js")))
        .nest_service("/css", ServeDir::new(static_path.join("css")))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on an already-bound listener until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// The main function to configure and run the web server.
pub async fn run_server(
    settings: &ServerSettings,
    session: Arc<WalletSession>,
) -> anyhow::Result<()> {
    // Note: Tracing is already initialized by the caller.
    if !settings.static_path.is_dir() {
        tracing::warn!(path = %settings.static_path.display(), "Static directory does not exist, static routes will 404.");
    }

    let app = build_router(session, &settings.static_path);
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server started and listening on {}", listener.local_addr()?);

    serve(listener, app).await
}
