/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;

pub fn create_router(wallet: AppState) -> Router {
    // Browser dapps call the node directly
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // JSON-RPC
        .route("/", post(handle_rpc))

        // Health check
        .route("/health", get(health_check))

        // Dev helpers
        .route("/dev/accounts", post(set_accounts))
        .route("/dev/chain", post(set_chain))
        .route("/dev/transactions", get(list_transactions))

        // Shared state
        .with_state(wallet)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve on an already bound listener (port 0 in tests)
pub async fn serve(listener: TcpListener, wallet: AppState) -> anyhow::Result<()> {
    axum::serve(listener, create_router(wallet)).await?;
    Ok(())
}

pub async fn run_server(wallet: AppState, host: String, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    log::info!("🚀 RPC mock server listening on http://{}", addr);
    log::info!("🔧 Dev endpoints: POST /dev/accounts, POST /dev/chain, GET /dev/transactions");

    serve(listener, wallet).await
}
