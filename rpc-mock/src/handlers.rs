/// Axum HTTP handlers for the JSON-RPC endpoint and the dev helpers

use axum::{extract::State, http::StatusCode, Json};
use equixtate_web3::{Eip1193Provider, MockWallet, ProviderEvent};
use std::sync::Arc;

use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockWallet>;

/// POST /
/// Answers a single JSON-RPC 2.0 request
pub async fn handle_rpc(
    State(wallet): State<AppState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let method = request.meta.method;
    let outcome = wallet.request(&method, request.params).await;
    match &outcome {
        Ok(_) => log::debug!("✅ {}", method),
        Err(err) => log::warn!("❌ {} failed: {}", method, err),
    }
    Json(rpc_response(request.meta.id, outcome))
}

/// POST /dev/accounts
/// Replaces the unlocked accounts, as if the user switched or locked them
pub async fn set_accounts(
    State(wallet): State<AppState>,
    Json(body): Json<SetAccountsRequest>,
) -> StatusCode {
    log::info!("👤 Accounts set to {:?}", body.accounts);
    wallet.emit(ProviderEvent::AccountsChanged(body.accounts));
    StatusCode::NO_CONTENT
}

/// POST /dev/chain
/// Switches the reported chain id
pub async fn set_chain(
    State(wallet): State<AppState>,
    Json(body): Json<SetChainRequest>,
) -> StatusCode {
    log::info!("🌐 Chain id set to {}", body.chain_id);
    wallet.set_chain_id(body.chain_id);
    StatusCode::NO_CONTENT
}

/// GET /dev/transactions
/// Every transaction received so far, oldest first
pub async fn list_transactions(State(wallet): State<AppState>) -> Json<Vec<TransactionSummary>> {
    let transactions = wallet
        .sent_transactions()
        .into_iter()
        .map(|tx| TransactionSummary {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            selector: tx.selector().map(hex::encode).unwrap_or_default(),
            data: tx.data,
        })
        .collect();
    Json(transactions)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
