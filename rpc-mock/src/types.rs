/// JSON-RPC 2.0 envelopes and dev endpoint payloads

use alloy_json_rpc::{ErrorPayload, Id, Request, Response, ResponsePayload};
use alloy_primitives::{Address, Bytes, B256, U256};
use equixtate_web3::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type RpcRequest = Request<Value>;
pub type RpcResponse = Response<Value, Value>;

/// Reply to request `id` with the wallet's answer
pub fn rpc_response(id: Id, outcome: Result<Value, ProviderError>) -> RpcResponse {
    let payload = match outcome {
        Ok(result) => ResponsePayload::Success(result),
        Err(err) => ResponsePayload::Failure(ErrorPayload {
            code: err.code,
            message: err.message.into(),
            data: err.data,
        }),
    };
    Response { id, payload }
}

/// Body of POST /dev/accounts
#[derive(Debug, Clone, Deserialize)]
pub struct SetAccountsRequest {
    pub accounts: Vec<Address>,
}

/// Body of POST /dev/chain
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChainRequest {
    pub chain_id: u64,
}

/// Entry of GET /dev/transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    /// 4-byte function selector as hex, empty for plain transfers
    pub selector: String,
    pub data: Bytes,
}
