//! Wire-level constants: EIP-1193 method and event names, error codes, network names

/// User rejected the request (EIP-1193)
pub const ERROR_CODE_USER_REJECTED: i64 = 4001;

/// Requested account or method not authorized by the user (EIP-1193)
pub const ERROR_CODE_UNAUTHORIZED: i64 = 4100;

/// A request of the same type is already outstanding in the wallet UI
pub const ERROR_CODE_ALREADY_PENDING: i64 = -32002;

/// JSON-RPC internal error
pub const ERROR_CODE_INTERNAL: i64 = -32603;

/// Provider is disconnected from all chains (EIP-1193)
pub const ERROR_CODE_DISCONNECTED: i64 = 4900;

pub const METHOD_ACCOUNTS: &str = "eth_accounts";
pub const METHOD_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const METHOD_CHAIN_ID: &str = "eth_chainId";
pub const METHOD_GET_BALANCE: &str = "eth_getBalance";
pub const METHOD_CALL: &str = "eth_call";
pub const METHOD_SEND_TRANSACTION: &str = "eth_sendTransaction";
pub const METHOD_GET_RECEIPT: &str = "eth_getTransactionReceipt";

pub const EVENT_ACCOUNTS_CHANGED: &str = "accountsChanged";
pub const EVENT_CHAIN_CHANGED: &str = "chainChanged";
pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";

/// Key of the persisted authentication flag
pub const SESSION_AUTH_KEY: &str = "isAuthenticated";

/// USDC amounts (rental income, auction prices, bids) use 6 decimals on-chain
pub const USDC_DECIMALS: u8 = 6;

/// Property prices are stored on-chain in USD cents
pub const USD_CENTS_DECIMALS: u8 = 2;

pub const UNKNOWN_NETWORK: &str = "Unknown Network";

/// Human-readable name for a known chain id
pub fn network_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("Ethereum Mainnet"),
        5 => Some("Goerli Testnet"),
        11155111 => Some("Sepolia Testnet"),
        137 => Some("Polygon Mainnet"),
        80001 => Some("Mumbai Testnet"),
        56 => Some("BSC Mainnet"),
        97 => Some("BSC Testnet"),
        _ => None,
    }
}

/// Parse a chain id given either as `0x`-prefixed hex or as a decimal string
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Display name for a chain id string, "Chain ID: n" when the chain is not in the table
pub fn network_name_for_chain(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown".to_string();
    };
    match parse_chain_id(raw) {
        Some(id) => network_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chain ID: {}", id)),
        None => "Unknown".to_string(),
    }
}
