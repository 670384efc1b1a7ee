/// RPC Mock Server Library
///
/// A development node for the EquiXtate dapp: answers Ethereum JSON-RPC from
/// an in-memory wallet holding a demo property catalogue, with unlocked
/// accounts and helper endpoints to switch accounts and chains.

pub mod demo;
pub mod handlers;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use demo::{demo_wallet, DEMO_PROPERTIES};
pub use server::{create_router, run_server, serve};
pub use types::*;
