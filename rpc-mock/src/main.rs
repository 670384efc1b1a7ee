/// RPC Mock Server
///
/// A lightweight Ethereum JSON-RPC node for local development of the
/// EquiXtate dapp. Serves the demo property catalogue and records transactions.

mod demo;
mod handlers;
mod server;
mod types;

use alloy_primitives::{address, Address};
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::sync::Arc;

use server::run_server;

/// Default unlocked dev accounts
const DEFAULT_ACCOUNTS: [Address; 2] = [
    address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
    address!("70997970c51812dc3a010c7d01b50e0d17dc79c8"),
];

#[derive(Debug)]
struct Config {
    // Chain
    chain_id: u64,
    accounts: Vec<Address>,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let chain_id = env::var("CHAIN_ID")
            .unwrap_or_else(|_| "11155111".to_string())
            .parse()
            .context("Invalid CHAIN_ID")?;

        let accounts = match env::var("DEV_ACCOUNTS") {
            Ok(list) => list
                .split(',')
                .map(|a| Address::from_str(a.trim()))
                .collect::<Result<Vec<_>, _>>()
                .context("Invalid DEV_ACCOUNTS")?,
            Err(_) => DEFAULT_ACCOUNTS.to_vec(),
        };

        let server_host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            chain_id,
            accounts,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting RPC Mock Server...");

    // Load configuration
    let config = Config::from_env()
        .context("Failed to load configuration")?;

    log::info!("Chain ID: {}", config.chain_id);
    log::info!("Unlocked accounts: {:?}", config.accounts);
    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);

    let wallet = Arc::new(demo::demo_wallet(config.accounts, config.chain_id));

    // Run server
    run_server(wallet, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
