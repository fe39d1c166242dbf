use crate::config::{env as config_env, network};
use crate::error::{SweepError, SweepResult};
use bitcoin::{Transaction, Txid};
use bitcoincore_rpc::{Auth, Client, RpcApi};
use std::env;

/// Bitcoin Core RPC client used as an alternative broadcast path when the
/// operator runs their own node instead of trusting a public explorer.
#[derive(Debug)]
pub struct BitcoindClient {
    client: Client,
}

impl BitcoindClient {
    /// Create a new RPC client with configuration from environment or defaults
    pub fn new() -> SweepResult<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let rpc_url = env::var(config_env::RPC_URL)
            .unwrap_or_else(|_| network::DEFAULT_RPC_HOST.to_string());
        let rpc_port = env::var(config_env::RPC_PORT)
            .unwrap_or_else(|_| network::DEFAULT_RPC_PORT.to_string());
        let rpc_user = env::var(config_env::RPC_USER)
            .unwrap_or_else(|_| network::DEFAULT_RPC_USER.to_string());
        let rpc_password = env::var(config_env::RPC_PASSWORD)
            .unwrap_or_else(|_| network::DEFAULT_RPC_PASSWORD.to_string());

        let auth = Auth::UserPass(rpc_user, rpc_password);
        let url = format!("http://{}:{}", rpc_url, rpc_port);

        let client = Client::new(&url, auth).map_err(|e| SweepError::Rpc { source: e })?;

        Ok(BitcoindClient { client })
    }

    /// Broadcast a signed transaction through the node
    pub fn send_raw_transaction(&self, tx: &Transaction) -> SweepResult<Txid> {
        self.client
            .send_raw_transaction(tx)
            .map_err(|e| SweepError::Rpc { source: e })
    }
}
