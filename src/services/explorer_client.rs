use crate::config::network::REQUEST_TIMEOUT;
use crate::error::{SweepError, SweepResult};
use reqwest::Client;
use serde::Deserialize;

/// Spend status of one transaction output, from the explorer API
#[derive(Debug, Clone, Deserialize)]
pub struct TxOutspend {
    /// Whether the output has been spent
    pub spent: bool,
}

/// Client for an Esplora-compatible block explorer API
#[derive(Debug, Clone)]
pub struct ExplorerApi {
    client: Client,
    base_url: String,
}

impl ExplorerApi {
    /// Create a new explorer client for the given API base URL
    pub fn new(base_url: &str) -> SweepResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SweepError::operation("client_creation", e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Broadcast a raw transaction. Returns the explorer's response body,
    /// the transaction id on success.
    pub async fn publish_tx(&self, raw_tx_hex: &str) -> SweepResult<String> {
        let url = format!("{}/tx", self.base_url);

        let response = self
            .client
            .post(&url)
            .body(raw_tx_hex.to_string())
            .send()
            .await
            .map_err(|e| SweepError::Network { source: e })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SweepError::Network { source: e })?;

        if !status.is_success() {
            return Err(SweepError::operation(
                "publish_tx",
                format!("HTTP {}: {}", status, body),
            ));
        }
        Ok(body)
    }

    /// Fetch the spend status of every output of a transaction
    pub async fn get_outspends(&self, txid: &str) -> SweepResult<Vec<TxOutspend>> {
        let url = format!("{}/tx/{}/outspends", self.base_url, txid);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SweepError::Network { source: e })?;

        if !response.status().is_success() {
            return Err(SweepError::operation(
                "get_outspends",
                format!("HTTP {}: failed to fetch outspends for {}", response.status(), txid),
            ));
        }

        let outspends: Vec<TxOutspend> = response
            .json()
            .await
            .map_err(|e| SweepError::Network { source: e })?;

        Ok(outspends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let api = ExplorerApi::new("https://blockstream.info/api/").unwrap();
        assert_eq!(api.base_url, "https://blockstream.info/api");
    }

    #[tokio::test]
    #[ignore] // Only run when testing against a live explorer
    async fn test_outspends() {
        let api = ExplorerApi::new("https://blockstream.info/api").unwrap();

        // Genesis coinbase output is famously unspendable and unspent.
        let outspends = api
            .get_outspends("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b")
            .await
            .unwrap();
        assert!(!outspends[0].spent);
    }
}
