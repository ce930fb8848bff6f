/// Stellar RPC client used as the ledger entry fetch collaborator
use crate::error::FetchError;
use crate::resolver::LedgerEntryFetcher;
use crate::types::{LedgerEntriesResponse, RawLedgerEntry};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;

/// Client for communicating with Stellar RPC
#[derive(Debug, Clone)]
pub struct StellarRpcClient {
    pub endpoint: String,
    client: reqwest::Client,
}

impl StellarRpcClient {
    /// Create a new RPC client with the given endpoint
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }

    /// Get ledger entries for base64-encoded `LedgerKey`s
    pub async fn get_ledger_entries(&self, keys: Vec<String>) -> Result<LedgerEntriesResponse> {
        debug!(endpoint = %self.endpoint, keys = keys.len(), "getLedgerEntries");
        let value = self
            .jsonrpc_call("getLedgerEntries", json!({ "keys": keys }))
            .await?;
        serde_json::from_value::<LedgerEntriesResponse>(value)
            .map_err(|e| anyhow!("Failed to parse LedgerEntriesResponse: {}", e))
    }

    /// JSON-RPC 2.0 call, retrying transport failures with exponential backoff
    async fn jsonrpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": if params.is_null() { json!({}) } else { params }
        });

        let mut retries = 0u32;

        loop {
            match self
                .client
                .post(&self.endpoint)
                .header("Content-Type", "application/json")
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let result = response.json::<serde_json::Value>().await?;

                    if let Some(error) = result.get("error") {
                        return Err(RpcError(error.to_string()).into());
                    }

                    return result
                        .get("result")
                        .cloned()
                        .ok_or_else(|| anyhow!("No result in RPC response"));
                }
                Err(e) if retries < MAX_RETRIES => {
                    retries += 1;
                    let backoff = Duration::from_millis(100 * 2_u64.pow(retries - 1));
                    warn!(method, attempt = retries, error = %e, "RPC call failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("RPC call failed after {} retries", MAX_RETRIES)))
                }
            }
        }
    }
}

/// JSON-RPC level error object returned by the server
#[derive(Debug, thiserror::Error)]
#[error("RPC Error: {0}")]
struct RpcError(String);

#[async_trait]
impl LedgerEntryFetcher for StellarRpcClient {
    async fn fetch_ledger_entries(
        &self,
        keys: &[Vec<u8>],
    ) -> Result<Vec<RawLedgerEntry>, FetchError> {
        let engine = base64::engine::general_purpose::STANDARD;
        let encoded: Vec<String> = keys.iter().map(|k| engine.encode(k)).collect();

        let response = self.get_ledger_entries(encoded).await.map_err(|e| {
            if let Some(rpc) = e.downcast_ref::<RpcError>() {
                FetchError::Rpc(rpc.0.clone())
            } else if e.downcast_ref::<reqwest::Error>().is_some() {
                FetchError::Transport(e.to_string())
            } else {
                FetchError::MalformedResponse(e.to_string())
            }
        })?;

        response
            .entries
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                let key_xdr = engine
                    .decode(&entry.key)
                    .map_err(|e| FetchError::MalformedResponse(format!("entry key: {}", e)))?;
                let data_xdr = engine
                    .decode(&entry.xdr)
                    .map_err(|e| FetchError::MalformedResponse(format!("entry xdr: {}", e)))?;
                Ok(RawLedgerEntry {
                    key_xdr,
                    data_xdr,
                    last_modified_ledger_seq: entry.last_modified_ledger_seq,
                    live_until_ledger_seq: entry.live_until_ledger_seq,
                })
            })
            .collect()
    }
}
