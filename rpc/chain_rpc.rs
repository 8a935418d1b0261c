// ============================================================================
// Chain RPC - node `/v1/chain/*` API
// ============================================================================
//
// Endpoints used:
//   POST /v1/chain/get_info           - chain id and head block
//   POST /v1/chain/get_block          - reference block for TaPoS
//   POST /v1/chain/get_required_keys  - which keys must sign a transaction
//   POST /v1/chain/push_transaction   - submit a signed transaction
//
// ============================================================================

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::RpcConfig;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP client could not be constructed
    #[error("failed to build http client: {0}")]
    Client(String),
    /// Request never got a response (connection refused, timeout, ...)
    #[error("chain API request failed: {0}")]
    RequestFailed(String),
    /// Response body did not have the expected shape
    #[error("invalid chain API response: {0}")]
    InvalidResponse(String),
    /// Node answered with its error envelope
    #[error("{0}")]
    Node(NodeError),
}

/// Error envelope returned by nodes on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeError {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: NodeErrorDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub what: String,
    #[serde(default)]
    pub details: Vec<NodeErrorMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeErrorMessage {
    #[serde(default)]
    pub message: String,
}

impl NodeError {
    /// Most specific message the node gave
    pub fn reason(&self) -> &str {
        self.error
            .details
            .iter()
            .map(|d| d.message.as_str())
            .find(|m| !m.is_empty())
            .or(Some(self.error.what.as_str()).filter(|w| !w.is_empty()))
            .unwrap_or(self.message.as_str())
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node returned status {}", self.status)?;
        if !self.error.name.is_empty() {
            write!(f, " ({})", self.error.name)?;
        }
        let reason = self.reason();
        if !reason.is_empty() {
            write!(f, ": {}", reason)?;
        }
        Ok(())
    }
}

// ============================================================================
// REQUEST/RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GetInfoResult {
    #[serde(default)]
    pub server_version: String,
    pub chain_id: String,
    pub head_block_num: u32,
    #[serde(default)]
    pub last_irreversible_block_num: u32,
    #[serde(default)]
    pub head_block_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetBlockResult {
    #[serde(deserialize_with = "deserialize_block_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub block_num: u32,
    pub ref_block_prefix: u32,
    #[serde(default)]
    pub id: String,
}

/// Block timestamps come without a zone, e.g. `2024-01-01T00:00:00.500`
pub fn parse_block_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
}

fn deserialize_block_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_block_timestamp(&text).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Serialize)]
struct GetBlockParams {
    block_num_or_id: u32,
}

#[derive(Debug, Clone, Serialize)]
struct GetRequiredKeysParams<'a> {
    transaction: &'a serde_json::Value,
    available_keys: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct GetRequiredKeysResult {
    required_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushTransactionArgs {
    pub signatures: Vec<String>,
    pub compression: u8,
    pub packed_context_free_data: String,
    /// Hex-encoded packed transaction
    pub packed_trx: String,
}

impl PushTransactionArgs {
    pub fn new(signatures: Vec<String>, packed_trx: &[u8]) -> Self {
        PushTransactionArgs {
            signatures,
            compression: 0,
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(packed_trx),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushTransactionResult {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: serde_json::Value,
}

// ============================================================================
// CHAIN RPC CLIENT
// ============================================================================

/// Client for one node's chain API
pub struct ChainRpc {
    /// Endpoint URL without trailing slash
    endpoint: String,

    /// HTTP client
    client: Client,
}

impl ChainRpc {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))?;

        Ok(ChainRpc {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get_info(&self) -> Result<GetInfoResult, RpcError> {
        self.post("get_info", &serde_json::json!({})).await
    }

    pub async fn get_block(&self, block_num: u32) -> Result<GetBlockResult, RpcError> {
        self.post(
            "get_block",
            &GetBlockParams {
                block_num_or_id: block_num,
            },
        )
        .await
    }

    /// Subset of `available_keys` the node needs signatures from
    pub async fn get_required_keys(
        &self,
        transaction: &serde_json::Value,
        available_keys: &[String],
    ) -> Result<Vec<String>, RpcError> {
        let result: GetRequiredKeysResult = self
            .post(
                "get_required_keys",
                &GetRequiredKeysParams {
                    transaction,
                    available_keys,
                },
            )
            .await?;
        Ok(result.required_keys)
    }

    pub async fn push_transaction(
        &self,
        args: &PushTransactionArgs,
    ) -> Result<PushTransactionResult, RpcError> {
        self.post("push_transaction", args).await
    }

    async fn post<Q, R>(&self, method: &str, body: &Q) -> Result<R, RpcError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/chain/{}", self.endpoint, method);
        tracing::debug!(%url, "chain API request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::RequestFailed(e.to_string()))?;
        tracing::debug!(%status, body = %text, "chain API response");

        if !status.is_success() {
            let mut error: NodeError = serde_json::from_str(&text).unwrap_or_else(|_| NodeError {
                message: text.clone(),
                ..Default::default()
            });
            error.status = status.as_u16();
            return Err(RpcError::Node(error));
        }

        serde_json::from_str(&text).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
