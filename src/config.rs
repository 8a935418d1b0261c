// Chain constants and submission defaults

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// System account that creates new accounts and hosts the `newaccount` action
pub const SYSTEM_ACCOUNT: &str = "eosio";

/// Action name on the system contract
pub const NEW_ACCOUNT_ACTION: &str = "newaccount";

/// Permission the creator authorizes with
pub const ACTIVE_PERMISSION: &str = "active";

/// Reference the chain state this many blocks behind head
pub const DEFAULT_BLOCKS_BEHIND: u32 = 3;

/// Transaction expiration, relative to the reference block timestamp
pub const DEFAULT_EXPIRE_SECONDS: u32 = 30;

/// Default timeout for chain API calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SUBMISSION POLICY
// ============================================================================

/// How the submitter picks its reference block and expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPolicy {
    pub blocks_behind: u32,
    pub expire_seconds: u32,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        SubmissionPolicy {
            blocks_behind: DEFAULT_BLOCKS_BEHIND,
            expire_seconds: DEFAULT_EXPIRE_SECONDS,
        }
    }
}

// ============================================================================
// RPC CONFIG
// ============================================================================

/// Configuration for the chain API connection
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Node endpoint URL, e.g. `http://localhost:8888`
    pub endpoint: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RpcConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        RpcConfig {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
