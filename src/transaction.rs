//! Transactions: TaPoS header, packing, signing digest and id.

use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::models::Action;
use crate::serializer::{Pack, PackError, Serializer};

/// Expiration format used by the chain API's JSON
const TIME_POINT_SEC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Recent block a transaction is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceBlock {
    pub block_num: u32,
    pub ref_block_prefix: u32,
    pub timestamp: DateTime<Utc>,
}

/// Round a block timestamp to whole seconds, half up
fn round_to_secs(timestamp: &DateTime<Utc>) -> i64 {
    (timestamp.timestamp_millis() + 500).div_euclid(1000)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Seconds since the Unix epoch
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Bind `actions` to `ref_block`, expiring `expire_seconds` after its timestamp
    pub fn new(ref_block: &ReferenceBlock, expire_seconds: u32, actions: Vec<Action>) -> Self {
        let expiration = round_to_secs(&ref_block.timestamp) + expire_seconds as i64;

        Transaction {
            expiration: expiration.clamp(0, u32::MAX as i64) as u32,
            ref_block_num: (ref_block.block_num & 0xffff) as u16,
            ref_block_prefix: ref_block.ref_block_prefix,
            max_net_usage_words: 0,
            max_cpu_usage_ms: 0,
            delay_sec: 0,
            context_free_actions: vec![],
            actions,
        }
    }

    pub fn expiration_string(&self) -> String {
        DateTime::from_timestamp(self.expiration as i64, 0)
            .map(|t| t.format(TIME_POINT_SEC_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// JSON form with hex-encoded action data, as `get_required_keys` expects
    pub fn to_json(&self) -> Result<serde_json::Value, PackError> {
        fn actions_json(actions: &[Action]) -> Result<Vec<serde_json::Value>, PackError> {
            actions
                .iter()
                .map(|action| {
                    Ok(json!({
                        "account": action.account,
                        "name": action.name,
                        "authorization": action.authorization,
                        "data": hex::encode(action.data.to_packed()?),
                    }))
                })
                .collect()
        }

        Ok(json!({
            "expiration": self.expiration_string(),
            "ref_block_num": self.ref_block_num,
            "ref_block_prefix": self.ref_block_prefix,
            "max_net_usage_words": self.max_net_usage_words,
            "max_cpu_usage_ms": self.max_cpu_usage_ms,
            "delay_sec": self.delay_sec,
            "context_free_actions": actions_json(&self.context_free_actions)?,
            "actions": actions_json(&self.actions)?,
            "transaction_extensions": [],
        }))
    }
}

impl Pack for Transaction {
    fn pack(&self, s: &mut Serializer) -> Result<(), PackError> {
        s.write_u32(self.expiration);
        s.write_u16(self.ref_block_num);
        s.write_u32(self.ref_block_prefix);
        s.write_varuint32(self.max_net_usage_words);
        s.write_u8(self.max_cpu_usage_ms);
        s.write_varuint32(self.delay_sec);
        s.write_seq(&self.context_free_actions)?;
        s.write_seq(&self.actions)?;
        // transaction_extensions
        s.write_len(0)
    }
}

/// sha256(chain_id || packed_trx || context_free_data_digest). Without
/// context-free data the last part is 32 zero bytes.
pub fn signing_digest(chain_id: &[u8; 32], packed_trx: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id);
    hasher.update(packed_trx);
    hasher.update([0u8; 32]);
    hasher.finalize().into()
}

/// Transaction id as the chain computes it: sha256 of the packed transaction
pub fn transaction_id(packed_trx: &[u8]) -> String {
    hex::encode(Sha256::digest(packed_trx))
}
