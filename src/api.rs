//! Transaction submission: resolve TaPoS, pack, sign, push.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SubmissionPolicy;
use crate::models::Action;
use crate::rpc::{ChainRpc, PushTransactionArgs, RpcError};
use crate::serializer::{Pack, PackError};
use crate::signature_provider::{SignatureProvider, SignatureProviderError};
use crate::transaction::{transaction_id, ReferenceBlock, Transaction};

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no actions to submit")]
    NoActions,
    #[error("invalid chain id '{0}'")]
    InvalidChainId(String),
    #[error("head block {head} has no block {blocks_behind} behind it")]
    ChainTooShort { head: u32, blocks_behind: u32 },
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Signature(#[from] SignatureProviderError),
}

// ============================================================================
// SUBMITTER
// ============================================================================

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactResult {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: serde_json::Value,
}

/// Anything that can get actions onto a chain
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(
        &self,
        actions: &[Action],
        policy: SubmissionPolicy,
    ) -> Result<TransactResult, SubmitError>;
}

/// Submits through a node's chain API, signing with `P`
pub struct Api<P> {
    rpc: ChainRpc,
    signature_provider: P,
}

impl<P: SignatureProvider> Api<P> {
    pub fn new(rpc: ChainRpc, signature_provider: P) -> Self {
        Api {
            rpc,
            signature_provider,
        }
    }

    pub fn rpc(&self) -> &ChainRpc {
        &self.rpc
    }

    /// Build the unsigned transaction bound to the block `blocks_behind`
    /// head. Returns it along with the chain id.
    async fn prepare(
        &self,
        actions: &[Action],
        policy: SubmissionPolicy,
    ) -> Result<([u8; 32], Transaction), SubmitError> {
        let info = self.rpc.get_info().await?;
        let chain_id = parse_chain_id(&info.chain_id)?;

        let ref_block_num = info
            .head_block_num
            .checked_sub(policy.blocks_behind)
            .filter(|num| *num > 0)
            .ok_or(SubmitError::ChainTooShort {
                head: info.head_block_num,
                blocks_behind: policy.blocks_behind,
            })?;

        let block = self.rpc.get_block(ref_block_num).await?;
        tracing::debug!(
            head = info.head_block_num,
            ref_block = block.block_num,
            ref_block_prefix = block.ref_block_prefix,
            "resolved reference block"
        );

        let ref_block = ReferenceBlock {
            block_num: block.block_num,
            ref_block_prefix: block.ref_block_prefix,
            timestamp: block.timestamp,
        };

        Ok((
            chain_id,
            Transaction::new(&ref_block, policy.expire_seconds, actions.to_vec()),
        ))
    }
}

#[async_trait]
impl<P: SignatureProvider> TransactionSubmitter for Api<P> {
    async fn submit(
        &self,
        actions: &[Action],
        policy: SubmissionPolicy,
    ) -> Result<TransactResult, SubmitError> {
        if actions.is_empty() {
            return Err(SubmitError::NoActions);
        }

        let (chain_id, transaction) = self.prepare(actions, policy).await?;
        let packed_trx = transaction.to_packed()?;

        let available_keys: Vec<String> = self
            .signature_provider
            .available_keys()
            .await
            .iter()
            .map(|key| key.to_string())
            .collect();
        let required_keys = self
            .rpc
            .get_required_keys(&transaction.to_json()?, &available_keys)
            .await?;

        let signatures = self
            .signature_provider
            .sign(&chain_id, &required_keys, &packed_trx)
            .await?;

        let args = PushTransactionArgs::new(
            signatures.iter().map(|sig| sig.to_string()).collect(),
            &packed_trx,
        );
        let result = self.rpc.push_transaction(&args).await?;

        let expected_id = transaction_id(&packed_trx);
        if result.transaction_id != expected_id {
            tracing::warn!(
                node = %result.transaction_id,
                local = %expected_id,
                "node reported a different transaction id"
            );
        }

        Ok(TransactResult {
            transaction_id: result.transaction_id,
            processed: result.processed,
        })
    }
}

fn parse_chain_id(text: &str) -> Result<[u8; 32], SubmitError> {
    hex::decode(text)
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .ok_or_else(|| SubmitError::InvalidChainId(text.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
