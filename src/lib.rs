//! EOSIO account creation: build, sign and submit a `newaccount` action
//! through a node's chain API.

pub mod api;
pub mod cli;
pub mod config;
pub mod keys;
pub mod models;
pub mod name;
pub mod serializer;
pub mod signature_provider;
pub mod transaction;

#[path = "../rpc/mod.rs"]
pub mod rpc;

pub use api::{Api, SubmitError, TransactResult, TransactionSubmitter};
pub use cli::{run, CommandArguments, Outcome};
pub use config::{RpcConfig, SubmissionPolicy, DEFAULT_BLOCKS_BEHIND, DEFAULT_EXPIRE_SECONDS};
pub use keys::{KeyError, PrivateKey, PublicKey, Signature};
pub use models::{Action, ActionData, Authority, KeyWeight, NewAccount, PermissionLevel};
pub use rpc::{ChainRpc, NodeError, RpcError};
pub use signature_provider::{LocalKeySignatureProvider, SignatureProvider, SignatureProviderError};
pub use transaction::Transaction;
