// ============================================================================
// RPC Module - Chain API Communication
// ============================================================================
//
// HTTP client for a node's `/v1/chain/*` API and the request/response
// types exchanged with it.
//
// Components:
//   - chain_rpc: reqwest-based client, node error envelope
//
// ============================================================================

pub mod chain_rpc;

pub use chain_rpc::*;
