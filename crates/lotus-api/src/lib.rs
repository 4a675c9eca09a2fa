//! Typed JSON-RPC client for the Lotus full-node and storage-miner APIs.
//!
//! Exposes one concrete struct per RPC response shape and a pair of async
//! traits (`FullNodeApi`, `StorageMinerApi`) so consumers can substitute
//! mocks for the wire clients.

pub mod daemon;
mod error;
pub mod miner;
pub mod rpc;
pub mod types;

pub use daemon::{FullNodeApi, FullNodeClient, MockFullNodeApi};
pub use error::{Error, Result};
pub use miner::{MockStorageMinerApi, StorageMinerApi, StorageMinerClient};
