use crate::{
    Result,
    rpc::JsonRpcClient,
    types::{Address, NodeStatus, TokenAmount},
};
use async_trait::async_trait;
use mockall::automock;
use serde_json::json;

/// Read-only surface of the Lotus full node consumed by the collector.
#[automock]
#[async_trait]
pub trait FullNodeApi: Send + Sync {
    /// `Filecoin.NodeStatus`. The boolean toggles inclusion of extended
    /// chain detail in the response.
    async fn node_status(&self, include_chain_detail: bool) -> Result<NodeStatus>;
    async fn wallet_list(&self) -> Result<Vec<Address>>;
    async fn wallet_balance(&self, address: &Address) -> Result<TokenAmount>;
}

#[derive(Debug)]
pub struct FullNodeClient {
    rpc: JsonRpcClient,
}

impl FullNodeClient {
    pub fn new(addr: &str, api_version: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(addr, api_version, token)?,
        })
    }
}

#[async_trait]
impl FullNodeApi for FullNodeClient {
    async fn node_status(&self, include_chain_detail: bool) -> Result<NodeStatus> {
        self.rpc
            .call("Filecoin.NodeStatus", json!([include_chain_detail]))
            .await
    }

    async fn wallet_list(&self) -> Result<Vec<Address>> {
        self.rpc.call("Filecoin.WalletList", json!([])).await
    }

    async fn wallet_balance(&self, address: &Address) -> Result<TokenAmount> {
        self.rpc
            .call("Filecoin.WalletBalance", json!([address]))
            .await
    }
}
