use crate::{
    Result,
    rpc::JsonRpcClient,
    types::{
        FsStat, MarketDeal, RetrievalDeal, SectorDecl, SectorStateSummary, StorageId, StorageInfo,
        WorkerJob, WorkerStats,
    },
};
use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Read-only surface of the Lotus storage miner consumed by the collector.
#[automock]
#[async_trait]
pub trait StorageMinerApi: Send + Sync {
    async fn sectors_summary(&self) -> Result<SectorStateSummary>;
    async fn market_list_deals(&self) -> Result<Vec<MarketDeal>>;
    async fn market_list_retrieval_deals(&self) -> Result<Vec<RetrievalDeal>>;
    async fn worker_stats(&self) -> Result<HashMap<Uuid, WorkerStats>>;
    async fn worker_jobs(&self) -> Result<HashMap<Uuid, Vec<WorkerJob>>>;
    /// Device id -> sectors declared on that device.
    async fn storage_list(&self) -> Result<HashMap<StorageId, Vec<SectorDecl>>>;
    async fn storage_stat(&self, id: &StorageId) -> Result<FsStat>;
    async fn storage_info(&self, id: &StorageId) -> Result<StorageInfo>;
}

#[derive(Debug)]
pub struct StorageMinerClient {
    rpc: JsonRpcClient,
}

impl StorageMinerClient {
    pub fn new(addr: &str, api_version: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(addr, api_version, token)?,
        })
    }
}

#[async_trait]
impl StorageMinerApi for StorageMinerClient {
    async fn sectors_summary(&self) -> Result<SectorStateSummary> {
        self.rpc.call("Filecoin.SectorsSummary", json!([])).await
    }

    async fn market_list_deals(&self) -> Result<Vec<MarketDeal>> {
        self.rpc.call("Filecoin.MarketListDeals", json!([])).await
    }

    async fn market_list_retrieval_deals(&self) -> Result<Vec<RetrievalDeal>> {
        self.rpc
            .call("Filecoin.MarketListRetrievalDeals", json!([]))
            .await
    }

    async fn worker_stats(&self) -> Result<HashMap<Uuid, WorkerStats>> {
        self.rpc.call("Filecoin.WorkerStats", json!([])).await
    }

    async fn worker_jobs(&self) -> Result<HashMap<Uuid, Vec<WorkerJob>>> {
        self.rpc.call("Filecoin.WorkerJobs", json!([])).await
    }

    async fn storage_list(&self) -> Result<HashMap<StorageId, Vec<SectorDecl>>> {
        self.rpc.call("Filecoin.StorageList", json!([])).await
    }

    async fn storage_stat(&self, id: &StorageId) -> Result<FsStat> {
        self.rpc.call("Filecoin.StorageStat", json!([id])).await
    }

    async fn storage_info(&self, id: &StorageId) -> Result<StorageInfo> {
        self.rpc.call("Filecoin.StorageInfo", json!([id])).await
    }
}
