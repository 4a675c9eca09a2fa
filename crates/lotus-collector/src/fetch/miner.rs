use crate::fetch::{
    CALL_MARKET_LIST_DEALS, CALL_MARKET_LIST_RETRIEVAL_DEALS, CALL_SECTORS_SUMMARY,
    CALL_STORAGE_INFO, CALL_STORAGE_LIST, CALL_STORAGE_STAT, CALL_WORKER_JOBS, CALL_WORKER_STATS,
};
use lotus_api::{
    StorageMinerApi,
    types::{
        FsStat, MarketDeal, RetrievalDeal, SectorStateSummary, StorageId, StorageInfo, WorkerJob,
        WorkerStats,
    },
};
use std::{collections::HashMap, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::warn;
use uuid::Uuid;

/// One cycle's view of the miner. Constructed fresh per poll, never
/// persisted. Every field degrades independently to its empty value when
/// the corresponding sub-call fails.
#[derive(Debug, Clone, Default)]
pub struct MinerSnapshot {
    pub sector_states: SectorStateSummary,
    pub market_deals: Vec<MarketDeal>,
    pub retrieval_deals: Vec<RetrievalDeal>,
    pub worker_stats: HashMap<Uuid, WorkerStats>,
    pub worker_jobs: HashMap<Uuid, Vec<WorkerJob>>,
    pub storage_stats: HashMap<StorageId, FsStat>,
    pub storage_infos: HashMap<StorageId, StorageInfo>,
    pub storage_sectors: HashMap<StorageId, Vec<u64>>,
}

pub struct MinerFetcher<A> {
    api: Arc<A>,
    storage_fan_out: usize,
}

impl<A: StorageMinerApi + 'static> MinerFetcher<A> {
    pub fn new(api: A, storage_fan_out: usize) -> Self {
        Self {
            api: Arc::new(api),
            storage_fan_out,
        }
    }

    /// Assemble a snapshot, tolerating partial failure. The sealing,
    /// deal-tracking and storage subsystems of a miner degrade
    /// independently, and partial metrics beat none, so a failing sub-call
    /// is logged and counted and contributes its empty value instead of
    /// aborting the fetch.
    pub async fn fetch(&self) -> MinerSnapshot {
        let (sectors, market_deals, retrieval_deals, worker_stats, worker_jobs, storage_list) = tokio::join!(
            self.api.sectors_summary(),
            self.api.market_list_deals(),
            self.api.market_list_retrieval_deals(),
            self.api.worker_stats(),
            self.api.worker_jobs(),
            self.api.storage_list(),
        );

        let storage_list = or_default(CALL_STORAGE_LIST, storage_list);
        let storage_sectors: HashMap<StorageId, Vec<u64>> = storage_list
            .iter()
            .map(|(id, decls)| {
                (
                    id.clone(),
                    decls.iter().map(|d| d.sector_id.number).collect(),
                )
            })
            .collect();

        let (storage_stats, storage_infos) = self
            .fetch_storage_devices(storage_list.into_keys().collect())
            .await;

        MinerSnapshot {
            sector_states: or_default(CALL_SECTORS_SUMMARY, sectors),
            market_deals: or_default(CALL_MARKET_LIST_DEALS, market_deals),
            retrieval_deals: or_default(CALL_MARKET_LIST_RETRIEVAL_DEALS, retrieval_deals),
            worker_stats: or_default(CALL_WORKER_STATS, worker_stats),
            worker_jobs: or_default(CALL_WORKER_JOBS, worker_jobs),
            storage_stats,
            storage_infos,
            storage_sectors,
        }
    }

    /// Stat/info calls for distinct devices are independent, so they fan
    /// out concurrently, bounded by `storage_fan_out`. A device whose calls
    /// all fail still appears in the result maps with zero values so
    /// "enumerated but unreachable" stays visible downstream.
    async fn fetch_storage_devices(
        &self,
        ids: Vec<StorageId>,
    ) -> (HashMap<StorageId, FsStat>, HashMap<StorageId, StorageInfo>) {
        let semaphore = Arc::new(Semaphore::new(self.storage_fan_out));
        let mut set = JoinSet::new();

        for id in ids {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                // The semaphore is never closed while we hold it.
                break;
            };
            let api = self.api.clone();
            set.spawn(async move {
                let _permit = permit;
                let stat = api.storage_stat(&id).await;
                let info = api.storage_info(&id).await;
                (id, stat, info)
            });
        }

        let mut stats = HashMap::new();
        let mut infos = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, stat, info)) => {
                    stats.insert(id.clone(), or_default(CALL_STORAGE_STAT, stat));
                    infos.insert(id, or_default(CALL_STORAGE_INFO, info));
                }
                Err(err) => {
                    warn!(?err, "storage device task panicked or was cancelled");
                }
            }
        }
        (stats, infos)
    }
}

fn or_default<T: Default>(call: &'static str, result: lotus_api::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(call, %err, "miner sub-call failed; reporting empty value");
            metrics::counter!("lotus_collector_subcall_failures", "call" => call).increment(1);
            T::default()
        }
    }
}
