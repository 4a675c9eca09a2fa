pub mod daemon;
pub mod miner;

pub use daemon::{DaemonFetcher, DaemonSnapshot};
pub use miner::{MinerFetcher, MinerSnapshot};

// Sub-call labels used in errors, logs and failure counters.
pub(crate) const CALL_NODE_STATUS: &str = "Filecoin.NodeStatus";
pub(crate) const CALL_WALLET_LIST: &str = "Filecoin.WalletList";
pub(crate) const CALL_WALLET_BALANCE: &str = "Filecoin.WalletBalance";
pub(crate) const CALL_SECTORS_SUMMARY: &str = "Filecoin.SectorsSummary";
pub(crate) const CALL_MARKET_LIST_DEALS: &str = "Filecoin.MarketListDeals";
pub(crate) const CALL_MARKET_LIST_RETRIEVAL_DEALS: &str = "Filecoin.MarketListRetrievalDeals";
pub(crate) const CALL_WORKER_STATS: &str = "Filecoin.WorkerStats";
pub(crate) const CALL_WORKER_JOBS: &str = "Filecoin.WorkerJobs";
pub(crate) const CALL_STORAGE_LIST: &str = "Filecoin.StorageList";
pub(crate) const CALL_STORAGE_STAT: &str = "Filecoin.StorageStat";
pub(crate) const CALL_STORAGE_INFO: &str = "Filecoin.StorageInfo";
