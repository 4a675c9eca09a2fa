use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};
use uuid::Uuid;

/// Result of `Filecoin.NodeStatus`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "SyncStatus")]
    pub sync_status: NodeSyncStatus,
    #[serde(rename = "PeerStatus")]
    pub peer_status: NodePeerStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeSyncStatus {
    #[serde(rename = "Epoch")]
    pub epoch: i64,
    #[serde(rename = "Behind")]
    pub behind: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePeerStatus {
    #[serde(rename = "PeersToPublishMsgs")]
    pub peers_to_publish_msgs: u64,
    #[serde(rename = "PeersToPublishBlocks")]
    pub peers_to_publish_blocks: u64,
}

/// A wallet address in its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An attoFIL amount, carried as a decimal until the display boundary.
///
/// `Filecoin.WalletBalance` returns the amount as a decimal string of atto
/// units; 28 significant digits are enough for the maximum circulating
/// supply in atto, so all arithmetic stays exact here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenAmount(Decimal);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_atto(atto: impl Into<Decimal>) -> Self {
        Self(atto.into())
    }

    pub fn atto(&self) -> Decimal {
        self.0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Render as a whole-FIL decimal string, e.g. `"3000000000000000000"`
    /// atto becomes `"3"`. The rescale by 10^18 is exact.
    pub fn to_fil_string(&self) -> String {
        let mut fil = self.0.normalize();
        let scale = fil.scale() + 18;
        if fil.set_scale(scale).is_ok() {
            fil.normalize().to_string()
        } else {
            (self.0 / Decimal::new(1_000_000_000_000_000_000, 0))
                .normalize()
                .to_string()
        }
    }
}

impl FromStr for TokenAmount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Sector lifecycle state name -> count, as returned by
/// `Filecoin.SectorsSummary`. The state-name set is open-ended on the wire.
pub type SectorStateSummary = BTreeMap<String, u64>;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDeal {
    #[serde(rename = "Proposal")]
    pub proposal: DealProposal,
    #[serde(rename = "State", default)]
    pub state: DealState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealProposal {
    #[serde(rename = "PieceSize", default)]
    pub piece_size: u64,
    #[serde(rename = "Client", default)]
    pub client: String,
    #[serde(rename = "Provider", default)]
    pub provider: String,
    #[serde(rename = "StartEpoch", default)]
    pub start_epoch: i64,
    #[serde(rename = "EndEpoch", default)]
    pub end_epoch: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealState {
    #[serde(rename = "SectorStartEpoch", default)]
    pub sector_start_epoch: i64,
    #[serde(rename = "LastUpdatedEpoch", default)]
    pub last_updated_epoch: i64,
    #[serde(rename = "SlashEpoch", default)]
    pub slash_epoch: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalDeal {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Status")]
    pub status: u64,
    #[serde(rename = "TotalSent")]
    pub total_sent: u64,
}

/// Per-worker statistics from `Filecoin.WorkerStats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerStats {
    #[serde(rename = "Info")]
    pub info: WorkerInfo,
    #[serde(rename = "MemUsedMin", default)]
    pub mem_used_min: u64,
    #[serde(rename = "MemUsedMax", default)]
    pub mem_used_max: u64,
    #[serde(rename = "GpuUsed", default)]
    pub gpu_used: bool,
    #[serde(rename = "CpuUse", default)]
    pub cpu_use: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerInfo {
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "Resources", default)]
    pub resources: WorkerResources,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerResources {
    #[serde(rename = "MemPhysical", default)]
    pub mem_physical: u64,
    #[serde(rename = "MemSwap", default)]
    pub mem_swap: u64,
    #[serde(rename = "MemReserved", default)]
    pub mem_reserved: u64,
    #[serde(rename = "CPUs", default)]
    pub cpus: u64,
    #[serde(rename = "GPUs", default)]
    pub gpus: Vec<String>,
}

/// An in-flight sealing job from `Filecoin.WorkerJobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerJob {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Sector")]
    pub sector: SectorRef,
    #[serde(rename = "Task")]
    pub task: String,
    #[serde(rename = "RunWait", default)]
    pub run_wait: i64,
    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SectorRef {
    #[serde(rename = "Miner")]
    pub miner: u64,
    #[serde(rename = "Number")]
    pub number: u64,
}

/// Storage-device identifier from `Filecoin.StorageList`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(pub String);

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sector declared on a storage device.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SectorDecl {
    #[serde(rename = "SectorID")]
    pub sector_id: SectorRef,
}

/// Filesystem usage for one storage device, from `Filecoin.StorageStat`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct FsStat {
    #[serde(rename = "Capacity")]
    pub capacity: i64,
    #[serde(rename = "Available")]
    pub available: i64,
    #[serde(rename = "FSAvailable")]
    pub fs_available: i64,
    #[serde(rename = "Reserved")]
    pub reserved: i64,
    #[serde(rename = "Max")]
    pub max: i64,
    #[serde(rename = "Used")]
    pub used: i64,
}

/// Static attachment metadata for one storage device.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageInfo {
    #[serde(rename = "ID")]
    pub id: StorageId,
    #[serde(rename = "Weight")]
    pub weight: u64,
    #[serde(rename = "CanSeal")]
    pub can_seal: bool,
    #[serde(rename = "CanStore")]
    pub can_store: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_status_decodes_wire_shape() {
        let raw = r#"{
            "SyncStatus": {"Epoch": 12345, "Behind": 2},
            "PeerStatus": {"PeersToPublishMsgs": 20, "PeersToPublishBlocks": 18}
        }"#;
        let status: NodeStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.sync_status.epoch, 12345);
        assert_eq!(status.sync_status.behind, 2);
        assert_eq!(status.peer_status.peers_to_publish_msgs, 20);
        assert_eq!(status.peer_status.peers_to_publish_blocks, 18);
    }

    #[test]
    fn token_amount_round_trips_atto_string() {
        let amount: TokenAmount = serde_json::from_str("\"3000000000000000000\"").unwrap();
        assert_eq!(amount.to_fil_string(), "3");
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"3000000000000000000\"");
    }

    #[test]
    fn token_amount_renders_fractional_fil() {
        let amount: TokenAmount = "1500000000000000000".parse().unwrap();
        assert_eq!(amount.to_fil_string(), "1.5");
        assert_eq!(TokenAmount::zero().to_fil_string(), "0");
    }

    #[test]
    fn worker_stats_decode_nested_resources() {
        let raw = r#"{
            "Info": {
                "Hostname": "sealer-01",
                "Resources": {
                    "MemPhysical": 274877906944,
                    "MemSwap": 0,
                    "MemReserved": 2147483648,
                    "CPUs": 64,
                    "GPUs": ["GeForce RTX 3090"]
                }
            },
            "MemUsedMin": 1073741824,
            "MemUsedMax": 2147483648,
            "GpuUsed": true,
            "CpuUse": 12
        }"#;
        let stats: WorkerStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.info.hostname, "sealer-01");
        assert_eq!(stats.info.resources.cpus, 64);
        assert!(stats.gpu_used);
        assert_eq!(stats.cpu_use, 12);
    }

    #[test]
    fn worker_job_decodes_timestamp_and_sector() {
        let raw = r#"{
            "ID": "2f8b6f0c-3f31-4a39-9b0a-1f2e4c5d6a7b",
            "Sector": {"Miner": 1001, "Number": 42},
            "Task": "seal/v0/precommit/1",
            "RunWait": 3,
            "Start": "2021-04-02T17:00:00Z"
        }"#;
        let job: WorkerJob = serde_json::from_str(raw).unwrap();
        assert_eq!(job.sector.miner, 1001);
        assert_eq!(job.sector.number, 42);
        assert_eq!(job.run_wait, 3);
        assert_eq!(job.start.to_rfc3339(), "2021-04-02T17:00:00+00:00");
    }

    #[test]
    fn fs_stat_tolerates_missing_fields() {
        let stat: FsStat = serde_json::from_str(r#"{"Capacity": 100, "Available": 40}"#).unwrap();
        assert_eq!(stat.capacity, 100);
        assert_eq!(stat.available, 40);
        assert_eq!(stat.fs_available, 0);
    }
}
