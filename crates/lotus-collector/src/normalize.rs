use crate::{
    accumulator::{Accumulator, MetricRecord},
    collector::CycleSnapshot,
    fetch::MinerSnapshot,
};
use std::collections::HashMap;
use uuid::Uuid;

const OVERVIEW_MEASUREMENT: &str = "lotus";
const WORKER_MEASUREMENT: &str = "lotus_worker";
const JOB_MEASUREMENT: &str = "lotus_job";
const STORAGE_MEASUREMENT: &str = "lotus_storage";

/// Explode a cycle's snapshots into flat records.
///
/// Per-worker, per-job and per-device source collections are unordered
/// keyed maps, so the emission order of those records is unspecified; only
/// the record set and its field/tag content are stable.
pub fn normalize(cycle: &CycleSnapshot, acc: &mut dyn Accumulator) {
    if cycle.daemon.is_none() && cycle.miner.is_none() {
        return;
    }

    let empty_miner = MinerSnapshot::default();
    let miner = cycle.miner.as_ref().unwrap_or(&empty_miner);

    emit_overview(cycle, miner, acc);

    // Worker-id -> hostname, scoped to this single cycle. Joining jobs
    // against a different cycle's worker stats would be a correctness bug.
    let hostnames = emit_workers(miner, acc);
    emit_jobs(miner, &hostnames, acc);
    emit_storage(miner, acc);
}

fn emit_overview(cycle: &CycleSnapshot, miner: &MinerSnapshot, acc: &mut dyn Accumulator) {
    let daemon = cycle.daemon.unwrap_or_default();

    let mut record = MetricRecord::new(OVERVIEW_MEASUREMENT)
        .field("epoch", daemon.epoch)
        .field("behind", daemon.behind)
        .field("messagePeers", daemon.message_peers)
        .field("blockPeers", daemon.block_peers)
        .field("balance", daemon.balance_fil)
        .field("marketDeals", miner.market_deals.len() as u64)
        .field("retrievalDeals", miner.retrieval_deals.len() as u64);

    // Derived total, recomputed from the map every cycle.
    let mut sectors_total = 0u64;
    for (state, count) in &miner.sector_states {
        record = record.field(format!("sectors{state}"), *count);
        sectors_total += count;
    }
    record = record.field("sectorsTotal", sectors_total);

    acc.emit(record);
}

fn emit_workers<'a>(
    miner: &'a MinerSnapshot,
    acc: &mut dyn Accumulator,
) -> HashMap<&'a Uuid, &'a str> {
    let mut hostnames = HashMap::with_capacity(miner.worker_stats.len());

    for (worker, stats) in &miner.worker_stats {
        hostnames.insert(worker, stats.info.hostname.as_str());

        acc.emit(
            MetricRecord::new(WORKER_MEASUREMENT)
                .tag("worker", worker.to_string())
                .tag("hostname", stats.info.hostname.clone())
                .field("cpuUse", stats.cpu_use)
                .field("gpuUsed", stats.gpu_used)
                .field("memPhysical", stats.info.resources.mem_physical)
                .field("memSwap", stats.info.resources.mem_swap)
                .field("memReserved", stats.info.resources.mem_reserved)
                .field("memUsed", stats.mem_used_min)
                .field("memUsedMax", stats.mem_used_max),
        );
    }

    hostnames
}

fn emit_jobs(miner: &MinerSnapshot, hostnames: &HashMap<&Uuid, &str>, acc: &mut dyn Accumulator) {
    for (worker, jobs) in &miner.worker_jobs {
        // A worker can report jobs without a stats entry; tag with an empty
        // hostname rather than dropping the job.
        let hostname = hostnames.get(worker).copied().unwrap_or("");

        for job in jobs {
            acc.emit(
                MetricRecord::new(JOB_MEASUREMENT)
                    .tag("job", job.id.to_string())
                    .tag("worker", worker.to_string())
                    .tag("hostname", hostname)
                    .tag("sector", job.sector.number.to_string())
                    .tag("miner", job.sector.miner.to_string())
                    .field("runWait", job.run_wait)
                    .field("start", job.start.to_rfc3339())
                    .field("task", short_task(&job.task)),
            );
        }
    }
}

fn emit_storage(miner: &MinerSnapshot, acc: &mut dyn Accumulator) {
    static NO_SECTORS: Vec<u64> = Vec::new();

    for (id, stat) in &miner.storage_stats {
        let info = miner.storage_infos.get(id).cloned().unwrap_or_default();
        let sectors = miner.storage_sectors.get(id).unwrap_or(&NO_SECTORS);
        let sector_list = sectors
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        acc.emit(
            MetricRecord::new(STORAGE_MEASUREMENT)
                .tag("storage", id.0.clone())
                .tag("canSeal", info.can_seal.to_string())
                .tag("canStore", info.can_store.to_string())
                .field("available", stat.available)
                .field("capacity", stat.capacity)
                .field("fsAvailable", stat.fs_available)
                .field("max", stat.max)
                .field("reserved", stat.reserved)
                .field("used", stat.used)
                .field("weight", info.weight)
                .field("sectorCount", sectors.len() as u64)
                .field("sectors", sector_list),
        );
    }
}

/// Short label for a sealing task type, e.g. "seal/v0/precommit/1" -> "PC1".
/// Unknown task types pass through unchanged.
fn short_task(task: &str) -> &str {
    match task {
        "seal/v0/addpiece" => "AP",
        "seal/v0/precommit/1" => "PC1",
        "seal/v0/precommit/2" => "PC2",
        "seal/v0/commit/1" => "C1",
        "seal/v0/commit/2" => "C2",
        "seal/v0/finalize" => "FIN",
        "seal/v0/fetch" => "GET",
        "seal/v0/unseal" => "UNS",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accumulator::FieldValue, fetch::DaemonSnapshot};
    use chrono::{TimeZone, Utc};
    use lotus_api::types::{
        FsStat, SectorRef, SectorStateSummary, StorageId, StorageInfo, WorkerInfo, WorkerJob,
        WorkerStats,
    };
    use std::collections::HashMap as StdHashMap;

    fn cycle_with_miner(miner: MinerSnapshot) -> CycleSnapshot {
        CycleSnapshot {
            daemon: None,
            miner: Some(miner),
        }
    }

    fn field<'a>(record: &'a MetricRecord, key: &str) -> &'a FieldValue {
        record.fields.get(key).unwrap_or_else(|| panic!("missing field {key}"))
    }

    #[test]
    fn empty_cycle_emits_nothing() {
        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&CycleSnapshot::default(), &mut acc);
        assert!(acc.records.is_empty());
    }

    #[test]
    fn sectors_total_is_recomputed_from_the_map() {
        let miner = MinerSnapshot {
            sector_states: SectorStateSummary::from([
                ("Proving".to_string(), 3),
                ("Faulty".to_string(), 1),
            ]),
            ..MinerSnapshot::default()
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle_with_miner(miner), &mut acc);

        let overview = acc.by_measurement("lotus")[0];
        assert_eq!(field(overview, "sectorsProving"), &FieldValue::UInt(3));
        assert_eq!(field(overview, "sectorsFaulty"), &FieldValue::UInt(1));
        assert_eq!(field(overview, "sectorsTotal"), &FieldValue::UInt(4));
    }

    #[test]
    fn overview_carries_daemon_and_deal_counts() {
        let cycle = CycleSnapshot {
            daemon: Some(DaemonSnapshot {
                epoch: 12345,
                behind: 0,
                message_peers: 20,
                block_peers: 18,
                balance_fil: 3.0,
            }),
            miner: Some(MinerSnapshot::default()),
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle, &mut acc);

        let overview = acc.by_measurement("lotus")[0];
        assert_eq!(field(overview, "epoch"), &FieldValue::Int(12345));
        assert_eq!(field(overview, "behind"), &FieldValue::UInt(0));
        assert_eq!(field(overview, "messagePeers"), &FieldValue::UInt(20));
        assert_eq!(field(overview, "blockPeers"), &FieldValue::UInt(18));
        assert_eq!(field(overview, "balance"), &FieldValue::Float(3.0));
        assert_eq!(field(overview, "marketDeals"), &FieldValue::UInt(0));
    }

    #[test]
    fn jobs_without_worker_stats_get_empty_hostname() {
        let worker = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2021, 4, 2, 17, 0, 0).unwrap();
        let job = |n| WorkerJob {
            id: Uuid::new_v4(),
            sector: SectorRef {
                miner: 1001,
                number: n,
            },
            task: "seal/v0/precommit/1".to_string(),
            run_wait: 2,
            start,
        };

        let miner = MinerSnapshot {
            worker_jobs: StdHashMap::from([(worker, vec![job(1), job(2)])]),
            ..MinerSnapshot::default()
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle_with_miner(miner), &mut acc);

        let jobs = acc.by_measurement("lotus_job");
        assert_eq!(jobs.len(), 2);
        for record in jobs {
            assert_eq!(record.tags["hostname"], "");
            assert_eq!(record.tags["worker"], worker.to_string());
            assert_eq!(record.tags["miner"], "1001");
            assert_eq!(field(record, "task"), &FieldValue::Text("PC1".to_string()));
            assert_eq!(
                field(record, "start"),
                &FieldValue::Text("2021-04-02T17:00:00+00:00".to_string())
            );
        }
    }

    #[test]
    fn job_hostnames_resolve_from_same_cycle_worker_stats() {
        let worker = Uuid::new_v4();
        let stats = WorkerStats {
            info: WorkerInfo {
                hostname: "sealer-01".to_string(),
                ..WorkerInfo::default()
            },
            ..WorkerStats::default()
        };
        let job = WorkerJob {
            id: Uuid::new_v4(),
            sector: SectorRef { miner: 7, number: 9 },
            task: "seal/v0/commit/2".to_string(),
            run_wait: 0,
            start: Utc::now(),
        };

        let miner = MinerSnapshot {
            worker_stats: StdHashMap::from([(worker, stats)]),
            worker_jobs: StdHashMap::from([(worker, vec![job])]),
            ..MinerSnapshot::default()
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle_with_miner(miner), &mut acc);

        let workers = acc.by_measurement("lotus_worker");
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].tags["hostname"], "sealer-01");

        let jobs = acc.by_measurement("lotus_job");
        assert_eq!(jobs[0].tags["hostname"], "sealer-01");
        assert_eq!(field(jobs[0], "task"), &FieldValue::Text("C2".to_string()));
    }

    #[test]
    fn storage_records_combine_stat_info_and_sectors() {
        let id = StorageId("dev-1".to_string());
        let miner = MinerSnapshot {
            storage_stats: StdHashMap::from([(
                id.clone(),
                FsStat {
                    capacity: 1000,
                    available: 400,
                    fs_available: 390,
                    reserved: 10,
                    max: 900,
                    used: 600,
                },
            )]),
            storage_infos: StdHashMap::from([(
                id.clone(),
                StorageInfo {
                    id: id.clone(),
                    weight: 10,
                    can_seal: true,
                    can_store: false,
                },
            )]),
            storage_sectors: StdHashMap::from([(id.clone(), vec![3, 5, 8])]),
            ..MinerSnapshot::default()
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle_with_miner(miner), &mut acc);

        let storage = acc.by_measurement("lotus_storage");
        assert_eq!(storage.len(), 1);
        let record = storage[0];
        assert_eq!(record.tags["storage"], "dev-1");
        assert_eq!(record.tags["canSeal"], "true");
        assert_eq!(record.tags["canStore"], "false");
        assert_eq!(field(record, "capacity"), &FieldValue::Int(1000));
        assert_eq!(field(record, "used"), &FieldValue::Int(600));
        assert_eq!(field(record, "sectorCount"), &FieldValue::UInt(3));
        assert_eq!(
            field(record, "sectors"),
            &FieldValue::Text("3,5,8".to_string())
        );
    }

    #[test]
    fn unreachable_device_emits_zeroed_record() {
        let id = StorageId("dev-dark".to_string());
        let miner = MinerSnapshot {
            storage_stats: StdHashMap::from([(id.clone(), FsStat::default())]),
            storage_infos: StdHashMap::from([(id.clone(), StorageInfo::default())]),
            storage_sectors: StdHashMap::from([(id.clone(), Vec::new())]),
            ..MinerSnapshot::default()
        };

        let mut acc = crate::accumulator::MemoryAccumulator::new();
        normalize(&cycle_with_miner(miner), &mut acc);

        let storage = acc.by_measurement("lotus_storage");
        assert_eq!(storage.len(), 1);
        assert_eq!(field(storage[0], "capacity"), &FieldValue::Int(0));
        assert_eq!(field(storage[0], "used"), &FieldValue::Int(0));
    }

    #[test]
    fn short_task_labels() {
        assert_eq!(short_task("seal/v0/precommit/1"), "PC1");
        assert_eq!(short_task("seal/v0/addpiece"), "AP");
        assert_eq!(short_task("seal/v0/somethingnew"), "seal/v0/somethingnew");
    }
}
