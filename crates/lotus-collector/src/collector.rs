use crate::{
    Error, Result,
    fetch::{DaemonFetcher, DaemonSnapshot, MinerFetcher, MinerSnapshot},
};
use lotus_api::{FullNodeApi, StorageMinerApi};
use tracing::error;

/// The pair of snapshots produced by one polling cycle. A `None` side means
/// that fetcher is either not configured or failed this cycle.
#[derive(Debug, Default)]
pub struct CycleSnapshot {
    pub daemon: Option<DaemonSnapshot>,
    pub miner: Option<MinerSnapshot>,
}

/// Orchestrates one polling cycle over whichever fetchers are configured.
/// Fetcher presence is decided once at construction, not per call.
pub struct Collector<D, M> {
    daemon: Option<DaemonFetcher<D>>,
    miner: Option<MinerFetcher<M>>,
}

impl<D, M> Collector<D, M>
where
    D: FullNodeApi,
    M: StorageMinerApi + 'static,
{
    pub fn new(daemon: Option<DaemonFetcher<D>>, miner: Option<MinerFetcher<M>>) -> Self {
        Self { daemon, miner }
    }

    /// Run both fetches concurrently; neither blocks or fails the other.
    ///
    /// A daemon transport failure degrades to an absent daemon snapshot for
    /// this cycle. Only a balance conversion failure propagates, since that
    /// signals corrupt data rather than a transient outage.
    pub async fn collect(&self) -> Result<CycleSnapshot> {
        let daemon_fetch = async {
            match &self.daemon {
                Some(fetcher) => Some(fetcher.fetch().await),
                None => None,
            }
        };
        let miner_fetch = async {
            match &self.miner {
                Some(fetcher) => Some(fetcher.fetch().await),
                None => None,
            }
        };

        let (daemon_result, miner) = tokio::join!(daemon_fetch, miner_fetch);

        let daemon = match daemon_result {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(err @ Error::Conversion { .. })) => return Err(err),
            Some(Err(err)) => {
                error!(%err, "daemon fetch failed; omitting daemon metrics this cycle");
                metrics::counter!("lotus_collector_daemon_fetch_failures").increment(1);
                None
            }
            None => None,
        };

        Ok(CycleSnapshot { daemon, miner })
    }
}
