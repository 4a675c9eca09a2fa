use crate::{
    Error, Result, balance,
    fetch::{CALL_NODE_STATUS, CALL_WALLET_BALANCE, CALL_WALLET_LIST},
};
use lotus_api::FullNodeApi;
use tracing::debug;

/// Second argument to `NodeStatus`. Upstream never documented it; observed
/// behavior is that it toggles inclusion of extended chain detail, so it is
/// pinned here rather than exposed as configuration.
pub const INCLUDE_CHAIN_DETAIL: bool = true;

/// One cycle's view of the daemon. Constructed fresh per poll, never
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DaemonSnapshot {
    pub epoch: i64,
    pub behind: u64,
    pub message_peers: u64,
    pub block_peers: u64,
    /// Aggregate over every wallet address, in whole FIL.
    pub balance_fil: f64,
}

pub struct DaemonFetcher<A> {
    api: A,
}

impl<A: FullNodeApi> DaemonFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Issue the status, wallet-list and per-address balance calls and fold
    /// them into one snapshot. Any remote failure aborts the daemon fetch
    /// with the failing sub-call's name; there is no retry at this layer.
    pub async fn fetch(&self) -> Result<DaemonSnapshot> {
        let status = self
            .api
            .node_status(INCLUDE_CHAIN_DETAIL)
            .await
            .map_err(|e| Error::transport(CALL_NODE_STATUS, e))?;

        let addresses = self
            .api
            .wallet_list()
            .await
            .map_err(|e| Error::transport(CALL_WALLET_LIST, e))?;
        debug!(addresses = addresses.len(), "summing wallet balances");

        let mut balances = Vec::with_capacity(addresses.len());
        for address in &addresses {
            let amount = self
                .api
                .wallet_balance(address)
                .await
                .map_err(|e| Error::transport(CALL_WALLET_BALANCE, e))?;
            balances.push(amount);
        }

        let total = balance::reduce(balances);
        let balance_fil = balance::to_display_unit(&total)?;

        Ok(DaemonSnapshot {
            epoch: status.sync_status.epoch,
            behind: status.sync_status.behind,
            message_peers: status.peer_status.peers_to_publish_msgs,
            block_peers: status.peer_status.peers_to_publish_blocks,
            balance_fil,
        })
    }
}
