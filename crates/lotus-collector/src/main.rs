use clap::Parser;
use lotus_api::{FullNodeClient, StorageMinerClient};
use lotus_collector::{
    accumulator::LineProtocolAccumulator,
    collector::Collector,
    fetch::{DaemonFetcher, MinerFetcher},
    normalize,
    settings::{AppArgs, Settings},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::{signal, time::interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse();
    let settings = Settings::load(args.config.as_ref())?;

    // Metric lines go to stdout; everything else goes to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&settings.log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(addr) = settings.metrics_addr()? {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    let daemon = settings
        .daemon
        .as_ref()
        .map(|cfg| FullNodeClient::new(&cfg.addr, &cfg.api_version, Some(cfg.token.clone())))
        .transpose()?
        .map(DaemonFetcher::new);
    let miner = settings
        .miner
        .as_ref()
        .map(|cfg| StorageMinerClient::new(&cfg.addr, &cfg.api_version, Some(cfg.token.clone())))
        .transpose()?
        .map(|client| MinerFetcher::new(client, settings.storage_fan_out));

    let collector = Collector::new(daemon, miner);
    let mut acc = LineProtocolAccumulator::new(std::io::stdout());

    info!(
        daemon = settings.daemon.is_some(),
        miner = settings.miner.is_some(),
        poll_interval_secs = settings.poll_interval_secs,
        "lotus collector starting"
    );

    if args.once {
        run_cycle(&collector, &mut acc).await?;
        return Ok(());
    }

    let shutdown = shutdown_listener();
    let mut poll_timer = interval(settings.poll_interval());

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown signal received");
                break;
            }
            _ = poll_timer.tick() => {
                if let Err(err) = run_cycle(&collector, &mut acc).await {
                    // Only balance conversion failures reach here; they mean
                    // corrupt upstream data, not a transient outage.
                    error!(%err, "fatal collection error");
                    return Err(err.into());
                }
            }
        }
    }

    info!("lotus collector shutting down");
    Ok(())
}

async fn run_cycle(
    collector: &Collector<FullNodeClient, StorageMinerClient>,
    acc: &mut LineProtocolAccumulator<std::io::Stdout>,
) -> lotus_collector::Result<()> {
    let cycle = collector.collect().await?;
    normalize::normalize(&cycle, acc);
    if let Err(err) = acc.flush() {
        error!(?err, "flushing metric output failed");
    }
    metrics::counter!("lotus_collector_cycles").increment(1);
    Ok(())
}

fn shutdown_listener() -> CancellationToken {
    let cancellation_token = CancellationToken::new();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("sigterm listener failed");
    tokio::spawn({
        let cancellation_token = cancellation_token.clone();
        async move {
            tokio::select! {
                _ = sigterm.recv() => cancellation_token.cancel(),
                _ = signal::ctrl_c() => cancellation_token.cancel(),
            }
        }
    });

    cancellation_token
}
