use crate::{Error, Result};
use clap::Parser;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(name = "lotus-collector", about = "Stream lotus-daemon and lotus-miner metrics")]
pub struct AppArgs {
    /// Path to a TOML config file; LOTUS__-prefixed environment variables
    /// take priority over it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Run a single collection cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log filter directive (e.g. "info", "lotus_collector=debug")
    #[serde(default = "default_log")]
    pub log: String,
    /// Seconds between collection cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Concurrency bound for per-device storage stat/info calls
    #[serde(default = "default_storage_fan_out")]
    pub storage_fan_out: usize,
    /// Listen address for the Prometheus self-metrics endpoint; disabled
    /// when absent
    #[serde(default)]
    pub metrics_addr: Option<String>,
    /// Daemon endpoint; the daemon fetcher is not constructed when absent
    #[serde(default)]
    pub daemon: Option<DaemonSettings>,
    /// Miner endpoint; the miner fetcher is not constructed when absent
    #[serde(default)]
    pub miner: Option<MinerSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Lotus daemon listen address
    #[serde(default = "default_daemon_addr")]
    pub addr: String,
    /// Lotus daemon API token
    #[serde(default)]
    pub token: String,
    /// API path version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerSettings {
    /// Lotus miner listen address
    #[serde(default = "default_miner_addr")]
    pub addr: String,
    /// Lotus miner API token
    #[serde(default)]
    pub token: String,
    /// API path version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Settings {
    /// Load from an optional config file plus environment. Missing endpoint
    /// credentials are fatal here; a misconfigured endpoint never succeeds
    /// later.
    pub fn load(config_path: Option<&PathBuf>) -> anyhow::Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let mut builder = ConfigBuilder::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(&path.to_string_lossy()));
        }
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("LOTUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(daemon) = &self.daemon {
            validate_endpoint("daemon", &daemon.addr, &daemon.token)?;
        }
        if let Some(miner) = &self.miner {
            validate_endpoint("miner", &miner.addr, &miner.token)?;
        }
        if self.daemon.is_none() && self.miner.is_none() {
            return Err(Error::Configuration(
                "neither [daemon] nor [miner] is configured; nothing to collect".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Configuration(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.storage_fan_out == 0 {
            return Err(Error::Configuration(
                "storage_fan_out must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>> {
        match &self.metrics_addr {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Error::Configuration(format!("invalid metrics_addr {raw:?}"))),
        }
    }
}

fn validate_endpoint(name: &str, addr: &str, token: &str) -> Result<()> {
    if addr.is_empty() {
        return Err(Error::Configuration(format!("{name} addr is empty")));
    }
    if token.is_empty() {
        return Err(Error::Configuration(format!("{name} token is empty")));
    }
    Ok(())
}

fn default_log() -> String {
    "info".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_storage_fan_out() -> usize {
    // Conservative bound pending real deployment data
    8
}

fn default_daemon_addr() -> String {
    "127.0.0.1:1234".to_string()
}

fn default_miner_addr() -> String {
    "127.0.0.1:2345".to_string()
}

fn default_api_version() -> String {
    "v0".to_string()
}
