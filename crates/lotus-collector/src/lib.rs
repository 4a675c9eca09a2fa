//! Polls a Lotus daemon and storage miner over JSON-RPC and normalizes
//! their nested status responses into flat metric records.
//!
//! One polling cycle runs [`collector::Collector::collect`] to assemble a
//! pair of immutable snapshots, then [`normalize::normalize`] explodes them
//! into per-cycle, per-worker, per-job and per-device records for an
//! [`accumulator::Accumulator`] sink.

pub mod accumulator;
pub mod balance;
pub mod collector;
mod error;
pub mod fetch;
pub mod normalize;
pub mod settings;

pub use error::{Error, Result};
