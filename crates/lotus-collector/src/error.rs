use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A remote call could not complete. `call` names the failed sub-call.
    #[error("{call} failed: {source}")]
    Transport {
        call: &'static str,
        #[source]
        source: lotus_api::Error,
    },
    /// The reduced balance string did not parse as a float. This means the
    /// upstream balance representation is corrupt, not a transient outage.
    #[error("balance {value:?} is not representable as f64")]
    Conversion { value: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn transport(call: &'static str, source: lotus_api::Error) -> Self {
        Self::Transport { call, source }
    }
}
