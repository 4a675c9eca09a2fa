use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("json-rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("response deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response {id} carried neither result nor error")]
    EmptyResponse { id: u64 },
    #[error("invalid endpoint address {addr:?}: {source}")]
    InvalidEndpoint {
        addr: String,
        #[source]
        source: url::ParseError,
    },
}
