use crate::{Error, Result};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// JSON-RPC 2.0 client for a Lotus HTTP endpoint.
///
/// Lotus serves its API at `/rpc/{version}` and authenticates read calls
/// with a bearer token minted by `lotus auth create-token`.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    /// `addr` is a bare `host:port`; `api_version` selects the `/rpc/{v}`
    /// path segment.
    pub fn new(addr: &str, api_version: &str, token: Option<String>) -> Result<Self> {
        let raw = format!("http://{addr}/rpc/{api_version}");
        let endpoint = Url::parse(&raw).map_err(|source| Error::InvalidEndpoint {
            addr: addr.to_string(),
            source,
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            token,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue one call and deserialize its `result` member.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        let envelope: RpcResponse = response.json().await?;
        if let Some(err) = envelope.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = envelope.result.ok_or(Error::EmptyResponse { id })?;
        Ok(serde_json::from_value(result)?)
    }
}
