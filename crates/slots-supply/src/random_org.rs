//! random.org JSON-RPC source
//!
//! One `generateIntegers` call per block. The service reports the remaining
//! bit and request allowance with every answer; codes 402 and 403 (as HTTP
//! status or JSON-RPC error code) mean the allowance is gone.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slots_core::{SlotError, SlotResult};
use uuid::Uuid;

use crate::config::SourceConfig;
use crate::source::{NumberBlock, NumberSource, SourceError};

const REQUESTS_EXHAUSTED: i64 = 402;
const BITS_EXHAUSTED: i64 = 403;

pub struct RandomOrgSource {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: GenerateIntegers<'a>,
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIntegers<'a> {
    api_key: &'a str,
    n: usize,
    min: i32,
    max: i32,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<String>,
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcResult {
    random: RandomData,
    bits_used: u64,
    bits_left: u64,
    requests_left: u64,
}

#[derive(Deserialize)]
struct RandomData {
    data: Vec<i64>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

impl RandomOrgSource {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> SlotResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SlotError::invalid_argument("random.org source requires an api_key"))?;
        Ok(Self::new(config.endpoint.clone(), api_key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Map a non-success HTTP status
pub fn classify_status(status: u16, reason: &str) -> SourceError {
    match i64::from(status) {
        REQUESTS_EXHAUSTED | BITS_EXHAUSTED => {
            SourceError::RateLimited(format!("HTTP {}: {}", status, reason))
        }
        _ => SourceError::Transport(format!("HTTP {}: {}", status, reason)),
    }
}

/// Decode a `generateIntegers` response body
///
/// A 200 response may still carry a JSON-RPC error object.
pub fn parse_response(body: &str) -> Result<NumberBlock, SourceError> {
    let response: RpcResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    if let Some(err) = response.error {
        return Err(match err.code {
            REQUESTS_EXHAUSTED | BITS_EXHAUSTED => {
                SourceError::RateLimited(format!("{}: {}", err.code, err.message))
            }
            _ => SourceError::Transport(format!("{}: {}", err.code, err.message)),
        });
    }

    let result = response
        .result
        .ok_or_else(|| SourceError::Malformed("Response has neither result nor error".into()))?;

    let numbers = result
        .random
        .data
        .into_iter()
        .map(|n| {
            i32::try_from(n)
                .map_err(|_| SourceError::Malformed(format!("{} does not fit i32", n)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NumberBlock {
        id: response.id.unwrap_or_default(),
        numbers,
        bits_used: result.bits_used,
        bits_left: result.bits_left,
        requests_left: result.requests_left,
    })
}

#[async_trait]
impl NumberSource for RandomOrgSource {
    async fn fetch_block(
        &self,
        amount: usize,
        min: i32,
        max: i32,
    ) -> Result<NumberBlock, SourceError> {
        log::debug!("[RandomOrg] Requesting {} numbers in {}..={}", amount, min, max);

        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "generateIntegers",
            params: GenerateIntegers {
                api_key: &self.api_key,
                n: amount,
                min,
                max,
            },
            id: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown");
            let err = classify_status(status.as_u16(), reason);
            log::error!("[RandomOrg] Request failed: {}", err);
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let block = parse_response(&body).inspect_err(|e| {
            log::error!("[RandomOrg] Unusable response: {}", e);
        })?;

        log::debug!(
            "[RandomOrg] Got {} numbers, {} bits / {} requests left",
            block.numbers.len(),
            block.bits_left,
            block.requests_left
        );
        Ok(block)
    }

    fn name(&self) -> &str {
        "random.org"
    }
}
