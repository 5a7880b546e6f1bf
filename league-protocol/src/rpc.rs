//! JSON-RPC 2.0 request/response envelopes, the outbound [`RpcClient`] (retry +
//! circuit breaker per spec §4.1), and the server-side dispatch table contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{CircuitConfig, RetryPolicy};
use crate::envelope::MessageEnvelope;
use crate::error::{DomainErrorBody, DomainErrorCode, JsonRpcError, ProtocolError};
use crate::retry::Backoff;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: u64,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), result: Some(result), error: None, id }
    }

    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), result: None, error: Some(error), id }
    }
}

/// Every method's params is an envelope plus a message-specific body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcParams<T> {
    pub envelope: MessageEnvelope,
    pub body: T,
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

// --- Circuit breaker -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-remote-endpoint three-state breaker. One instance lives per [`RpcClient`].
pub struct CircuitBreaker {
    state: CircuitState,
    config: CircuitConfig,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            config,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Whether a call may proceed right now; flips OPEN -> HALF_OPEN once the
    /// cooldown has elapsed as a side effect of the check.
    pub fn allow_request(&mut self) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = self.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= Duration::from_secs(self.config.reset_timeout_s) {
                    self.state = CircuitState::HalfOpen;
                    self.consecutive_successes = 0;
                    tracing::debug!(machine = "CircuitBreaker", from = ?CircuitState::Open, to = ?CircuitState::HalfOpen, "state transition");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn on_success(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                self.consecutive_successes += 1;
                if self.consecutive_successes >= self.config.success_threshold {
                    self.state = CircuitState::Closed;
                    self.consecutive_failures = 0;
                    tracing::debug!(machine = "CircuitBreaker", from = ?CircuitState::HalfOpen, to = ?CircuitState::Closed, "state transition");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.config.failure_threshold {
                    self.trip_open();
                }
            }
            CircuitState::HalfOpen => self.trip_open(),
            CircuitState::Open => {}
        }
    }

    fn trip_open(&mut self) {
        let from = self.state;
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        tracing::debug!(machine = "CircuitBreaker", ?from, to = ?CircuitState::Open, "state transition");
    }
}

/// Registry of one breaker per remote endpoint URL, owned by whoever makes
/// outbound calls (referee, manager, orchestrator).
#[derive(Clone)]
pub struct CircuitRegistry {
    config: CircuitConfig,
    breakers: Arc<Mutex<HashMap<String, Arc<Mutex<CircuitBreaker>>>>>,
}

impl CircuitRegistry {
    pub fn new(config: CircuitConfig) -> Self {
        Self { config, breakers: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub async fn breaker_for(&self, endpoint: &str) -> Arc<Mutex<CircuitBreaker>> {
        let mut map = self.breakers.lock().await;
        map.entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(self.config.clone()))))
            .clone()
    }
}

// --- Client ------------------------------------------------------------

/// An outbound JSON-RPC client for one remote endpoint, applying the retry +
/// circuit-breaker policy from spec §4.1 uniformly to every call site
/// (manager -> referee/player, referee -> player, orchestrator -> agent health).
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    breaker: Arc<Mutex<CircuitBreaker>>,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy, breaker: Arc<Mutex<CircuitBreaker>>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), retry, breaker }
    }

    /// Calls `method` with `params`, retrying transient failures with exponential
    /// backoff and respecting `deadline` as the per-call timeout. Each attempt is
    /// gated on the circuit breaker; a call made while OPEN fails immediately
    /// with [`DomainErrorCode::Transient`] and does not count as a network attempt.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &RpcParams<P>,
        deadline: Duration,
    ) -> Result<R, ProtocolError> {
        let mut backoff = Backoff::new(self.retry.clone());
        loop {
            if !self.breaker.lock().await.allow_request() {
                return Err(ProtocolError::Domain(DomainErrorBody::new(
                    DomainErrorCode::Transient,
                    format!("circuit open for {}", self.base_url),
                )));
            }

            let request = JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                method: method.to_string(),
                params: serde_json::to_value(params)?,
                id: next_request_id(),
            };

            let attempt = self.send_once(&request, deadline).await;

            match attempt {
                Ok(response) => {
                    if let Some(error) = response.error {
                        self.breaker.lock().await.on_failure();
                        let retryable = error
                            .data
                            .as_ref()
                            .map(|d| d.retryable)
                            .unwrap_or(false);
                        if retryable {
                            if let Some(delay) = backoff.next_delay() {
                                tokio::time::sleep(delay).await;
                                continue;
                            }
                        }
                        return Err(ProtocolError::Domain(
                            error.data.unwrap_or_else(|| {
                                DomainErrorBody::new(DomainErrorCode::Transient, error.message.clone())
                            }),
                        ));
                    }
                    self.breaker.lock().await.on_success();
                    let result = response.result.ok_or_else(|| {
                        ProtocolError::Internal("response carried neither result nor error".into())
                    })?;
                    return Ok(serde_json::from_value(result)?);
                }
                Err(err) if is_retryable_transport_error(&err) => {
                    self.breaker.lock().await.on_failure();
                    if let Some(delay) = backoff.next_delay() {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(ProtocolError::Domain(DomainErrorBody::new(
                        DomainErrorCode::Timeout,
                        format!("exhausted {} attempts calling {method}", backoff.max_attempts()),
                    )));
                }
                Err(other) => {
                    self.breaker.lock().await.on_failure();
                    return Err(other);
                }
            }
        }
    }

    async fn send_once(&self, request: &JsonRpcRequest, deadline: Duration) -> Result<JsonRpcResponse, ProtocolError> {
        let url = format!("{}/mcp", self.base_url);
        let send = self.http.post(&url).json(request).send();
        let response = tokio::time::timeout(deadline, send)
            .await
            .map_err(|_| {
                ProtocolError::Domain(DomainErrorBody::new(
                    DomainErrorCode::Timeout,
                    format!("deadline of {:?} exceeded calling {url}", deadline),
                ))
            })??;
        Ok(response.json::<JsonRpcResponse>().await?)
    }
}

fn is_retryable_transport_error(err: &ProtocolError) -> bool {
    match err {
        ProtocolError::Http(e) => e.is_timeout() || e.is_connect(),
        ProtocolError::Domain(body) => body.retryable,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(failure_threshold: u32, reset_timeout_s: u64, success_threshold: u32) -> CircuitConfig {
        CircuitConfig { failure_threshold, reset_timeout_s, success_threshold }
    }

    #[test]
    fn trips_open_after_failure_threshold() {
        let mut breaker = CircuitBreaker::new(config(3, 60, 2));
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.on_failure();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn stays_open_before_cooldown_elapses() {
        let mut breaker = CircuitBreaker::new(config(1, 60, 2));
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let mut breaker = CircuitBreaker::new(config(1, 0, 2));
        breaker.on_failure();
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let mut breaker = CircuitBreaker::new(config(1, 0, 2));
        breaker.on_failure();
        assert!(breaker.allow_request());
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
