//! Client for the external AI flow service with retry and local fallback.

mod fallback;
mod retry;
mod transport;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use fallback::fallback_payload;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{FlowTransport, HttpFlowTransport, OfflineTransport, TransportError};

pub const DEFAULT_FALLBACK_PENALTY: f64 = 1.5;

/// Named flows exposed by the external service.
pub mod flows {
    pub const TCA_SCORECARD: &str = "generateTCAScorecard";
    pub const RISK_FLAGS: &str = "generateRiskFlagsAndMitigation";
    pub const BENCHMARK_COMPARISON: &str = "generateBenchmarkComparison";
    pub const TEAM_ASSESSMENT: &str = "generateTeamAssessment";
    pub const STRATEGIC_FIT: &str = "generateStrategicFitMatrix";
    pub const GROWTH_CLASSIFIER: &str = "generateGrowthClassifier";
    pub const GAP_ANALYSIS: &str = "generateGapAnalysis";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRequest {
    pub flow_name: String,
    pub input: Value,
}

impl FlowRequest {
    pub fn new(flow_name: &str, input: Value) -> Self {
        Self {
            flow_name: flow_name.to_string(),
            input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Ai,
    Fallback,
}

/// Flow output tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalResult {
    pub source: ResultSource,
    pub payload: Value,
    /// Confidence points the caller should subtract; zero for AI results.
    pub confidence_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error("flow {flow} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        flow: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },
    #[error("flow {flow} rejected: {source}")]
    Rejected {
        flow: String,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowHealth {
    Healthy,
    Unhealthy { reason: String },
}

impl FlowHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

pub struct FlowClient<T, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    strict: bool,
    fallback_penalty: f64,
}

impl<T: FlowTransport> FlowClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper: TokioSleeper,
            policy,
            strict: false,
            fallback_penalty: DEFAULT_FALLBACK_PENALTY,
        }
    }
}

impl<T: FlowTransport, S: Sleeper> FlowClient<T, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> FlowClient<T, S2> {
        FlowClient {
            transport: self.transport,
            sleeper,
            policy: self.policy,
            strict: self.strict,
            fallback_penalty: self.fallback_penalty,
        }
    }

    /// In strict mode every failure is returned as an error instead of a fallback.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_fallback_penalty(mut self, penalty: f64) -> Self {
        self.fallback_penalty = penalty.max(0.0);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn invoke(&self, request: &FlowRequest) -> Result<ExternalResult, FlowError> {
        let mut retry = 0;
        loop {
            debug!(flow = %request.flow_name, attempt = retry + 1, "calling flow service");
            match self.transport.run_flow(request).await {
                Ok(body) => {
                    debug!(flow = %request.flow_name, attempt = retry + 1, "flow call succeeded");
                    return Ok(ExternalResult {
                        source: ResultSource::Ai,
                        payload: unwrap_result(body),
                        confidence_penalty: 0.0,
                    });
                }
                Err(err) if err.is_transient() && retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    warn!(
                        flow = %request.flow_name,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "flow call failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(err) => {
                    let attempts = retry + 1;
                    if self.strict {
                        warn!(flow = %request.flow_name, attempts, error = %err, "flow call failed in strict mode");
                        return Err(if err.is_transient() {
                            FlowError::Exhausted {
                                flow: request.flow_name.clone(),
                                attempts,
                                source: err,
                            }
                        } else {
                            FlowError::Rejected {
                                flow: request.flow_name.clone(),
                                source: err,
                            }
                        });
                    }
                    warn!(
                        flow = %request.flow_name,
                        attempts,
                        transient = err.is_transient(),
                        error = %err,
                        "flow unavailable, using fallback"
                    );
                    return Ok(ExternalResult {
                        source: ResultSource::Fallback,
                        payload: fallback_payload(request),
                        confidence_penalty: self.fallback_penalty,
                    });
                }
            }
        }
    }

    pub async fn health_check(&self) -> FlowHealth {
        match self.transport.health().await {
            Ok(()) => FlowHealth::Healthy,
            Err(err) => FlowHealth::Unhealthy {
                reason: err.to_string(),
            },
        }
    }
}

/// The service may wrap its output in a `result` envelope.
fn unwrap_result(body: Value) -> Value {
    match body {
        Value::Object(mut fields) if fields.contains_key("result") => {
            fields.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}
