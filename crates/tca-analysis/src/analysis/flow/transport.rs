use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::FlowRequest;

/// Failure classes reported by a transport.
///
/// Timeouts, undecodable bodies and unclassified failures are retried;
/// connection refusals and error statuses fall back immediately.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("flow service timed out")]
    Timeout,
    #[error("flow service unreachable: {0}")]
    Connect(String),
    #[error("flow service returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("flow service response could not be decoded: {0}")]
    Decode(String),
    #[error("flow service request failed: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Decode(_) | Self::Other(_))
    }
}

/// Seam between the flow client and the external AI flow service.
pub trait FlowTransport: Send + Sync + 'static {
    fn run_flow(&self, request: &FlowRequest) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn health(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// JSON-over-HTTP transport: `POST {base}/api/runFlow` and `GET {base}/health`.
#[derive(Debug, Clone)]
pub struct HttpFlowTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlowTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Other(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// Error-status body; a failed read is logged and named in the body instead of dropped.
fn status_body<E: fmt::Display>(code: u16, read: Result<String, E>) -> String {
    match read {
        Ok(body) => body,
        Err(err) => {
            warn!(status = code, error = %err, "flow service error body could not be read");
            format!("<unreadable body: {err}>")
        }
    }
}

impl FlowTransport for HttpFlowTransport {
    async fn run_flow(&self, request: &FlowRequest) -> Result<Value, TransportError> {
        let url = format!("{}/api/runFlow", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            return Err(TransportError::Status {
                code,
                body: status_body(code, response.text().await),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))
    }

    async fn health(&self) -> Result<(), TransportError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                code: status.as_u16(),
                body: String::new(),
            })
        }
    }
}

/// Transport for air-gapped runs: every call is refused, so every module
/// uses its deterministic fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl FlowTransport for OfflineTransport {
    async fn run_flow(&self, request: &FlowRequest) -> Result<Value, TransportError> {
        Err(TransportError::Connect(format!(
            "offline mode, flow {} not sent",
            request.flow_name
        )))
    }

    async fn health(&self) -> Result<(), TransportError> {
        Err(TransportError::Connect("offline mode".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_timeouts_decode_and_unclassified_failures_are_transient() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Decode("eof".into()).is_transient());
        assert!(TransportError::Other("reset".into()).is_transient());
        assert!(!TransportError::Connect("refused".into()).is_transient());
        assert!(!TransportError::Status {
            code: 503,
            body: String::new()
        }
        .is_transient());
    }

    #[tokio::test]
    async fn offline_transport_refuses_every_call() {
        let request = FlowRequest::new("generateTCAScorecard", json!({}));
        let error = OfflineTransport.run_flow(&request).await.expect_err("offline");
        assert!(matches!(error, TransportError::Connect(_)));
        assert!(OfflineTransport.health().await.is_err());
    }

    #[test]
    fn unreadable_error_body_is_reported() {
        assert_eq!(status_body::<String>(502, Ok("bad gateway".into())), "bad gateway");
        let body = status_body(503, Err("connection reset mid-body"));
        assert_eq!(body, "<unreadable body: connection reset mid-body>");

        let error = TransportError::Status { code: 503, body };
        assert!(error.to_string().contains("unreadable body"));
    }

    #[test]
    fn http_transport_normalizes_base_url() {
        let transport =
            HttpFlowTransport::new("http://localhost:3100/", Duration::from_secs(5)).expect("client builds");
        assert_eq!(transport.base_url(), "http://localhost:3100");
    }
}
