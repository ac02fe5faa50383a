//! HTTP client for the digit classification service.
//!
//! One `POST <endpoint>predict` per call with body `{"image": "<base64>"}`;
//! the service answers `{"digit": 0-9, "probabilities"?: [10 floats]}`.
//! No retries and no timeout beyond the transport default.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sketchpad_core::{EncodedPayload, Endpoint, PredictionResult};
use url::Url;

use crate::InferenceError;

/// Longest raw body echoed into a rejection detail.
const MAX_DETAIL_LEN: usize = 200;

/// The inference boundary.
///
/// Futures are not required to be `Send`: callers drive them on a single
/// cooperative thread, and browser fetch futures are not `Send`.
#[async_trait(?Send)]
pub trait InferenceClient {
    /// Classify one encoded drawing. Exactly one exchange per call.
    ///
    /// # Errors
    ///
    /// [`InferenceError::Network`] on transport failure,
    /// [`InferenceError::Rejected`] on a non-success status and
    /// [`InferenceError::Protocol`] on a body that breaks the contract.
    async fn predict(&self, payload: &EncodedPayload) -> Result<PredictionResult, InferenceError>;

    /// Probe the service's status route.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`InferenceClient::predict`].
    async fn status(&self) -> Result<ServiceStatus, InferenceError>;
}

/// Request body for the prediction route.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest<'a> {
    /// Base64 image body without preamble.
    pub image: &'a str,
}

/// Response body from the prediction route.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    /// Winning class.
    pub digit: i64,
    /// Per-class probabilities; older deployments omit them.
    #[serde(default)]
    pub probabilities: Option<Vec<f64>>,
}

impl PredictResponse {
    /// Validate into a [`PredictionResult`].
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Protocol`] if the digit is out of range or
    /// the probabilities have the wrong shape.
    pub fn into_result(self) -> Result<PredictionResult, InferenceError> {
        PredictionResult::new(self.digit, self.probabilities.as_deref())
            .map_err(|e| InferenceError::Protocol(e.to_string()))
    }
}

/// Answer from the service's status route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    /// Human readable status line.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// `reqwest`-backed [`InferenceClient`].
#[derive(Clone)]
pub struct HttpInferenceClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Endpoint,
    predict_url: Url,
    request_id: AtomicU64,
}

impl HttpInferenceClient {
    /// Create a client for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InvalidEndpoint`] if the predict route cannot
    /// be derived, or [`InferenceError::Network`] if the HTTP client fails to
    /// build.
    pub fn new(endpoint: &Endpoint) -> Result<Self, InferenceError> {
        let predict_url = endpoint
            .predict_url()
            .map_err(|e| InferenceError::InvalidEndpoint(e.to_string()))?;

        #[cfg(not(target_arch = "wasm32"))]
        let http = Client::builder()
            .user_agent(concat!("sketchpad-client/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        #[cfg(target_arch = "wasm32")]
        let http = Client::new();

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint: endpoint.clone(),
                predict_url,
                request_id: AtomicU64::new(1),
            }),
        })
    }

    /// Create a client from a raw base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InvalidEndpoint`] if the URL is malformed.
    pub fn from_url(base_url: &str) -> Result<Self, InferenceError> {
        let endpoint =
            Endpoint::parse(base_url).map_err(|e| InferenceError::InvalidEndpoint(e.to_string()))?;
        Self::new(&endpoint)
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    async fn read_body(response: reqwest::Response) -> Result<String, InferenceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(InferenceError::Rejected {
                status: status.as_u16(),
                detail: rejection_detail(&body, status.canonical_reason()),
            });
        }

        Ok(body)
    }
}

#[async_trait(?Send)]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, payload: &EncodedPayload) -> Result<PredictionResult, InferenceError> {
        let id = self.inner.request_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "predict #{id}: POST {} ({} bytes)",
            self.inner.predict_url,
            payload.len()
        );

        let response = self
            .inner
            .http
            .post(self.inner.predict_url.clone())
            .json(&PredictRequest {
                image: payload.as_str(),
            })
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let result = parse_prediction(&body)?;
        tracing::debug!("predict #{id}: digit {}", result.digit);
        Ok(result)
    }

    async fn status(&self) -> Result<ServiceStatus, InferenceError> {
        let response = self
            .inner
            .http
            .get(self.inner.endpoint.base().clone())
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| InferenceError::Protocol(format!("malformed status body: {e}")))
    }
}

/// Parse a prediction response body.
///
/// # Errors
///
/// Returns [`InferenceError::Protocol`] if the body is not JSON, lacks an
/// integer `digit`, or breaks the class-count invariants.
pub fn parse_prediction(body: &str) -> Result<PredictionResult, InferenceError> {
    let response: PredictResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::Protocol(format!("malformed prediction body: {e}")))?;
    response.into_result()
}

fn rejection_detail(body: &str, reason: Option<&str>) -> String {
    if let Ok(ErrorBody { detail }) = serde_json::from_str::<ErrorBody>(body) {
        return match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.unwrap_or("no detail").to_string();
    }

    match trimmed.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // =========================================================================
    // Unit tests that don't require network/wiremock

    #[test]
    fn parses_digit_with_probabilities() {
        let result = parse_prediction(
            r#"{"digit":7,"probabilities":[0,0,0,0,0,0,0,0.92,0.05,0.03]}"#,
        )
        .expect("valid");
        assert_eq!(result.digit.value(), 7);
        let probs = result.probabilities.expect("probabilities");
        assert!((probs.get(7) - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn absent_or_null_probabilities_are_accepted() {
        assert!(parse_prediction(r#"{"digit":3}"#)
            .expect("valid")
            .probabilities
            .is_none());
        assert!(parse_prediction(r#"{"digit":3,"probabilities":null}"#)
            .expect("valid")
            .probabilities
            .is_none());
    }

    #[test]
    fn protocol_violations() {
        for body in [
            "not json",
            r#"{"probabilities":[]}"#,
            r#"{"digit":10}"#,
            r#"{"digit":-1}"#,
            r#"{"digit":"7"}"#,
            r#"{"digit":7.5}"#,
            r#"{"digit":1,"probabilities":[0.5,0.5]}"#,
        ] {
            let err = parse_prediction(body).expect_err(body);
            assert!(matches!(err, InferenceError::Protocol(_)), "{body}: {err}");
        }
    }

    #[test]
    fn rejection_detail_prefers_detail_field() {
        assert_eq!(
            rejection_detail(r#"{"detail":"cannot identify image file"}"#, None),
            "cannot identify image file"
        );
        assert_eq!(rejection_detail("", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(rejection_detail("upstream down", None), "upstream down");
        let long = "x".repeat(500);
        assert_eq!(rejection_detail(&long, None).len(), MAX_DETAIL_LEN + 3);
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(PredictRequest { image: "AAAA" }).expect("serialize");
        assert_eq!(body, json!({ "image": "AAAA" }));
    }

    #[test]
    fn from_url_rejects_garbage() {
        assert!(matches!(
            HttpInferenceClient::from_url("::not a url::"),
            Err(InferenceError::InvalidEndpoint(_))
        ));
    }

    // =========================================================================
    // Contract tests against a mock service

    fn payload() -> EncodedPayload {
        sketchpad_core::to_payload_str("data:image/png;base64,iVBORw0KGgo=").expect("payload")
    }

    fn client_for(server: &MockServer) -> HttpInferenceClient {
        HttpInferenceClient::from_url(&server.uri()).expect("client")
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn predict_posts_image_and_parses_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(json!({ "image": "iVBORw0KGgo=" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "digit": 7,
                "probabilities": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.92, 0.05, 0.03]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).predict(&payload()).await.expect("predict");
        assert_eq!(result.digit.value(), 7);
        assert!(result.probabilities.is_some());
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn predict_respects_endpoint_base_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "digit": 3 })))
            .expect(1)
            .mount(&server)
            .await;

        // No trailing slash: the endpoint is normalized
        let client =
            HttpInferenceClient::from_url(&format!("{}/api", server.uri())).expect("client");
        let result = client.predict(&payload()).await.expect("predict");
        assert_eq!(result.digit.value(), 3);
        assert!(result.probabilities.is_none());
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn server_error_is_rejected_with_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "detail": "cannot identify image file" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .predict(&payload())
            .await
            .expect_err("500");
        match err {
            InferenceError::Rejected { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "cannot identify image file");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn missing_digit_is_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "label": 3 })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .predict(&payload())
            .await
            .expect_err("protocol");
        assert!(matches!(err, InferenceError::Protocol(_)));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn unreachable_service_is_network_error() {
        // Reserve a port, then free it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let client = HttpInferenceClient::from_url(&format!("http://{addr}/")).expect("client");

        let err = client.predict(&payload()).await.expect_err("refused");
        assert!(matches!(err, InferenceError::Network(_)));
        assert_eq!(err.user_message(), "Could not reach the backend.");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn status_reads_root_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "MNIST Serverless API is running!"
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).status().await.expect("status");
        assert_eq!(status.message, "MNIST Serverless API is running!");
    }
}
