//! Fare API HTTP client.
//!
//! Sends a single POST per station pair and classifies the response. No
//! retries are attempted; every failure goes straight back to the caller.

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::FareError;
use super::types::{FareKey, FareRecord};

/// Default fare API endpoint (Taipei Metro ticket info).
const DEFAULT_ENDPOINT: &str = "https://web.metro.taipei/apis/metrostationapi/ticketinfo";

/// Language requested from the fare API.
const DEFAULT_LANGUAGE: &str = "tw";

/// Number of body characters kept in error messages.
const PREVIEW_CHARS: usize = 200;

/// Something that can produce a fare record for a station pair.
///
/// Implemented by [`FareClient`] for the real API.
pub trait FareSource: Send + Sync {
    /// Fetch the fare for `key`.
    fn resolve(&self, key: &FareKey) -> impl Future<Output = Result<FareRecord, FareError>> + Send;
}

/// Configuration for the fare API client.
#[derive(Debug, Clone)]
pub struct FareClientConfig {
    /// Full URL of the ticket info endpoint
    pub endpoint: String,
    /// Value sent as `Lang`
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
}

impl FareClientConfig {
    /// Create a config pointing at the production endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }

    /// Set a custom endpoint (for testing).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the requested language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Accept invalid TLS certificates from the endpoint.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Default for FareClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body expected by the ticket info endpoint.
#[derive(Debug, Serialize)]
struct TicketInfoRequest<'a> {
    #[serde(rename = "StartSID")]
    start_sid: &'a str,
    #[serde(rename = "EndSID")]
    end_sid: &'a str,
    #[serde(rename = "Lang")]
    lang: &'a str,
}

/// Fare API client.
#[derive(Debug, Clone)]
pub struct FareClient {
    http: reqwest::Client,
    endpoint: String,
    language: String,
}

impl FareClient {
    /// Create a new fare API client with the given configuration.
    pub fn new(config: FareClientConfig) -> Result<Self, FareError> {
        if config.accept_invalid_certs {
            warn!(endpoint = %config.endpoint, "TLS certificate validation disabled for fare API");
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            language: config.language,
        })
    }

    /// Fetch the fare for a station pair from the API.
    pub async fn fetch(&self, key: &FareKey) -> Result<FareRecord, FareError> {
        let request = TicketInfoRequest {
            start_sid: &key.origin_id,
            end_sid: &key.destination_id,
            lang: &self.language,
        };

        debug!(endpoint = %self.endpoint, %key, "requesting fare");
        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        debug!(status, %key, "fare API responded");
        parse_response(status, content_type.as_deref(), &body)
    }

    /// The endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl FareSource for FareClient {
    async fn resolve(&self, key: &FareKey) -> Result<FareRecord, FareError> {
        self.fetch(key).await
    }
}

/// Classify a fare API response.
///
/// Checked in order: status, declared content type, body shape.
fn parse_response(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<FareRecord, FareError> {
    if status != 200 {
        warn!(status, preview = %preview(body), "fare API request failed");
        return Err(FareError::RemoteStatus {
            status,
            preview: preview(body),
        });
    }

    let content_type = content_type.unwrap_or_default();
    if !content_type.contains("application/json") {
        return Err(FareError::UnexpectedContentType {
            content_type: content_type.to_string(),
            preview: preview(body),
        });
    }

    serde_json::from_str(body).map_err(|e| FareError::Decode {
        message: e.to_string(),
        preview: preview(body),
    })
}

/// First [`PREVIEW_CHARS`] characters of a body, marked when truncated.
fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let mut out: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD_JSON: &str = r#"{"StartSID":"BL12","EndSID":"BR09","StartStationName":"台北車站","EndStationName":"大安","DeductedFare":"20","Discount60":"8","Discount40":"12","Lang":"tw"}"#;

    #[test]
    fn config_defaults() {
        let config = FareClientConfig::new();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.language, "tw");
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn config_builder() {
        let config = FareClientConfig::new()
            .with_endpoint("http://localhost:8080/ticketinfo")
            .with_language("en")
            .with_timeout(5)
            .with_accept_invalid_certs(true);

        assert_eq!(config.endpoint, "http://localhost:8080/ticketinfo");
        assert_eq!(config.language, "en");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn client_creation() {
        assert!(FareClient::new(FareClientConfig::new()).is_ok());
        assert!(FareClient::new(FareClientConfig::new().with_accept_invalid_certs(true)).is_ok());
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(TicketInfoRequest {
            start_sid: "BL12",
            end_sid: "BR09",
            lang: "tw",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"StartSID": "BL12", "EndSID": "BR09", "Lang": "tw"})
        );
    }

    #[test]
    fn parse_success() {
        let record = parse_response(200, Some("application/json; charset=utf-8"), RECORD_JSON)
            .unwrap();
        assert_eq!(record.key(), FareKey::new("BL12", "BR09"));
        assert_eq!(record.fare_amount, "20");
    }

    #[test]
    fn parse_success_without_discounts_or_language() {
        let body = r#"{"StartSID":"BL12","EndSID":"BR09","StartStationName":"台北車站","EndStationName":"大安","DeductedFare":"20"}"#;
        let record = parse_response(200, Some("application/json"), body).unwrap();
        assert_eq!(record.fare().unwrap(), 20);
        assert!(record.language.is_empty());
    }

    #[test]
    fn non_success_status_is_remote_status() {
        let err = parse_response(500, Some("application/json"), "boom").unwrap_err();
        assert!(matches!(
            err,
            FareError::RemoteStatus { status: 500, ref preview } if preview == "boom"
        ));

        // Any status other than 200 is rejected, even other 2xx codes
        let err = parse_response(204, Some("application/json"), "").unwrap_err();
        assert!(matches!(err, FareError::RemoteStatus { status: 204, .. }));
    }

    #[test]
    fn non_json_content_type_is_rejected() {
        let err = parse_response(200, Some("text/html"), "<html>maintenance</html>").unwrap_err();
        assert!(matches!(
            err,
            FareError::UnexpectedContentType { ref content_type, ref preview }
                if content_type == "text/html" && preview == "<html>maintenance</html>"
        ));

        let err = parse_response(200, None, RECORD_JSON).unwrap_err();
        assert!(matches!(err, FareError::UnexpectedContentType { ref content_type, .. } if content_type.is_empty()));
    }

    #[test]
    fn unparseable_json_is_decode_error() {
        let err = parse_response(200, Some("application/json"), r#"{"StartSID":1}"#).unwrap_err();
        assert!(matches!(err, FareError::Decode { .. }));

        let err = parse_response(200, Some("application/json"), "not json").unwrap_err();
        assert!(matches!(err, FareError::Decode { ref preview, .. } if preview == "not json"));
    }

    #[test]
    fn preview_is_bounded() {
        assert_eq!(preview("short"), "short");

        let exact = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = "捷".repeat(PREVIEW_CHARS + 50);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    mod upstream {
        use super::*;
        use axum::http::{StatusCode, header};
        use axum::response::IntoResponse;
        use axum::{Json, Router, routing::post};

        /// Serve `app` on an ephemeral local port and return its base URL.
        async fn serve(app: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{addr}")
        }

        fn client(base: &str) -> FareClient {
            FareClient::new(FareClientConfig::new().with_endpoint(format!("{base}/ticketinfo")))
                .unwrap()
        }

        #[tokio::test]
        async fn fetch_posts_pair_and_parses_record() {
            async fn echo(Json(req): Json<serde_json::Value>) -> impl IntoResponse {
                Json(serde_json::json!({
                    "StartSID": req["StartSID"],
                    "EndSID": req["EndSID"],
                    "StartStationName": "台北車站",
                    "EndStationName": "大安",
                    "DeductedFare": "20",
                    "Discount60": "8",
                    "Discount40": "12",
                    "Lang": req["Lang"],
                }))
            }
            let base = serve(Router::new().route("/ticketinfo", post(echo))).await;

            let record = client(&base)
                .fetch(&FareKey::new("BL12", "BR09"))
                .await
                .unwrap();
            assert_eq!(record.origin_id, "BL12");
            assert_eq!(record.destination_id, "BR09");
            assert_eq!(record.language, "tw");
        }

        #[tokio::test]
        async fn failures_are_distinguishable() {
            let app = Router::new()
                .route(
                    "/status/ticketinfo",
                    post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
                )
                .route(
                    "/html/ticketinfo",
                    post(|| async {
                        ([(header::CONTENT_TYPE, "text/html")], "<html></html>")
                    }),
                )
                .route(
                    "/garbage/ticketinfo",
                    post(|| async {
                        ([(header::CONTENT_TYPE, "application/json")], "{not json")
                    }),
                );
            let base = serve(app).await;
            let key = FareKey::new("BL12", "BR09");

            let err = client(&format!("{base}/status")).fetch(&key).await.unwrap_err();
            assert!(matches!(err, FareError::RemoteStatus { status: 502, .. }));

            let err = client(&format!("{base}/html")).fetch(&key).await.unwrap_err();
            assert!(matches!(err, FareError::UnexpectedContentType { .. }));

            let err = client(&format!("{base}/garbage")).fetch(&key).await.unwrap_err();
            assert!(matches!(err, FareError::Decode { .. }));
        }

        #[tokio::test]
        async fn unreachable_endpoint_is_transport_error() {
            // Bind then drop to get a port nobody is listening on
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let err = client(&format!("http://{addr}"))
                .fetch(&FareKey::new("BL12", "BR09"))
                .await
                .unwrap_err();
            assert!(matches!(err, FareError::Transport(_)));
        }
    }
}
