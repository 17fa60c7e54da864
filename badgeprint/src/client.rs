//!
//! PrintNode client
//!
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use async_trait::async_trait;
use base64::Engine;
use log::{debug, warn};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::{de::IgnoredAny, Deserialize, Serialize};

use crate::{
    backend::PrintBackend,
    error::PrintError,
    model::{Availability, Capabilities, JobId, PrintTarget, TargetId},
    payload::TransportPayload,
    request::{Duplex, Orientation, PrintJobRequest},
    USER_AGENT,
};

/// Public PrintNode API endpoint
pub const PRINTNODE_URL: &str = "https://api.printnode.com";

/// Default timeout for API requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CONTENT_TYPE_PDF_BASE64: &str = "pdf_base64";

/// Builder to create PrintNode client
pub struct PrintNodeClientBuilder {
    base_url: String,
    request_timeout: Duration,
    headers: BTreeMap<String, String>,
}

impl PrintNodeClientBuilder {
    fn new<K: AsRef<str>>(api_key: K) -> Self {
        PrintNodeClientBuilder {
            base_url: PRINTNODE_URL.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            headers: BTreeMap::new(),
        }
        .basic_auth(api_key, "")
    }

    /// Override the API endpoint. Default is the public PrintNode API.
    pub fn base_url<S>(mut self, url: S) -> Self
    where
        S: AsRef<str>,
    {
        self.base_url = url.as_ref().trim_end_matches('/').to_owned();
        self
    }

    /// Set network request timeout. Default is 30 seconds.
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = duration;
        self
    }

    /// Add a custom HTTP header
    pub fn http_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.headers
            .insert(key.as_ref().to_ascii_lowercase(), value.as_ref().to_owned());
        self
    }

    /// Add basic auth header (RFC 7617). PrintNode expects the API key as user name.
    pub fn basic_auth<U, P>(mut self, username: U, password: P) -> Self
    where
        U: AsRef<str>,
        P: AsRef<str>,
    {
        let authz =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username.as_ref(), password.as_ref()));
        self.headers
            .insert("authorization".to_owned(), format!("Basic {authz}"));
        self
    }

    /// Build the client
    pub fn build(self) -> PrintNodeClient {
        PrintNodeClient(self)
    }
}

/// Asynchronous PrintNode client.
///
/// Talks to the `/printers` and `/printjobs` endpoints of the PrintNode REST API.
pub struct PrintNodeClient(PrintNodeClientBuilder);

impl PrintNodeClient {
    /// Create client with default options
    pub fn new<K: AsRef<str>>(api_key: K) -> Self {
        PrintNodeClient::builder(api_key).build()
    }

    /// Create client builder for setting extra options
    pub fn builder<K: AsRef<str>>(api_key: K) -> PrintNodeClientBuilder {
        PrintNodeClientBuilder::new(api_key)
    }

    /// Return API endpoint
    pub fn base_url(&self) -> &str {
        &self.0.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.0.request_timeout
    }

    fn http_client(&self) -> Result<Client, reqwest::Error> {
        ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.0.request_timeout)
            .user_agent(USER_AGENT)
            .build()
    }

    fn with_headers(&self, mut builder: RequestBuilder) -> RequestBuilder {
        for (k, v) in &self.0.headers {
            builder = builder.header(k, v);
        }
        builder
    }

    fn submit_error(&self, error: reqwest::Error) -> PrintError {
        if error.is_timeout() {
            PrintError::SubmitTimeout(self.0.request_timeout)
        } else {
            PrintError::Submit(error)
        }
    }
}

#[async_trait]
impl PrintBackend for PrintNodeClient {
    async fn list_targets(&self) -> Result<Vec<PrintTarget>, PrintError> {
        let client = self.http_client().map_err(|e| PrintError::Discovery(e.to_string()))?;

        let response = self
            .with_headers(client.get(format!("{}/printers", self.0.base_url)))
            .send()
            .await
            .map_err(|e| PrintError::Discovery(e.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = error_details(response).await;
            warn!("Printer discovery rejected with {status}: {message}");
            return Err(PrintError::Discovery(format!("HTTP status {status}: {message}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PrintError::Discovery(e.to_string()))?;
        let printers: Vec<WirePrinter> =
            serde_json::from_slice(&body).map_err(|e| PrintError::Discovery(e.to_string()))?;

        debug!("Discovered {} printers", printers.len());
        Ok(printers.into_iter().map(PrintTarget::from).collect())
    }

    async fn submit(
        &self,
        target: &TargetId,
        payload: &TransportPayload,
        job: &PrintJobRequest,
    ) -> Result<JobId, PrintError> {
        let client = self.http_client().map_err(PrintError::Submit)?;
        let body = serde_json::to_vec(&WirePrintJob::new(target, payload, job))?;

        debug!(
            "Sending print job '{}' to printer {} ({} payload chars)",
            job.title(),
            target,
            payload.as_str().len()
        );

        let response = self
            .with_headers(client.post(format!("{}/printjobs", self.0.base_url)))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.submit_error(e))?;

        if !response.status().is_success() {
            let (status, message) = error_details(response).await;
            return Err(PrintError::SubmitRejected { status, message });
        }

        let body = response.bytes().await.map_err(|e| self.submit_error(e))?;
        let job_id = JobId(serde_json::from_slice(&body)?);
        debug!("Print job {} accepted by printer {}", job_id, target);
        Ok(job_id)
    }
}

async fn error_details(response: Response) -> (u16, String) {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let status = response.status();
    let fallback = status.canonical_reason().unwrap_or("request failed").to_owned();
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(fallback),
        Err(_) => fallback,
    };
    (status.as_u16(), message)
}

#[derive(Deserialize)]
struct WirePrinter {
    id: TargetId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    capabilities: Option<WireCapabilities>,
}

#[derive(Deserialize, Default)]
struct WireCapabilities {
    #[serde(default)]
    color: Option<bool>,
    #[serde(default)]
    duplex: Option<bool>,
    #[serde(default)]
    papers: Option<BTreeMap<String, IgnoredAny>>,
}

impl From<WirePrinter> for PrintTarget {
    fn from(printer: WirePrinter) -> Self {
        let caps = printer.capabilities.unwrap_or_default();
        PrintTarget {
            id: printer.id,
            display_name: printer.name,
            description: printer.description,
            availability: match printer.state.as_deref() {
                Some("online") => Availability::Online,
                _ => Availability::Offline,
            },
            capabilities: Capabilities {
                supports_color: caps.color.unwrap_or(false),
                supports_duplex: caps.duplex.unwrap_or(false),
                paper_formats: caps
                    .papers
                    .map(|p| p.into_keys().collect())
                    .unwrap_or_else(BTreeSet::new),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePrintJob<'a> {
    printer_id: &'a TargetId,
    title: &'a str,
    content_type: &'static str,
    content: &'a str,
    source: &'a str,
    options: WireJobOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireJobOptions<'a> {
    copies: u32,
    color: bool,
    dpi: String,
    orientation: Orientation,
    page_ranges: &'static str,
    pages: u32,
    sizing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    paper: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duplex: Option<Duplex>,
}

impl<'a> WirePrintJob<'a> {
    fn new(target: &'a TargetId, payload: &'a TransportPayload, job: &'a PrintJobRequest) -> Self {
        let options = job.options();
        WirePrintJob {
            printer_id: target,
            title: job.title(),
            content_type: CONTENT_TYPE_PDF_BASE64,
            content: payload.as_str(),
            source: job.source(),
            options: WireJobOptions {
                copies: options.copies,
                color: options.color,
                dpi: options.resolution_dpi().to_string(),
                orientation: options.orientation,
                page_ranges: "",
                pages: 0,
                sizing: "fit",
                paper: options.paper_format.as_deref(),
                duplex: match options.duplex {
                    Duplex::LongEdge | Duplex::ShortEdge => Some(options.duplex),
                    Duplex::None | Duplex::Unsupported => None,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        locator::DocumentLocator,
        payload::{Base64Encoder, Document, PayloadEncoder},
        testutil::{serve_capture, serve_once, serve_silent},
    };

    use super::*;

    const PRINTERS: &str = r#"[
        {
            "id": 34,
            "computer": {"id": 12, "name": "FRONTDESK"},
            "name": "Zebra ZD421",
            "description": "Badge printer",
            "capabilities": {
                "color": false,
                "duplex": false,
                "papers": {"Badge 4x3": [1016, 762], "A6": null}
            },
            "default": true,
            "state": "online"
        },
        {
            "id": 35,
            "name": "Office Laser",
            "capabilities": null,
            "state": "offline"
        }
    ]"#;

    fn job(target: &str) -> PrintJobRequest {
        PrintJobRequest::builder(DocumentLocator::local("/tmp/badge.pdf"))
            .target(target)
            .copies(2)
            .high_quality(false)
            .paper_format("A6")
            .duplex(Duplex::LongEdge)
            .build()
            .unwrap()
    }

    fn payload() -> TransportPayload {
        Base64Encoder.encode(&Document::from(b"%PDF-1.4".to_vec())).unwrap()
    }

    #[test]
    fn test_print_job_body() {
        let job = job("34");
        let payload = payload();
        let target = TargetId::from("34");
        let body = serde_json::to_value(WirePrintJob::new(&target, &payload, &job)).unwrap();

        assert_eq!(
            body,
            json!({
                "printerId": 34,
                "title": "Badge Printing",
                "contentType": "pdf_base64",
                "content": "JVBERi0xLjQ=",
                "source": "Attendee Registration App",
                "options": {
                    "copies": 2,
                    "color": true,
                    "dpi": "300",
                    "orientation": "portrait",
                    "pageRanges": "",
                    "pages": 0,
                    "sizing": "fit",
                    "paper": "A6",
                    "duplex": "long-edge"
                }
            })
        );
    }

    #[test]
    fn test_print_job_body_omits_unsupported_duplex() {
        let job = PrintJobRequest::builder(DocumentLocator::local("/tmp/badge.pdf"))
            .duplex(Duplex::Unsupported)
            .build()
            .unwrap();
        let payload = payload();
        let target = TargetId::from("front-desk");
        let body = serde_json::to_value(WirePrintJob::new(&target, &payload, &job)).unwrap();

        assert_eq!(body["printerId"], json!("front-desk"));
        assert!(body["options"].get("duplex").is_none());
        assert!(body["options"].get("paper").is_none());
    }

    #[tokio::test]
    async fn test_list_targets() {
        let (uri, request) = serve_capture(200, "application/json", PRINTERS.as_bytes().to_vec()).await;
        let client = PrintNodeClient::builder("secret").base_url(uri).build();

        let targets = client.list_targets().await.unwrap();
        assert_eq!(targets.len(), 2);

        let zebra = &targets[0];
        assert_eq!(zebra.id, TargetId::from("34"));
        assert!(zebra.is_online());
        assert_eq!(zebra.description.as_deref(), Some("Badge printer"));
        assert!(zebra.capabilities.paper_formats.contains("Badge 4x3"));
        assert!(zebra.capabilities.paper_formats.contains("A6"));

        let laser = &targets[1];
        assert_eq!(laser.availability, Availability::Offline);
        assert_eq!(laser.capabilities, Capabilities::default());

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /printers "));
        let authz = request
            .lines()
            .find(|l| l.to_ascii_lowercase().starts_with("authorization:"))
            .unwrap();
        // "secret:" in base64
        assert!(authz.ends_with("Basic c2VjcmV0Og=="));
    }

    #[tokio::test]
    async fn test_list_targets_unauthorized() {
        let uri = serve_once(401, "application/json", br#"{"message": "API Key not found"}"#.to_vec()).await;
        let client = PrintNodeClient::builder("wrong").base_url(uri).build();

        match client.list_targets().await {
            Err(PrintError::Discovery(message)) => assert!(message.contains("API Key not found")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit() {
        let (uri, request) = serve_capture(201, "application/json", b"473".to_vec()).await;
        let client = PrintNodeClient::builder("secret")
            .base_url(format!("{uri}/"))
            .http_header("X-Child-Account-By-Id", "9")
            .build();

        let job_id = client
            .submit(&TargetId::from("34"), &payload(), &job("34"))
            .await
            .unwrap();
        assert_eq!(job_id, JobId(473));

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /printjobs "));
        assert!(request.to_ascii_lowercase().contains("x-child-account-by-id: 9"));
        assert!(request.contains(USER_AGENT));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["printerId"], json!(34));
        assert_eq!(body["content"], json!("JVBERi0xLjQ="));
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let uri = serve_once(400, "application/json", br#"{"message": "printer offline"}"#.to_vec()).await;
        let client = PrintNodeClient::builder("secret").base_url(uri).build();

        let result = client.submit(&TargetId::from("34"), &payload(), &job("34")).await;
        match result {
            Err(PrintError::SubmitRejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "printer offline");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_malformed_response() {
        let uri = serve_once(201, "text/html", b"<html>".to_vec()).await;
        let client = PrintNodeClient::builder("secret").base_url(uri).build();

        let result = client.submit(&TargetId::from("34"), &payload(), &job("34")).await;
        assert!(matches!(result, Err(PrintError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_submit_timeout() {
        let uri = serve_silent().await;
        let client = PrintNodeClient::builder("secret")
            .base_url(uri)
            .request_timeout(Duration::from_millis(200))
            .build();

        let result = client.submit(&TargetId::from("34"), &payload(), &job("34")).await;
        assert!(matches!(result, Err(PrintError::SubmitTimeout(_))));
        assert_eq!(result.unwrap_err().status(), crate::model::PrintStatus::SubmitFailed);
    }
}
