//! HTTP client for the benchmark service running on each device

use crate::{
    error::{AppError, Result},
    logging::NetworkLogger,
    models::{Config, Device},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::{Duration, Instant};

/// Device HTTP client trait for abstraction and testing
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Ask the device at `address` for its name and MAC address (`GET /mac`)
    async fn identify(&self, address: &str) -> Result<Device>;

    /// Issue a report request. Any HTTP status is returned as a response;
    /// only transport failures are errors.
    async fn fetch(&self, request: &ReportRequest) -> Result<ReportResponse>;
}

/// A GET request against one device
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    /// IP address or host name of the device that runs the benchmark
    pub host: String,
    pub path: &'static str,
    /// Query pairs in order; keys may repeat
    pub query: Vec<(String, String)>,
}

impl ReportRequest {
    /// `receiver` measures the throughput of data pulled from `sender`
    pub fn throughput(receiver: &Device, sender: &Device, iterations: Option<u32>) -> Self {
        let mut query = vec![("target".to_string(), sender.mac.clone())];
        if let Some(iterations) = iterations {
            query.push(("iterations".to_string(), iterations.to_string()));
        }

        Self {
            host: receiver.ip.clone(),
            path: "/throughput",
            query,
        }
    }

    /// `master` sends `message_count` messages to every target
    pub fn messages(master: &Device, targets: &[Device], message_count: u32, message_size: Option<u32>) -> Self {
        let mut query: Vec<(String, String)> = targets
            .iter()
            .map(|t| ("target".to_string(), t.mac.clone()))
            .collect();
        query.push(("messages".to_string(), message_count.to_string()));
        if let Some(size) = message_size {
            query.push(("size".to_string(), size.to_string()));
        }

        Self {
            host: master.ip.clone(),
            path: "/messages",
            query,
        }
    }

    /// Launch a token run on `master`, passing the token around `others`
    pub fn token_launch(master: &Device, others: &[Device], payload_length: u32, rounds: u32) -> Self {
        let mut query: Vec<(String, String)> = others
            .iter()
            .map(|d| ("devices".to_string(), d.mac.clone()))
            .collect();
        query.push(("payloadLength".to_string(), payload_length.to_string()));
        query.push(("rounds".to_string(), rounds.to_string()));

        Self {
            host: master.ip.clone(),
            path: "/token",
            query,
        }
    }

    /// Poll the results of the token run `run_id`
    pub fn token_results(master: &Device, run_id: &str) -> Self {
        Self {
            host: master.ip.clone(),
            path: "/tokres",
            query: vec![("uuid".to_string(), run_id.to_string())],
        }
    }
}

/// Status and raw body of a device answer
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ReportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The device has no results yet (HTTP 204)
    pub fn is_pending(&self) -> bool {
        self.status == StatusCode::NO_CONTENT.as_u16()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// reqwest-backed implementation of [`DeviceClient`]
pub struct HttpDeviceClient {
    client: Client,
    port: u16,
    logger: NetworkLogger,
}

impl HttpDeviceClient {
    /// Create a client using the port and timeout of the configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_settings(config.port, config.timeout(), NetworkLogger::new(config))
    }

    pub fn with_settings(port: u16, timeout: Duration, logger: NetworkLogger) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, port, logger })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Build `http://{host}:{port}{path}?{query}`
    pub fn url_for(&self, host: &str, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("http://{}:{}{}", host, self.port, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<ReportResponse> {
        let started = Instant::now();
        let outcome = self.client.get(url.clone()).send().await;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                self.logger
                    .log_http_request(url.as_str(), "GET", None, elapsed_ms(started))
                    .await;
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        self.logger
            .log_http_request(url.as_str(), "GET", Some(status), elapsed_ms(started))
            .await;

        Ok(ReportResponse { status, body })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    async fn identify(&self, address: &str) -> Result<Device> {
        let url = self
            .url_for(address, "/mac", &[])
            .map_err(|e| AppError::discovery(format!("Invalid device address '{}': {}", address, e)))?;

        let response = self
            .get(url)
            .await
            .map_err(|e| AppError::discovery(format!("Device at {} is unreachable: {}", address, e)))?;

        if !response.is_success() {
            return Err(AppError::discovery(format!(
                "Device at {} answered /mac with HTTP {}",
                address, response.status
            )));
        }

        Device::from_identity(address, &response.text())
    }

    async fn fetch(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let url = self.url_for(&request.host, request.path, &request.query)?;
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn device(name: &str, ip: &str, mac: &str) -> Device {
        Device::new(name, ip, mac).unwrap()
    }

    fn test_client(server: &MockServer, timeout: Duration) -> HttpDeviceClient {
        let config = Config {
            enable_color: false,
            ..Config::default()
        };
        HttpDeviceClient::with_settings(server.address().port(), timeout, NetworkLogger::new(&config)).unwrap()
    }

    fn host(server: &MockServer) -> String {
        server.address().ip().to_string()
    }

    #[test]
    fn test_throughput_request_query() {
        let receiver = device("n4", "192.168.1.100", "40:B0:FA:5F:26:8A");
        let sender = device("n5", "192.168.1.107", "BC:F5:AC:5C:50:87");

        let request = ReportRequest::throughput(&receiver, &sender, Some(10));
        assert_eq!(request.host, "192.168.1.100");
        assert_eq!(request.path, "/throughput");
        assert_eq!(
            request.query,
            vec![
                ("target".to_string(), "BC:F5:AC:5C:50:87".to_string()),
                ("iterations".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_messages_request_repeats_targets() {
        let master = device("n4", "10.0.0.1", "40:B0:FA:5F:26:8A");
        let targets = vec![
            device("n5", "10.0.0.2", "BC:F5:AC:5C:50:87"),
            device("mi", "10.0.0.3", "74:51:BA:46:90:A2"),
        ];

        let request = ReportRequest::messages(&master, &targets, 40, None);
        let keys: Vec<&str> = request.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["target", "target", "messages"]);
    }

    #[test]
    fn test_url_for_encodes_query() {
        let config = Config::default();
        let client = HttpDeviceClient::new(&config).unwrap();
        let url = client
            .url_for("10.0.0.1", "/throughput", &[("target".to_string(), "40:B0:FA:5F:26:8A".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:38080/throughput?target=40%3AB0%3AFA%3A5F%3A26%3A8A");
    }

    #[test]
    fn test_response_status_helpers() {
        let ok = ReportResponse { status: 200, body: b"a,b\n".to_vec() };
        let pending = ReportResponse { status: 204, body: Vec::new() };
        let failed = ReportResponse { status: 500, body: Vec::new() };

        assert!(ok.is_success() && !ok.is_pending());
        assert!(pending.is_success() && pending.is_pending());
        assert!(!failed.is_success());
        assert_eq!(ok.text(), "a,b\n");
    }

    #[tokio::test]
    async fn test_identify_device() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mac"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Nexus 5\nBC:F5:AC:5C:50:87"))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let found = client.identify(&host(&server)).await.unwrap();
        assert_eq!(found.name, "Nexus 5");
        assert_eq!(found.mac, "BC:F5:AC:5C:50:87");
        assert_eq!(found.ip, host(&server));
    }

    #[tokio::test]
    async fn test_identify_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mac"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let error = client.identify(&host(&server)).await.unwrap_err();
        assert_eq!(error.category(), "DISCOVERY");
        assert!(error.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_identify_unreachable_device() {
        let server = MockServer::start().await;
        let client = test_client(&server, Duration::from_secs(2));
        // Nothing listens on port 9 of the loopback address
        let unreachable = HttpDeviceClient { port: 9, ..client };
        let error = unreachable.identify("127.0.0.1").await.unwrap_err();
        assert_eq!(error.category(), "DISCOVERY");
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_body_and_status() {
        let server = MockServer::start().await;
        let body = "from,to,bytes,nanotime\nn5,n4,1000,1000000000\n";
        Mock::given(method("GET"))
            .and(path("/throughput"))
            .and(query_param("target", "BC:F5:AC:5C:50:87"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let receiver = device("n4", &host(&server), "40:B0:FA:5F:26:8A");
        let sender = device("n5", "10.0.0.2", "BC:F5:AC:5C:50:87");

        let response = client
            .fetch(&ReportRequest::throughput(&receiver, &sender, None))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, body.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_passes_error_status_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("must specify at least a target"))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_secs(5));
        let master = device("n4", &host(&server), "40:B0:FA:5F:26:8A");
        let response = client
            .fetch(&ReportRequest::messages(&master, &[], 40, None))
            .await
            .unwrap();
        assert_eq!(response.status, 400);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_recoverable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/throughput"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = test_client(&server, Duration::from_millis(200));
        let receiver = device("n4", &host(&server), "40:B0:FA:5F:26:8A");
        let sender = device("n5", "10.0.0.2", "BC:F5:AC:5C:50:87");

        let error = client
            .fetch(&ReportRequest::throughput(&receiver, &sender, None))
            .await
            .unwrap_err();
        assert_eq!(error.category(), "TIMEOUT");
        assert!(error.is_recoverable());
    }
}
