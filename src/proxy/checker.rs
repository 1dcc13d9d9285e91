//! Probe classifier: one request through a proxy, one verdict

use crate::error::ProbeError;
use crate::proxy::models::{ProbeOutcome, ProxyAddress};
use crate::proxy::parser::ProxyParser;
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout for proxy checks in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default IP echo service
pub const DEFAULT_ECHO_URL: &str = "http://ifconfig.me";

/// Fetches the echo service body through a proxy.
///
/// Implementations make at most one round trip per call and never retry.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    async fn fetch(&self, proxy: &ProxyAddress) -> Result<String, ProbeError>;
}

/// reqwest-backed transport with a hard per-probe timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    echo_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(echo_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            echo_url: echo_url.into(),
            timeout,
        }
    }

    pub fn echo_url(&self) -> &str {
        &self.echo_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the echo service for our own IP without any proxy.
    pub async fn fetch_direct(&self) -> Result<String, ProbeError> {
        let client = Client::builder()
            .no_proxy()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        let body = self.get_body(&client).await?;
        Ok(ProxyParser::normalize_reported_ip(&body))
    }

    /// Create a reqwest client that sends everything through the proxy
    fn create_client(&self, proxy: &ProxyAddress) -> Result<Client, ProbeError> {
        let reqwest_proxy = ReqwestProxy::all(proxy.url().clone())
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))
    }

    async fn get_body(&self, client: &Client) -> Result<String, ProbeError> {
        let request = async {
            let response = client
                .get(&self.echo_url)
                .send()
                .await
                .map_err(ProbeError::from_request)?;

            if !response.status().is_success() {
                return Err(ProbeError::HttpStatus(response.status().as_u16()));
            }

            response
                .text()
                .await
                .map_err(|e| if e.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Read(e.to_string())
                })
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl EchoTransport for HttpTransport {
    async fn fetch(&self, proxy: &ProxyAddress) -> Result<String, ProbeError> {
        let client = self.create_client(proxy)?;
        self.get_body(&client).await
    }
}

/// Compare what the echo service saw with the proxy's own host.
///
/// Plain, case-sensitive string equality.
pub fn judge(proxy: &ProxyAddress, body: &str) -> ProbeOutcome {
    let reported_ip = ProxyParser::normalize_reported_ip(body);
    if reported_ip == proxy.host() {
        ProbeOutcome::Valid(reported_ip)
    } else {
        ProbeOutcome::Invalid(reported_ip)
    }
}

/// Stateless classifier shared by every worker
#[derive(Clone)]
pub struct ProbeClassifier {
    transport: Arc<dyn EchoTransport>,
}

impl ProbeClassifier {
    pub fn new(transport: impl EchoTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_arc(transport: Arc<dyn EchoTransport>) -> Self {
        Self { transport }
    }

    /// Classify one candidate address.
    ///
    /// Unparsable addresses are rejected before any network activity.
    pub async fn classify(&self, address: &str) -> ProbeOutcome {
        let proxy = match ProxyParser::parse_line(address) {
            Ok(proxy) => proxy,
            Err(e) => return ProbeOutcome::ProbeError(e),
        };

        match self.transport.fetch(&proxy).await {
            Ok(body) => judge(&proxy, &body),
            Err(e) => {
                debug!(proxy = %proxy, error = %e, "probe failed");
                ProbeOutcome::ProbeError(e)
            }
        }
    }
}

impl Default for ProbeClassifier {
    fn default() -> Self {
        Self::new(HttpTransport::default())
    }
}
