//! HTTP probe abstraction and the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Real HTTP status code.
    Status(u16),
    /// Transport-level failure (DNS, connect, TLS, timeout, ...).
    Error(String),
    /// A response arrived but its status cannot be read, e.g. an opaque
    /// cross-origin response in a sandboxed environment.
    Unobservable,
    /// The request was cancelled before it completed.
    Aborted,
}

/// Performs one GET request per call.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url`. Implementations should return [`ProbeStatus::Aborted`]
    /// promptly once `cancel` fires instead of waiting for the request.
    async fn probe(&self, url: &str, cancel: &CancellationToken) -> ProbeStatus;
}

/// Settings for [`HttpProber`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
    pub accept_invalid_certs: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("pathscout/{}", env!("CARGO_PKG_VERSION")),
            follow_redirects: false,
            accept_invalid_certs: false,
        }
    }
}

/// Prober with direct network access: status codes are always observable.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(if config.follow_redirects {
                redirect::Policy::limited(10)
            } else {
                redirect::Policy::none()
            })
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, cancel: &CancellationToken) -> ProbeStatus {
        let request = self.client.get(url).send();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url, "probe aborted");
                ProbeStatus::Aborted
            }
            res = request => match res {
                // The body is never read; dropping the response releases the connection.
                Ok(resp) => ProbeStatus::Status(resp.status().as_u16()),
                Err(e) => {
                    warn!(url, error = %e, "probe failed");
                    ProbeStatus::Error(describe_error(&e))
                }
            },
        }
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    }
}
