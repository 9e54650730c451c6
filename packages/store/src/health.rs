//! Backend connectivity check against `GET {api}/health`.

use std::fmt;
use std::time::Duration;

/// Hard limit on a single health request.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    /// The health endpoint answered with a success status.
    Connected,
    /// The server answered with a non-success status.
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, if known.
        reason: String,
    },
    /// No answer within the timeout.
    Timeout,
    /// The request could not be made.
    Unreachable {
        /// Human-readable description.
        message: String,
    },
}

impl ServerStatus {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Connected to server"),
            Self::ServerError { status, reason } => {
                write!(f, "Server error: {status} {reason}")
            }
            Self::Timeout => f.write_str("Connection timeout. Server not responding."),
            Self::Unreachable { message } => f.write_str(message),
        }
    }
}

/// Checks the backend with the default [`HEALTH_TIMEOUT`].
pub async fn check_health(client: &reqwest::Client, api_url: &str) -> ServerStatus {
    check_health_with_timeout(client, api_url, HEALTH_TIMEOUT).await
}

/// Checks the backend, giving up after `timeout`.
pub async fn check_health_with_timeout(
    client: &reqwest::Client,
    api_url: &str,
    timeout: Duration,
) -> ServerStatus {
    let url = format!("{}/health", api_url.trim_end_matches('/'));
    log::debug!("Checking server health at {url}");

    let status = match tokio::time::timeout(timeout, client.get(&url).send()).await {
        Err(_) => ServerStatus::Timeout,
        Ok(Ok(resp)) if resp.status().is_success() => ServerStatus::Connected,
        Ok(Ok(resp)) => ServerStatus::ServerError {
            status: resp.status().as_u16(),
            reason: resp
                .status()
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
        },
        Ok(Err(e)) if e.is_timeout() => ServerStatus::Timeout,
        Ok(Err(e)) if e.is_connect() => ServerStatus::Unreachable {
            message: format!("Cannot connect to server at {api_url}. Is it running?"),
        },
        Ok(Err(e)) => ServerStatus::Unreachable {
            message: format!("Connection error: {e}"),
        },
    };

    if status.is_connected() {
        log::debug!("{status}");
    } else {
        log::warn!("{status}");
    }
    status
}
