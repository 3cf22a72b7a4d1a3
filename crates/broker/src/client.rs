//! Thin HTTP client for the IBKR Client Portal gateway.

use orca_core::ProviderError;
use reqwest::StatusCode;
use std::time::Duration;

/// Wrapper around `reqwest` with error classification. The gateway serves a
/// self-signed certificate on localhost, so certificate verification is
/// relaxed for it.
pub struct CpClient {
    http: reqwest::Client,
    base_url: String,
}

impl CpClient {
    /// Creates a client for the given gateway base URL
    /// (e.g., `https://localhost:5000/v1/api`).
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError::Permanent`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Permanent {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn get(&self, endpoint: &str) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http.get(&url).send().await.map_err(classify_reqwest)?;
        Self::parse(response).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest)?;
        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> Result<serde_json::Value, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        response.json().await.map_err(|e| ProviderError::Permanent {
            reason: format!("malformed gateway response: {e}"),
        })
    }
}

/// Network-level failures (connect, timeout) are worth retrying; anything
/// else at this layer is not.
fn classify_reqwest(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        ProviderError::Transient {
            reason: err.to_string(),
        }
    } else {
        ProviderError::Permanent {
            reason: err.to_string(),
        }
    }
}

/// Rate limits and gateway-side errors are transient; other non-success
/// statuses are order rejections and propagate as permanent.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Transient {
            reason: format!("gateway returned {status}: {body}"),
        }
    } else {
        ProviderError::Permanent {
            reason: format!("gateway returned {status}: {body}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!classify_status(StatusCode::BAD_REQUEST, "insufficient funds").is_transient());
        assert!(!classify_status(StatusCode::UNAUTHORIZED, "").is_transient());
        assert!(!classify_status(StatusCode::NOT_FOUND, "").is_transient());
    }
}
