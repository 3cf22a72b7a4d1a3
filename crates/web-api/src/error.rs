use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orca_core::{Error, ProviderError};
use serde_json::json;

/// API-facing error: an HTTP status and a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::MalformedProposal { .. } | Error::Config { .. } => StatusCode::BAD_REQUEST,
            Error::UnknownTrade { .. } | Error::UnknownPosition { .. } => StatusCode::NOT_FOUND,
            Error::TerminalState { .. } => StatusCode::CONFLICT,
            Error::Provider(e) => return Self::from(e.clone()),
            Error::AuditWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        let status = match &err {
            ProviderError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProviderError::Permanent { .. } => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_core::TradeStatus;

    #[test]
    fn core_errors_map_to_expected_statuses() {
        let malformed = ApiError::from(Error::MalformedProposal {
            reason: "x".to_string(),
        });
        assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

        let unknown = ApiError::from(Error::UnknownTrade {
            id: "T-1".to_string(),
        });
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);

        let terminal = ApiError::from(Error::TerminalState {
            id: "T-1".to_string(),
            status: TradeStatus::Filled,
        });
        assert_eq!(terminal.status, StatusCode::CONFLICT);
    }

    #[test]
    fn provider_errors_split_by_retryability() {
        let transient = ApiError::from(ProviderError::Transient {
            reason: "timeout".to_string(),
        });
        assert_eq!(transient.status, StatusCode::SERVICE_UNAVAILABLE);

        let permanent = ApiError::from(ProviderError::Permanent {
            reason: "rejected".to_string(),
        });
        assert_eq!(permanent.status, StatusCode::BAD_GATEWAY);
    }
}
