use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} is required")]
    Validation(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Auth(String),

    #[error("session expired - stored token no longer accepted")]
    SessionExpired,

    #[error("server error: {0}")]
    Server(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("credential storage error: {0}")]
    Storage(#[from] keyring::Error),

    #[error("not implemented by the service")]
    NotImplemented,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error envelope the identity service returns on failure.
/// Older deployments use `message` instead of `error` for the detail text.
#[derive(Deserialize)]
struct ServiceError {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data.
    /// The cut lands on a char boundary so multibyte text cannot split
    /// mid-character.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    /// Pull the human-readable detail out of a service error body, if any.
    fn service_message(body: &str) -> Option<String> {
        serde_json::from_str::<ServiceError>(body)
            .ok()
            .and_then(|e| e.error.or(e.message))
            .filter(|m| !m.is_empty())
    }

    /// Map a non-success status from the signup/confirm/login endpoints.
    /// A 401 here means the submitted credentials were rejected, not that a
    /// session lapsed, so it stays a plain auth failure.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::service_message(body);
        match status.as_u16() {
            400..=499 => {
                ApiError::Auth(message.unwrap_or_else(|| format!("Request failed ({})", status)))
            }
            500..=599 => ApiError::Server(message.unwrap_or_else(|| Self::truncate_body(body))),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// Same mapping for endpoints called with a stored credential, where a
    /// 401 means the token is no longer valid.
    pub fn from_protected_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            ApiError::SessionExpired
        } else {
            Self::from_status(status, body)
        }
    }
}
