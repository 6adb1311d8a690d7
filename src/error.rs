//! Unified client error model and classification helpers.
//! This module provides the common error enum surfaced by every access-layer
//! call, along with the mapping from HTTP response statuses to error kinds.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiError {
    /// Network unreachable, TLS failure, or an unreadable response body.
    Transport { message: String },
    /// The payload violated the wire schema for its endpoint.
    Decode { message: String },
    /// Authorization failed and could not be recovered by a token refresh.
    SessionExpired { message: String },
    /// 4xx other than 401, passed through for the caller to display.
    Validation { status: u16, message: String },
    /// 5xx, passed through untouched. No automatic retry.
    Server { status: u16, message: String },
    /// Local durable-storage failure (session vault IO).
    Io { message: String },
}

impl ApiError {
    pub fn transport<S: Into<String>>(msg: S) -> Self { ApiError::Transport { message: msg.into() } }
    pub fn decode<S: Into<String>>(msg: S) -> Self { ApiError::Decode { message: msg.into() } }
    pub fn session_expired<S: Into<String>>(msg: S) -> Self { ApiError::SessionExpired { message: msg.into() } }
    pub fn validation<S: Into<String>>(status: u16, msg: S) -> Self { ApiError::Validation { status, message: msg.into() } }
    pub fn server<S: Into<String>>(status: u16, msg: S) -> Self { ApiError::Server { status, message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { ApiError::Io { message: msg.into() } }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport { message }
            | ApiError::Decode { message }
            | ApiError::SessionExpired { message }
            | ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Io { message } => message.as_str(),
        }
    }

    /// HTTP status this error was classified from, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::SessionExpired { .. } => Some(401),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport { .. } | ApiError::Decode { .. } | ApiError::Io { .. } => None,
        }
    }

    /// Classify a non-success HTTP status. A 401 reaching this point means the
    /// reauthentication interceptor has already attempted (or could not attempt)
    /// a refresh, so it escalates to `SessionExpired`.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ApiError::SessionExpired { message },
            400..=499 => ApiError::Validation { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status() {
            Some(code) => write!(f, "http {}: {}", code, self.message()),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport { message: err.to_string() }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(ApiError::from_status(401, "no".into()), ApiError::SessionExpired { .. }));
        assert!(matches!(ApiError::from_status(400, "bad".into()), ApiError::Validation { status: 400, .. }));
        assert!(matches!(ApiError::from_status(404, "missing".into()), ApiError::Validation { status: 404, .. }));
        assert!(matches!(ApiError::from_status(422, "nope".into()), ApiError::Validation { status: 422, .. }));
        assert!(matches!(ApiError::from_status(500, "boom".into()), ApiError::Server { status: 500, .. }));
        assert!(matches!(ApiError::from_status(503, "down".into()), ApiError::Server { status: 503, .. }));
    }

    #[test]
    fn status_accessor() {
        assert_eq!(ApiError::session_expired("x").status(), Some(401));
        assert_eq!(ApiError::validation(404, "x").status(), Some(404));
        assert_eq!(ApiError::server(502, "x").status(), Some(502));
        assert_eq!(ApiError::transport("x").status(), None);
        assert_eq!(ApiError::decode("x").status(), None);
    }

    #[test]
    fn display_includes_status_when_present() {
        let e = ApiError::validation(409, "duplicate name");
        assert_eq!(e.to_string(), "http 409: duplicate name");
        let t = ApiError::transport("connection refused");
        assert_eq!(t.to_string(), "connection refused");
    }
}
