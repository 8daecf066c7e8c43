use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::constants::NO_RESPONSE_MESSAGE;

/// Uniform failure shape surfaced to callers regardless of origin:
/// backend error response, transport failure or client-side fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub message: String,
    pub status: u16,
    /// Field name to list of messages, forwarded verbatim from the
    /// backend validation response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorDescriptor {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            errors: None,
            timestamp: Some(Utc::now()),
            path: None,
            request_id: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl Display for ErrorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {} ({})", self.status, self.message, path),
            None => write!(f, "[{}] {}", self.status, self.message),
        }
    }
}

/// Closed error taxonomy for every call issued through the client.
///
/// `Unauthorized` is internal bookkeeping: a first-pass 401 that the
/// client resolves with one refresh attempt. Callers only ever observe
/// it as the replayed outcome, an `Api` error, or `RefreshFailed`.
#[derive(Debug)]
pub enum ApiError {
    /// 401 on a request that has not been replayed yet; recoverable.
    Unauthorized(ErrorDescriptor),
    /// Token refresh failed; the session is gone. The only variant with
    /// side effects beyond the returned value (storage cleanup plus
    /// navigation to the login route).
    RefreshFailed(Box<ApiError>),
    /// Backend error status with a structured body.
    Api(ErrorDescriptor),
    /// Request sent, no response came back; status 0.
    Network(ErrorDescriptor),
    /// Client-side fault; status 500 fallback.
    Internal(ErrorDescriptor),
}

impl ApiError {
    pub fn descriptor(&self) -> &ErrorDescriptor {
        match self {
            ApiError::Unauthorized(d)
            | ApiError::Api(d)
            | ApiError::Network(d)
            | ApiError::Internal(d) => d,
            ApiError::RefreshFailed(inner) => inner.descriptor(),
        }
    }

    pub fn status(&self) -> u16 {
        self.descriptor().status
    }

    pub(crate) fn network(path: &str) -> Self {
        ApiError::Network(ErrorDescriptor::new(NO_RESPONSE_MESSAGE, 0).with_path(path))
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(ErrorDescriptor::new(message, 500))
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(d) => write!(f, "unauthorized: {d}"),
            ApiError::RefreshFailed(inner) => write!(f, "token refresh failed: {inner}"),
            ApiError::Api(d) => write!(f, "api error: {d}"),
            ApiError::Network(d) => write!(f, "network error: {d}"),
            ApiError::Internal(d) => write!(f, "internal error: {d}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RefreshFailed(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let path = e.url().map(|u| u.path().to_string()).unwrap_or_default();
        if e.is_timeout() || e.is_connect() || e.is_request() {
            ApiError::Network(ErrorDescriptor::new(NO_RESPONSE_MESSAGE, 0).with_path(path))
        } else {
            ApiError::Internal(ErrorDescriptor::new(e.to_string(), 500).with_path(path))
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::internal(e.to_string())
    }
}
