//! Per-request transformation stages, each with a single
//! responsibility: attach-auth, normalize-envelope, normalize-error.
//! The client composes them around the base transport call.

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::{AUTH_HEADER, BEARER_PREFIX, GENERIC_ERROR_MESSAGE};
use crate::error::{ApiError, ErrorDescriptor};
use crate::storage::session::SessionStore;
use crate::transport::model::ApiResponse;

/// Sets `Authorization: Bearer <token>` when an access token is present
/// in the session store; requests without a token go out bare.
pub(crate) fn attach_auth(session: &SessionStore, request: RequestBuilder) -> RequestBuilder {
    match session.access_token() {
        Some(token) => request.header(AUTH_HEADER, format!("{BEARER_PREFIX}{token}")),
        None => request,
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    data: Value,
    status: Option<u16>,
    message: Option<String>,
}

/// Normalizes a success body into the uniform envelope. A body that
/// already carries a `data` field passes through unchanged (a missing
/// `status` is filled with the HTTP status); anything else is wrapped
/// exactly once. Wrapping never nests: the decision is made here, at
/// the boundary, and nowhere else.
pub(crate) fn wrap_envelope(status: u16, body: Value) -> Result<ApiResponse<Value>, ApiError> {
    let enveloped = body
        .as_object()
        .map(|o| o.contains_key("data"))
        .unwrap_or(false);

    if enveloped {
        let raw: RawEnvelope = serde_json::from_value(body)?;
        Ok(ApiResponse {
            data: raw.data,
            status: raw.status.unwrap_or(status),
            message: raw.message,
        })
    } else {
        Ok(ApiResponse {
            data: body,
            status,
            message: Some("OK".to_string()),
        })
    }
}

/// Uniform descriptor from an error-status body. Falls back to the
/// generic message when the body carries none, and forwards the
/// backend's `errors` map verbatim.
pub(crate) fn parse_error_body(status: u16, body: &str, path: &str) -> ErrorDescriptor {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string();

    let mut descriptor = ErrorDescriptor::new(message, status).with_path(path);
    if let Some(errors) = value
        .get("errors")
        .and_then(|e| serde_json::from_value(e.clone()).ok())
    {
        descriptor = descriptor.with_errors(errors);
    }
    descriptor
}

/// Transport failures carry no response: status 0 when the request
/// went out and nothing came back, 500 for anything else.
pub(crate) fn normalize_transport_error(error: reqwest::Error, path: &str) -> ApiError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        ApiError::network(path)
    } else {
        ApiError::Internal(ErrorDescriptor::new(error.to_string(), 500).with_path(path))
    }
}
