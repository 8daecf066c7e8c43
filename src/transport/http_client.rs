use async_trait::async_trait;
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::{AUTH_HEADER, BEARER_PREFIX, REFRESH_ENDPOINT};
use crate::error::{ApiError, ErrorDescriptor};
use crate::session::navigator::{Navigator, TracingNavigator};
use crate::storage::session::SessionStore;
use crate::transport::middleware;
use crate::transport::model::{ApiResponse, MultipartPayload};
use crate::transport::refresh::RefreshGate;

/// Seam consumed by the portal services and the fetch helper. The
/// implementation owns auth attachment, envelope normalization and the
/// one-shot refresh-and-replay on 401; callers only ever see the final
/// outcome of a logical call.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn request_value(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse<Value>, ApiError>;

    async fn upload(
        &self,
        endpoint: &str,
        payload: MultipartPayload,
    ) -> Result<ApiResponse<Value>, ApiError>;
}

/// Authenticated HTTP client for the portal backend.
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    refresh_gate: RefreshGate,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

enum Payload {
    Json(Option<Value>),
    Multipart(MultipartPayload),
}

impl ApiHttpClient {
    pub fn new(config: &Config, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::with_navigator(config, session, Arc::new(TracingNavigator))
    }

    pub fn with_navigator(
        config: &Config,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.rest_api.timeout))
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.rest_api.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
            refresh_gate: RefreshGate::new(),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::GET, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, endpoint, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PUT, endpoint, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PATCH, endpoint, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::DELETE, endpoint, None).await
    }

    #[instrument(skip(self, body))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let envelope = self
            .request_with_replay(method, endpoint, Payload::Json(body))
            .await?;
        decode_envelope(envelope)
    }

    #[instrument(skip(self, payload))]
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: MultipartPayload,
    ) -> Result<ApiResponse<T>, ApiError> {
        let envelope = self
            .request_with_replay(Method::POST, endpoint, Payload::Multipart(payload))
            .await?;
        decode_envelope(envelope)
    }

    /// One logical call: the original request plus at most one replay.
    /// A first-pass 401 triggers a single refresh, and the replay is
    /// issued strictly after the refresh resolves. A 401 without a
    /// refresh token in the store surfaces as a plain API error.
    async fn request_with_replay(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let stale = self.session.access_token();
        match self.dispatch(&method, endpoint, &payload, None).await {
            Err(ApiError::Unauthorized(descriptor)) => {
                if self.session.refresh_token().is_none() {
                    return Err(ApiError::Api(descriptor));
                }
                let fresh = self.refresh_access_token(stale).await?;
                self.dispatch(&method, endpoint, &payload, Some(&fresh)).await
            }
            outcome => outcome,
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        endpoint: &str,
        payload: &Payload,
        replay_token: Option<&str>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request_id = Uuid::new_v4();
        debug!(%request_id, "{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        request = match replay_token {
            Some(token) => request.header(AUTH_HEADER, format!("{BEARER_PREFIX}{token}")),
            None => middleware::attach_auth(&self.session, request),
        };
        request = match payload {
            Payload::Json(Some(body)) => request.json(body),
            Payload::Json(None) => request,
            Payload::Multipart(parts) => request.multipart(parts.to_form()?),
        };

        let response = request
            .send()
            .await
            .map_err(|e| middleware::normalize_transport_error(e, endpoint))?;

        self.normalize(response, endpoint, replay_token.is_some()).await
    }

    async fn normalize(
        &self,
        response: Response,
        endpoint: &str,
        replayed: bool,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| middleware::normalize_transport_error(e, endpoint))?;

        if status.is_success() {
            let value: Value = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&body)?
            };
            return middleware::wrap_envelope(status.as_u16(), value);
        }

        let descriptor = middleware::parse_error_body(status.as_u16(), &body, endpoint);
        if status == reqwest::StatusCode::UNAUTHORIZED && !replayed {
            Err(ApiError::Unauthorized(descriptor))
        } else {
            Err(ApiError::Api(descriptor))
        }
    }

    async fn refresh_access_token(&self, stale: Option<String>) -> Result<String, ApiError> {
        self.refresh_gate
            .run(&self.session, stale, || self.perform_refresh())
            .await
    }

    /// Exchanges the stored refresh token for a new access token.
    /// Failure is fatal to the session: both tokens are cleared and the
    /// navigator is sent to the login route before the error propagates.
    async fn perform_refresh(&self) -> Result<String, ApiError> {
        let Some(refresh) = self.session.refresh_token() else {
            // a concurrent failed refresh already tore the session down
            return Err(ApiError::RefreshFailed(Box::new(ApiError::Api(
                ErrorDescriptor::new("no refresh token in session", 401)
                    .with_path(REFRESH_ENDPOINT),
            ))));
        };

        let url = format!("{}{}", self.base_url, REFRESH_ENDPOINT);
        debug!("refreshing access token");

        let response = match self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.expire_session();
                return Err(ApiError::RefreshFailed(Box::new(
                    middleware::normalize_transport_error(e, REFRESH_ENDPOINT),
                )));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.expire_session();
                return Err(ApiError::RefreshFailed(Box::new(
                    middleware::normalize_transport_error(e, REFRESH_ENDPOINT),
                )));
            }
        };

        if !status.is_success() {
            self.expire_session();
            return Err(ApiError::RefreshFailed(Box::new(ApiError::Api(
                middleware::parse_error_body(status.as_u16(), &body, REFRESH_ENDPOINT),
            ))));
        }

        let parsed: RefreshResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.expire_session();
                return Err(ApiError::RefreshFailed(Box::new(e.into())));
            }
        };

        self.session.set_access_token(&parsed.access);
        debug!("access token refreshed");
        Ok(parsed.access)
    }

    fn expire_session(&self) {
        warn!("token refresh failed, clearing session");
        self.session.clear();
        self.navigator.redirect_to_login();
    }
}

impl fmt::Debug for ApiHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHttpClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

fn decode_envelope<T: DeserializeOwned>(
    envelope: ApiResponse<Value>,
) -> Result<ApiResponse<T>, ApiError> {
    Ok(ApiResponse {
        data: serde_json::from_value(envelope.data)?,
        status: envelope.status,
        message: envelope.message,
    })
}

#[async_trait]
impl RestClient for ApiHttpClient {
    async fn request_value(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.request_with_replay(method, endpoint, Payload::Json(body))
            .await
    }

    async fn upload(
        &self,
        endpoint: &str,
        payload: MultipartPayload,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.request_with_replay(Method::POST, endpoint, Payload::Multipart(payload))
            .await
    }
}
