use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::transport::http_client::RestClient;

/// Profile payloads are forwarded verbatim; their shape is owned by
/// the backend.
pub struct ProfileService<C: RestClient> {
    client: Arc<C>,
}

impl<C: RestClient> ProfileService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn get_profile(&self) -> Result<Value, ApiError> {
        debug!("fetching profile");
        let envelope = self
            .client
            .request_value(Method::GET, "/profile", None)
            .await?;
        Ok(envelope.data)
    }

    pub async fn update_profile(&self, profile: Value) -> Result<Value, ApiError> {
        debug!("updating profile");
        let envelope = self
            .client
            .request_value(Method::PUT, "/profile", Some(profile))
            .await?;
        Ok(envelope.data)
    }
}
