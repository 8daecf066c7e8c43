use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::transport::http_client::RestClient;
use crate::transport::model::MultipartPayload;

/// Multipart resume upload. The only portal call that overrides the
/// JSON content type.
pub struct ResumeService<C: RestClient> {
    client: Arc<C>,
}

impl<C: RestClient> ResumeService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn upload_resume(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<serde_json::Value, ApiError> {
        debug!("uploading resume {} ({} bytes)", file_name, bytes.len());
        let payload = MultipartPayload::new().file("resume", file_name, mime, bytes);
        let envelope = self.client.upload("/resume/upload", payload).await?;
        Ok(envelope.data)
    }
}
