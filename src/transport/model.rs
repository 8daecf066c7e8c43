use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Uniform envelope every successful call resolves to. Bodies the
/// backend already shaped this way pass through unchanged; bare
/// payloads are wrapped once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Rebuildable multipart body. `reqwest::multipart::Form` is consumed
/// on send, so the payload keeps raw parts and builds a fresh form per
/// attempt — the 401 replay needs a second build.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

#[derive(Debug, Clone)]
struct FilePart {
    name: String,
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        });
        self
    }

    pub(crate) fn to_form(&self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)
                .map_err(|e| ApiError::internal(format!("invalid mime type: {e}")))?;
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}
