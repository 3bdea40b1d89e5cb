// src/models.rs
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub type UploadId = u64;
pub type SubmissionId = u64;

/// The raw file handed over by the uploader. Bytes are shared, so cloning a
/// snapshot for an in-flight request is cheap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceImage {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip)]
    pub data: Bytes,
}

impl SourceImage {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedImage {
    pub upload_id: UploadId,
    #[serde(flatten)]
    pub file: SourceImage,
    /// `data:` URI, absent until derivation finishes.
    pub display_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedImage {
    pub fn pending(upload_id: UploadId, file: SourceImage) -> Self {
        Self {
            upload_id,
            file,
            display_url: None,
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.display_url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub mime_type: String,
    pub data_url: String,
    #[serde(skip)]
    pub data: Bytes,
    pub prompt_used: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn from_bytes(
        data: impl Into<Bytes>,
        mime_type: impl Into<String>,
        prompt_used: impl Into<String>,
    ) -> Self {
        let data = data.into();
        let mime_type = mime_type.into();
        Self {
            id: Uuid::new_v4(),
            data_url: data_url(&mime_type, &data),
            mime_type,
            data,
            prompt_used: prompt_used.into(),
            created_at: Utc::now(),
        }
    }
}

pub fn data_url(mime_type: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(data)
    )
}
