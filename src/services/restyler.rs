// src/services/restyler.rs
use crate::errors::RestyleError;
use crate::models::{GeneratedImage, SourceImage};
use crate::style::StyleOptions;
use async_trait::async_trait;

/// The external image-generation collaborator. Each call is single-shot and
/// resolves to exactly one image or one error.
#[async_trait]
pub trait Restyler: Send + Sync {
    async fn restyle(
        &self,
        image: &SourceImage,
        options: &StyleOptions,
    ) -> Result<GeneratedImage, RestyleError>;

    fn name(&self) -> &str;
}
