// src/session/intake.rs
use super::Session;
use crate::errors::RestyleError;
use crate::models::{SourceImage, UploadId};
use crate::state::{Event, Transition};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Ready,
    Failed(String),
    /// A newer upload replaced this one before its derivation finished.
    Superseded,
}

impl Session {
    /// Installs the raw file as the current original image and invalidates any
    /// earlier result or error.
    pub fn begin_upload(&self, file: SourceImage) -> UploadId {
        let mut state = self.state.lock();
        let upload_id = state.issue_upload_id();
        info!(
            "Session {} upload {}: {} ({} bytes)",
            self.id, upload_id, file.file_name, file.size
        );
        state.apply(Event::UploadStarted { upload_id, file });
        upload_id
    }

    pub fn finish_upload(
        &self,
        upload_id: UploadId,
        derived: Result<String, RestyleError>,
    ) -> IngestOutcome {
        let mut state = self.state.lock();
        match derived {
            Ok(display_url) => match state.apply(Event::UploadDerived {
                upload_id,
                display_url,
            }) {
                Transition::Applied => IngestOutcome::Ready,
                Transition::Stale => {
                    info!("Session {} dropped stale upload {}", self.id, upload_id);
                    IngestOutcome::Superseded
                }
            },
            Err(err) => {
                let message = err.user_message();
                match state.apply(Event::UploadFailed {
                    upload_id,
                    message: message.clone(),
                }) {
                    Transition::Applied => {
                        warn!("Session {} upload {} failed: {}", self.id, upload_id, err);
                        IngestOutcome::Failed(message)
                    }
                    Transition::Stale => IngestOutcome::Superseded,
                }
            }
        }
    }

    /// Installs the file, then derives its display form on a detached task.
    /// The final state update happens even if the caller stops waiting.
    pub async fn ingest(self: &Arc<Self>, file: SourceImage) -> IngestOutcome {
        let data = file.data.clone();
        let upload_id = self.begin_upload(file);

        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            let processor = Arc::clone(&session.processor);
            let derived = tokio::task::spawn_blocking(move || processor.derive_display(&data))
                .await
                .unwrap_or_else(|e| {
                    Err(RestyleError::ImageProcessing(format!(
                        "Image derivation task failed: {}",
                        e
                    )))
                });
            session.finish_upload(upload_id, derived)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => self.finish_upload(
                upload_id,
                Err(RestyleError::ImageProcessing(format!(
                    "Image derivation task failed: {}",
                    e
                ))),
            ),
        }
    }
}
