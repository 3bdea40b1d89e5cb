// src/session/orchestrator.rs
use super::Session;
use crate::errors::UNKNOWN_ERROR_MESSAGE;
use crate::models::SubmissionId;
use crate::state::{Event, SubmissionSnapshot, Transition};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Failed(String),
    /// Preconditions did not hold; nothing was sent.
    Rejected(String),
    /// A submission was already in flight.
    Ignored,
    /// The image was replaced while the request ran; its result was dropped.
    Superseded,
}

impl Session {
    /// Starts a submission and waits for its outcome. The external call and
    /// the terminal state update run on their own task, so dropping this
    /// future never leaves the session loading.
    pub async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let (submission_id, snapshot) = {
            let mut state = self.state.lock();
            if state.is_loading() {
                debug!("Session {} submit ignored: request in flight", self.id);
                return SubmitOutcome::Ignored;
            }

            let snapshot = match state.submission_snapshot() {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    let message = err.user_message();
                    state.apply(Event::SubmitRejected {
                        message: message.clone(),
                    });
                    return SubmitOutcome::Rejected(message);
                }
            };

            let submission_id = state.issue_submission_id();
            state.apply(Event::SubmitStarted {
                submission_id,
                upload_id: snapshot.upload_id,
            });
            (submission_id, snapshot)
        };

        let session = Arc::clone(self);
        let task =
            tokio::spawn(async move { session.run_submission(submission_id, snapshot).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "Session {} submission {} task failed: {}",
                    self.id, submission_id, err
                );
                let message = UNKNOWN_ERROR_MESSAGE.to_string();
                match self.state.lock().apply(Event::SubmitFailed {
                    submission_id,
                    message: message.clone(),
                }) {
                    Transition::Applied => SubmitOutcome::Failed(message),
                    Transition::Stale => SubmitOutcome::Superseded,
                }
            }
        }
    }

    async fn run_submission(
        &self,
        submission_id: SubmissionId,
        snapshot: SubmissionSnapshot,
    ) -> SubmitOutcome {
        info!(
            "Session {} submission {}: restyling {} via {} (texture={}, lighting={}, intensity={})",
            self.id,
            submission_id,
            snapshot.image.file_name,
            self.restyler.name(),
            snapshot.options.texture,
            snapshot.options.lighting,
            snapshot.options.intensity
        );
        let start = Instant::now();

        let result = self
            .restyler
            .restyle(&snapshot.image, &snapshot.options)
            .await;

        let mut state = self.state.lock();
        match result {
            Ok(image) => {
                info!(
                    "Session {} submission {} finished in {}ms",
                    self.id,
                    submission_id,
                    start.elapsed().as_millis()
                );
                match state.apply(Event::SubmitSucceeded {
                    submission_id,
                    image,
                }) {
                    Transition::Applied => SubmitOutcome::Completed,
                    Transition::Stale => SubmitOutcome::Superseded,
                }
            }
            Err(err) => {
                warn!(
                    "Session {} submission {} failed: {}",
                    self.id, submission_id, err
                );
                let message = err.user_message();
                match state.apply(Event::SubmitFailed {
                    submission_id,
                    message: message.clone(),
                }) {
                    Transition::Applied => SubmitOutcome::Failed(message),
                    Transition::Stale => SubmitOutcome::Superseded,
                }
            }
        }
    }
}
