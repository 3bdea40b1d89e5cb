// src/state.rs
use crate::errors::RestyleError;
use crate::models::{GeneratedImage, SourceImage, SubmissionId, UploadId, UploadedImage};
use crate::style::{StyleEdit, StyleOptions};
use serde::Serialize;

pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first.";
pub const PENDING_IMAGE_MESSAGE: &str =
    "Your image is still being prepared. Try again in a moment.";

/// What presentation reads. Nothing else is exposed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub original_image: Option<UploadedImage>,
    pub restyled_image: Option<GeneratedImage>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum Event {
    UploadStarted {
        upload_id: UploadId,
        file: SourceImage,
    },
    UploadDerived {
        upload_id: UploadId,
        display_url: String,
    },
    UploadFailed {
        upload_id: UploadId,
        message: String,
    },
    StyleEdited(StyleEdit),
    PresetApplied(StyleOptions),
    SubmitRejected {
        message: String,
    },
    SubmitStarted {
        submission_id: SubmissionId,
        upload_id: UploadId,
    },
    SubmitSucceeded {
        submission_id: SubmissionId,
        image: GeneratedImage,
    },
    SubmitFailed {
        submission_id: SubmissionId,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The event belonged to a superseded upload or submission and only its
    /// bookkeeping (if any) was applied.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    submission_id: SubmissionId,
    upload_id: UploadId,
}

/// Inputs captured for one submission at call time.
#[derive(Debug, Clone)]
pub struct SubmissionSnapshot {
    pub upload_id: UploadId,
    pub image: SourceImage,
    pub options: StyleOptions,
}

#[derive(Debug, Default)]
pub struct SessionState {
    view: ViewState,
    style: StyleOptions,
    latest_upload: UploadId,
    last_submission: SubmissionId,
    in_flight: Option<InFlight>,
    // Intake failure that arrived while a request was loading.
    deferred_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading
    }

    pub fn issue_upload_id(&mut self) -> UploadId {
        self.latest_upload += 1;
        self.latest_upload
    }

    pub fn issue_submission_id(&mut self) -> SubmissionId {
        self.last_submission += 1;
        self.last_submission
    }

    pub fn submission_snapshot(&self) -> Result<SubmissionSnapshot, RestyleError> {
        let original = self
            .view
            .original_image
            .as_ref()
            .ok_or_else(|| RestyleError::Precondition(MISSING_IMAGE_MESSAGE.to_string()))?;

        if !original.is_ready() {
            return Err(RestyleError::Precondition(
                PENDING_IMAGE_MESSAGE.to_string(),
            ));
        }

        Ok(SubmissionSnapshot {
            upload_id: original.upload_id,
            image: original.file.clone(),
            options: self.style.clone(),
        })
    }

    pub fn apply(&mut self, event: Event) -> Transition {
        match event {
            Event::UploadStarted { upload_id, file } => {
                if upload_id < self.latest_upload {
                    return Transition::Stale;
                }
                self.latest_upload = upload_id;
                self.view.original_image = Some(UploadedImage::pending(upload_id, file));
                self.view.restyled_image = None;
                self.view.error = None;
                self.deferred_error = None;
                Transition::Applied
            }
            Event::UploadDerived {
                upload_id,
                display_url,
            } => match self.view.original_image.as_mut() {
                Some(original) if original.upload_id == upload_id => {
                    original.display_url = Some(display_url);
                    Transition::Applied
                }
                _ => Transition::Stale,
            },
            Event::UploadFailed { upload_id, message } => {
                let current = self
                    .view
                    .original_image
                    .as_ref()
                    .is_some_and(|original| original.upload_id == upload_id);
                if !current {
                    return Transition::Stale;
                }
                self.view.original_image = None;
                if self.view.is_loading {
                    self.deferred_error = Some(message);
                } else {
                    self.view.error = Some(message);
                }
                Transition::Applied
            }
            Event::StyleEdited(edit) => {
                self.style.apply(edit);
                Transition::Applied
            }
            Event::PresetApplied(options) => {
                self.style = options;
                Transition::Applied
            }
            Event::SubmitRejected { message } => {
                if self.view.is_loading {
                    return Transition::Stale;
                }
                self.view.error = Some(message);
                Transition::Applied
            }
            Event::SubmitStarted {
                submission_id,
                upload_id,
            } => {
                if self.in_flight.is_some() {
                    return Transition::Stale;
                }
                self.in_flight = Some(InFlight {
                    submission_id,
                    upload_id,
                });
                self.view.error = None;
                self.view.restyled_image = None;
                self.view.is_loading = true;
                Transition::Applied
            }
            Event::SubmitSucceeded {
                submission_id,
                image,
            } => self.finish_submission(submission_id, Ok(image)),
            Event::SubmitFailed {
                submission_id,
                message,
            } => self.finish_submission(submission_id, Err(message)),
        }
    }

    fn finish_submission(
        &mut self,
        submission_id: SubmissionId,
        outcome: Result<GeneratedImage, String>,
    ) -> Transition {
        let in_flight = match self.in_flight {
            Some(in_flight) if in_flight.submission_id == submission_id => in_flight,
            _ => return Transition::Stale,
        };
        self.in_flight = None;
        self.view.is_loading = false;

        if in_flight.upload_id != self.latest_upload {
            self.view.error = self.deferred_error.take();
            return Transition::Stale;
        }

        match outcome {
            Ok(image) => {
                self.view.restyled_image = Some(image);
                self.view.error = None;
            }
            Err(message) => {
                self.view.restyled_image = None;
                self.view.error = Some(message);
            }
        }
        Transition::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{find_preset, LightingMood};

    fn file(name: &str) -> SourceImage {
        SourceImage::new(name, "image/png", name.as_bytes().to_vec())
    }

    fn ready_state(name: &str) -> (SessionState, UploadId) {
        let mut state = SessionState::new();
        let upload_id = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id,
            file: file(name),
        });
        state.apply(Event::UploadDerived {
            upload_id,
            display_url: format!("data:{name}"),
        });
        (state, upload_id)
    }

    fn start(state: &mut SessionState) -> SubmissionId {
        let snapshot = state.submission_snapshot().unwrap();
        let submission_id = state.issue_submission_id();
        assert_eq!(
            state.apply(Event::SubmitStarted {
                submission_id,
                upload_id: snapshot.upload_id,
            }),
            Transition::Applied
        );
        submission_id
    }

    #[test]
    fn test_snapshot_requires_an_image() {
        let state = SessionState::new();
        let err = state.submission_snapshot().unwrap_err();
        assert_eq!(err.user_message(), MISSING_IMAGE_MESSAGE);
    }

    #[test]
    fn test_snapshot_requires_a_derived_image() {
        let mut state = SessionState::new();
        let upload_id = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id,
            file: file("a"),
        });
        let err = state.submission_snapshot().unwrap_err();
        assert_eq!(err.user_message(), PENDING_IMAGE_MESSAGE);
    }

    #[test]
    fn test_preset_is_a_full_overwrite() {
        let mut state = SessionState::new();
        state.apply(Event::StyleEdited(StyleEdit::Lighting(LightingMood::NeonNight)));
        state.apply(Event::StyleEdited(StyleEdit::Influence("Moebius".into())));

        let preset = find_preset("Sketch").unwrap();
        state.apply(Event::PresetApplied(preset.options.clone()));

        assert_eq!(state.style(), &preset.options);
    }

    #[test]
    fn test_upload_derivation_out_of_order_keeps_newest() {
        let mut state = SessionState::new();
        let first = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: first,
            file: file("one"),
        });
        let second = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: second,
            file: file("two"),
        });

        let newest = state.apply(Event::UploadDerived {
            upload_id: second,
            display_url: "data:two".into(),
        });
        let stale = state.apply(Event::UploadDerived {
            upload_id: first,
            display_url: "data:one".into(),
        });

        assert_eq!(newest, Transition::Applied);
        assert_eq!(stale, Transition::Stale);
        let original = state.view().original_image.as_ref().unwrap();
        assert_eq!(original.file.file_name, "two");
        assert_eq!(original.display_url.as_deref(), Some("data:two"));
    }

    #[test]
    fn test_stale_upload_failure_is_ignored() {
        let mut state = SessionState::new();
        let first = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: first,
            file: file("one"),
        });
        let second = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: second,
            file: file("two"),
        });

        let transition = state.apply(Event::UploadFailed {
            upload_id: first,
            message: "corrupt".into(),
        });

        assert_eq!(transition, Transition::Stale);
        assert!(state.view().error.is_none());
        assert!(state.view().original_image.is_some());
    }

    #[test]
    fn test_upload_failure_clears_original_and_sets_error() {
        let mut state = SessionState::new();
        let upload_id = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id,
            file: file("broken"),
        });
        state.apply(Event::UploadFailed {
            upload_id,
            message: "Unsupported image".into(),
        });

        assert!(state.view().original_image.is_none());
        assert_eq!(state.view().error.as_deref(), Some("Unsupported image"));
    }

    #[test]
    fn test_submission_success_and_failure() {
        let (mut state, _) = ready_state("a");

        let submission_id = start(&mut state);
        assert!(state.is_loading());
        state.apply(Event::SubmitSucceeded {
            submission_id,
            image: GeneratedImage::from_bytes(vec![9u8], "image/png", "p"),
        });
        assert!(!state.is_loading());
        assert!(state.view().restyled_image.is_some());
        assert!(state.view().error.is_none());

        let submission_id = start(&mut state);
        assert!(state.view().restyled_image.is_none());
        state.apply(Event::SubmitFailed {
            submission_id,
            message: "Quota exceeded".into(),
        });
        assert!(!state.is_loading());
        assert!(state.view().restyled_image.is_none());
        assert_eq!(state.view().error.as_deref(), Some("Quota exceeded"));
    }

    #[test]
    fn test_second_start_while_loading_is_stale() {
        let (mut state, upload_id) = ready_state("a");
        start(&mut state);

        let again = state.apply(Event::SubmitStarted {
            submission_id: 99,
            upload_id,
        });
        assert_eq!(again, Transition::Stale);

        let rejected = state.apply(Event::SubmitRejected {
            message: "nope".into(),
        });
        assert_eq!(rejected, Transition::Stale);
        assert!(state.view().error.is_none());
    }

    #[test]
    fn test_result_for_replaced_image_is_discarded() {
        let (mut state, _) = ready_state("a");
        let submission_id = start(&mut state);

        let next = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: next,
            file: file("c"),
        });
        assert!(state.is_loading());

        let transition = state.apply(Event::SubmitSucceeded {
            submission_id,
            image: GeneratedImage::from_bytes(vec![1u8], "image/png", "p"),
        });

        assert_eq!(transition, Transition::Stale);
        assert!(!state.is_loading());
        assert!(state.view().restyled_image.is_none());
        assert_eq!(
            state.view().original_image.as_ref().unwrap().file.file_name,
            "c"
        );
    }

    #[test]
    fn test_intake_failure_during_loading_is_published_when_loading_ends() {
        let (mut state, _) = ready_state("a");
        let submission_id = start(&mut state);

        let next = state.issue_upload_id();
        state.apply(Event::UploadStarted {
            upload_id: next,
            file: file("broken"),
        });
        state.apply(Event::UploadFailed {
            upload_id: next,
            message: "Unreadable image".into(),
        });
        assert!(state.is_loading());
        assert!(state.view().error.is_none());

        state.apply(Event::SubmitFailed {
            submission_id,
            message: "Quota exceeded".into(),
        });

        assert!(!state.is_loading());
        assert_eq!(state.view().error.as_deref(), Some("Unreadable image"));
        assert!(state.view().original_image.is_none());
    }
}
