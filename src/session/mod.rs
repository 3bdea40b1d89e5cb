// src/session/mod.rs
// One user's restyle session: style configuration, upload stream and
// submission lifecycle, all reduced into a single ViewState.
mod intake;
mod orchestrator;

pub use intake::IngestOutcome;
pub use orchestrator::SubmitOutcome;

use crate::errors::RestyleError;
use crate::services::{ImageProcessor, Restyler};
use crate::state::{Event, SessionState, ViewState};
use crate::style::{self, StyleEdit, StyleOptions};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_active: Mutex<Instant>,
    state: Mutex<SessionState>,
    restyler: Arc<dyn Restyler>,
    processor: Arc<ImageProcessor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub view: ViewState,
    pub style: StyleOptions,
}

impl Session {
    pub fn new(restyler: Arc<dyn Restyler>, processor: Arc<ImageProcessor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            last_active: Mutex::new(Instant::now()),
            state: Mutex::new(SessionState::new()),
            restyler,
            processor,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the session as used now.
    pub fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.lock().elapsed()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading()
    }

    pub fn view(&self) -> ViewState {
        self.state.lock().view().clone()
    }

    pub fn style(&self) -> StyleOptions {
        self.state.lock().style().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            session_id: self.id,
            view: state.view().clone(),
            style: state.style().clone(),
        }
    }

    pub fn set_field(&self, key: &str, value: &str) -> Result<StyleOptions, RestyleError> {
        let edit = StyleEdit::from_key(key, value)?;
        let mut state = self.state.lock();
        state.apply(Event::StyleEdited(edit));
        log::debug!("Session {} set style field '{}'", self.id, key);
        Ok(state.style().clone())
    }

    pub fn apply_preset(&self, name: &str) -> Result<StyleOptions, RestyleError> {
        let preset = style::find_preset(name)?;
        let mut state = self.state.lock();
        state.apply(Event::PresetApplied(preset.options));
        log::info!("Session {} applied preset '{}'", self.id, preset.name);
        Ok(state.style().clone())
    }
}
