// src/services/session_store.rs
use crate::errors::RestyleError;
use crate::services::{ImageProcessor, Restyler};
use crate::session::Session;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Live sessions, kept in memory only. Nothing survives a restart.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    restyler: Arc<dyn Restyler>,
    processor: Arc<ImageProcessor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub has_image: bool,
    pub is_loading: bool,
}

impl SessionStore {
    pub fn new(restyler: Arc<dyn Restyler>, processor: Arc<ImageProcessor>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            restyler,
            processor,
        }
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(
            Arc::clone(&self.restyler),
            Arc::clone(&self.processor),
        ));
        self.sessions
            .write()
            .insert(session.id(), Arc::clone(&session));
        log::info!("Created session {}", session.id());
        session
    }

    /// Looks a session up and refreshes its idle clock.
    pub fn get(&self, id: &Uuid) -> Result<Arc<Session>, RestyleError> {
        let session = self
            .sessions
            .read()
            .get(id)
            .cloned()
            .ok_or(RestyleError::SessionNotFound(*id))?;
        session.touch();
        Ok(session)
    }

    pub fn remove(&self, id: &Uuid) -> Result<(), RestyleError> {
        self.sessions
            .write()
            .remove(id)
            .map(|_| log::info!("Removed session {}", id))
            .ok_or(RestyleError::SessionNotFound(*id))
    }

    /// Drops sessions untouched for at least `max_idle`. A session with a
    /// submission in flight is kept until that submission settles.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.is_loading() || session.idle_for() < max_idle;
            if !keep {
                log::info!("Expired idle session {}", id);
            }
            keep
        });
        before - sessions.len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let expired = self.sweep_idle(max_idle);
                if expired > 0 {
                    log::debug!("Idle sweep removed {} session(s)", expired);
                }
            }
        })
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<_> = self
            .sessions
            .read()
            .values()
            .map(|session| {
                let view = session.view();
                SessionSummary {
                    session_id: session.id(),
                    created_at: session.created_at(),
                    has_image: view.original_image.is_some(),
                    is_loading: view.is_loading,
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubRestyler, png_file, wait_until};
    use tokio::sync::Semaphore;

    fn store() -> SessionStore {
        SessionStore::new(
            Arc::new(StubRestyler::new()),
            Arc::new(ImageProcessor::new(64)),
        )
    }

    #[test]
    fn test_create_get_remove() {
        let store = store();
        let session = store.create();

        assert_eq!(store.get(&session.id()).unwrap().id(), session.id());
        assert_eq!(store.list().len(), 1);

        store.remove(&session.id()).unwrap();
        assert!(matches!(
            store.get(&session.id()),
            Err(RestyleError::SessionNotFound(_))
        ));
        assert!(store.remove(&session.id()).is_err());
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = store();
        let a = store.create();
        let b = store.create();

        a.set_field("intensity", "high").unwrap();

        assert_ne!(a.style(), b.style());
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_sweep_removes_only_idle_sessions() {
        let store = store();
        let session = store.create();

        assert_eq!(store.sweep_idle(Duration::from_secs(3600)), 0);
        assert!(store.get(&session.id()).is_ok());

        assert_eq!(store.sweep_idle(Duration::ZERO), 1);
        assert!(matches!(
            store.get(&session.id()),
            Err(RestyleError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_keeps_session_with_submission_in_flight() {
        let gate = Arc::new(Semaphore::new(0));
        let stub = Arc::new(StubRestyler::gated(gate.clone()));
        let store = SessionStore::new(stub.clone(), Arc::new(ImageProcessor::new(64)));
        let busy = store.create();
        store.create();
        busy.ingest(png_file("a.png")).await;

        let submit = tokio::spawn({
            let busy = busy.clone();
            async move { busy.submit().await }
        });
        stub.started.notified().await;

        assert_eq!(store.sweep_idle(Duration::ZERO), 1);
        assert!(store.get(&busy.id()).is_ok());

        gate.add_permits(1);
        submit.await.unwrap();
        assert_eq!(store.sweep_idle(Duration::ZERO), 1);
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_task_expires_abandoned_sessions() {
        let store = Arc::new(store());
        store.create();
        store.create();

        let sweeper = Arc::clone(&store)
            .spawn_sweeper(Duration::from_millis(20), Duration::from_millis(10));
        wait_until(|| store.list().is_empty()).await;
        sweeper.abort();
    }
}
