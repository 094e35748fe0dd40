//! Session lifecycle: create, load and startup hydration.
//!
//! Each session operation advances the workspace generation before its
//! request goes out and applies the response only if the generation is
//! still current. A response overtaken by a newer operation is dropped
//! with [`RagEvalError::Superseded`].
//!
//! Startup hydration is deduplicated per session id through a small
//! request-state map, so concurrent callers share one request and its
//! outcome.

use crate::api::ServiceClient;
use crate::error::{RagEvalError, Result};
use crate::models::{Entity, SessionSnapshot};
use crate::persistence::SessionStore;
use crate::workspace::Workspace;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Counts of what a loaded session holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub documents: usize,
    pub questions: usize,
    pub configurations: usize,
    pub answers: usize,
}

impl SessionSummary {
    fn of(session_id: &str, snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: session_id.to_string(),
            documents: snapshot.documents.len(),
            questions: snapshot.questions.len(),
            configurations: snapshot.configurations.len(),
            answers: snapshot.answers.len(),
        }
    }
}

/// Result of a successful load call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLoad {
    Loaded(SessionSummary),
    /// The service does not know the id. The persisted id was cleared.
    NoSession,
}

/// Outcome of startup hydration. Never an error: a failed hydration
/// degrades to "start a new session".
#[derive(Debug, Clone)]
pub enum Hydration {
    /// Nothing persisted, or the persisted session no longer exists.
    NoSession,
    Restored(SessionSummary),
    /// Hydration failed; the caller should offer a new session.
    Degraded(RagEvalError),
}

impl Hydration {
    pub fn is_restored(&self) -> bool {
        matches!(self, Hydration::Restored(_))
    }
}

/// Progress of hydration for one session id.
#[derive(Debug, Clone)]
pub enum RequestState {
    NotStarted,
    InFlight,
    Done(Hydration),
    Failed(RagEvalError),
}

#[derive(Debug)]
enum Slot {
    InFlight(watch::Receiver<Option<Hydration>>),
    Done(Hydration),
    Failed(RagEvalError),
}

/// Owns the active session id and its persistence.
#[derive(Debug, Clone)]
pub struct SessionController {
    client: ServiceClient,
    store: SessionStore,
    workspace: Workspace,
    hydrations: Arc<Mutex<HashMap<String, Slot>>>,
}

impl SessionController {
    pub fn new(client: ServiceClient, store: SessionStore, workspace: Workspace) -> Self {
        Self {
            client,
            store,
            workspace,
            hydrations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn current_session(&self) -> Option<String> {
        self.workspace.session_id().await
    }

    /// Request a new session, persist its id and empty every mirror.
    ///
    /// On failure the previous session stays active and persisted, and
    /// nothing in flight is superseded.
    pub async fn create_session(&self) -> Result<String> {
        let generation = self.workspace.read().await.generation;

        let session_id = self.client.create_session().await?;

        let stale = || {
            RagEvalError::Superseded(format!(
                "session {} was created after a newer session operation started",
                session_id
            ))
        };
        if !self.workspace.read().await.is_current(generation) {
            warn!(session_id = %session_id, "discarding session created by a superseded request");
            return Err(stale());
        }

        self.store.write_slot(Some(session_id.clone())).await?;

        let mut state = self.workspace.write().await;
        if !state.is_current(generation) {
            drop(state);
            self.restore_slot().await;
            return Err(stale());
        }
        state.advance_generation();
        state.reset(Some(session_id.clone()));
        info!(session_id = %session_id, "started new session");

        Ok(session_id)
    }

    /// Fetch a session and replace all local collections with it at once.
    ///
    /// An unknown id clears the persisted id and leaves no active session.
    /// Any other failure leaves the local state unchanged.
    pub async fn load_session(&self, session_id: &str) -> Result<SessionLoad> {
        if session_id.trim().is_empty() {
            return Err(RagEvalError::validation("session id is required"));
        }

        let generation = self.workspace.write().await.advance_generation();
        let fetched = self.client.get_session(session_id).await;

        let stale = || {
            RagEvalError::Superseded(format!(
                "load of session {} was overtaken by a newer session operation",
                session_id
            ))
        };
        if !self.workspace.read().await.is_current(generation) {
            warn!(session_id, "discarding superseded session load");
            return Err(stale());
        }

        let mut snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_not_found() => {
                self.store.write_slot(None).await?;

                let mut state = self.workspace.write().await;
                if !state.is_current(generation) {
                    drop(state);
                    self.restore_slot().await;
                    return Err(stale());
                }
                state.reset(None);
                warn!(session_id, "session not found, cleared persisted id");
                return Ok(SessionLoad::NoSession);
            }
            Err(err) => return Err(err),
        };

        keep_session_entities(session_id, &mut snapshot);
        self.store.write_slot(Some(session_id.to_string())).await?;

        let mut state = self.workspace.write().await;
        if !state.is_current(generation) {
            drop(state);
            self.restore_slot().await;
            return Err(stale());
        }

        let summary = SessionSummary::of(session_id, &snapshot);
        state.apply_snapshot(session_id.to_string(), snapshot);
        info!(
            session_id,
            documents = summary.documents,
            questions = summary.questions,
            configurations = summary.configurations,
            "loaded session"
        );
        Ok(SessionLoad::Loaded(summary))
    }

    /// Point the persisted slot back at the active session after a write
    /// that lost the race to a newer operation.
    async fn restore_slot(&self) {
        let active = self.workspace.session_id().await;
        if let Err(err) = self.store.write_slot(active).await {
            warn!(error = %err, "could not restore persisted session id");
        }
    }

    /// Restore the persisted session, once per id.
    ///
    /// Concurrent calls for the same id share one request. A completed
    /// hydration is returned from cache; a failed one is retried on the
    /// next call.
    pub async fn hydrate_on_start(&self) -> Hydration {
        let session_id = match self.store.load() {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!("no persisted session");
                return Hydration::NoSession;
            }
            Err(err) => {
                warn!(error = %err, "could not read persisted session id");
                return Hydration::Degraded(err);
            }
        };

        let mut slots = self.hydrations.lock().await;
        match slots.get(&session_id) {
            Some(Slot::Done(outcome)) => return outcome.clone(),
            Some(Slot::InFlight(rx)) if rx.has_changed().is_ok() => {
                let mut rx = rx.clone();
                drop(slots);
                debug!(session_id = %session_id, "joining in-flight hydration");
                return match rx.wait_for(Option::is_some).await {
                    Ok(outcome) => outcome.clone().unwrap_or(Hydration::NoSession),
                    Err(_) => Hydration::Degraded(RagEvalError::InvalidState(
                        "hydration was abandoned before completing".to_string(),
                    )),
                };
            }
            // Never started, failed before, or abandoned by a cancelled caller.
            _ => {}
        }

        let (tx, rx) = watch::channel(None);
        slots.insert(session_id.clone(), Slot::InFlight(rx));
        drop(slots);

        let (outcome, slot) = match self.load_session(&session_id).await {
            Ok(SessionLoad::Loaded(summary)) => {
                let outcome = Hydration::Restored(summary);
                (outcome.clone(), Slot::Done(outcome))
            }
            Ok(SessionLoad::NoSession) => (Hydration::NoSession, Slot::Done(Hydration::NoSession)),
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "hydration failed, starting without a session");
                (Hydration::Degraded(err.clone()), Slot::Failed(err))
            }
        };

        self.hydrations.lock().await.insert(session_id, slot);
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    /// Where hydration of `session_id` currently stands.
    pub async fn request_state(&self, session_id: &str) -> RequestState {
        match self.hydrations.lock().await.get(session_id) {
            None => RequestState::NotStarted,
            Some(Slot::InFlight(_)) => RequestState::InFlight,
            Some(Slot::Done(outcome)) => RequestState::Done(outcome.clone()),
            Some(Slot::Failed(err)) => RequestState::Failed(err.clone()),
        }
    }
}

/// Drop anything the service returned that belongs to another session.
fn keep_session_entities(session_id: &str, snapshot: &mut SessionSnapshot) {
    fn retain<T: Entity>(session_id: &str, items: &mut Vec<T>) {
        let before = items.len();
        items.retain(|item| item.session_id() == session_id);
        if items.len() != before {
            warn!(
                session_id,
                kind = T::KIND,
                dropped = before - items.len(),
                "dropped entities belonging to another session"
            );
        }
    }

    retain(session_id, &mut snapshot.documents);
    retain(session_id, &mut snapshot.questions);
    retain(session_id, &mut snapshot.configurations);
}
