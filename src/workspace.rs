//! Shared client state.
//!
//! One lock guards the active session id, the generation and epoch
//! counters, the collection mirrors, the workflow phase, and the latest run
//! and verdict. Replacing a whole session is a single write. Only the
//! controllers and managers in this crate write through it; everyone else
//! gets copies.

use crate::evaluation::EvaluationRun;
use crate::models::{Configuration, Document, Entity, LlmResponse, Question, SessionSnapshot, Verdict};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which step of the workflow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rag,
    Judge,
}

/// Evaluation workflow state.
///
/// `Failed` is not terminal: the action that failed may be triggered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    RunningRag,
    RagDone,
    RunningJudge,
    JudgeDone,
    Failed(Stage),
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::RunningRag | Phase::RunningJudge)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Phase::Idle => "idle",
            Phase::RunningRag => "running evaluation",
            Phase::RagDone => "evaluation done",
            Phase::RunningJudge => "running judge",
            Phase::JudgeDone => "judge done",
            Phase::Failed(Stage::Rag) => "evaluation failed",
            Phase::Failed(Stage::Judge) => "judge failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub(crate) session_id: Option<String>,
    pub(crate) generation: u64,
    pub(crate) epoch: u64,
    pub(crate) documents: Vec<Document>,
    pub(crate) questions: Vec<Question>,
    pub(crate) configurations: Vec<Configuration>,
    pub(crate) answers: Vec<LlmResponse>,
    pub(crate) phase: Phase,
    pub(crate) last_run: Option<EvaluationRun>,
    pub(crate) verdict: Option<Verdict>,
}

impl WorkspaceState {
    /// Start a new session operation. Responses tagged with an older
    /// generation must be discarded.
    pub(crate) fn advance_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// True while no reset happened since `epoch` was read. A failed load
    /// advances the generation but not the epoch.
    pub(crate) fn is_same_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Drop everything and make `session_id` active.
    pub(crate) fn reset(&mut self, session_id: Option<String>) {
        self.epoch += 1;
        self.session_id = session_id;
        self.documents.clear();
        self.questions.clear();
        self.configurations.clear();
        self.answers.clear();
        self.phase = Phase::Idle;
        self.last_run = None;
        self.verdict = None;
    }

    /// Replace every collection with the snapshot in one step.
    pub(crate) fn apply_snapshot(&mut self, session_id: String, snapshot: SessionSnapshot) {
        self.reset(Some(session_id));
        self.documents = snapshot.documents;
        self.questions = snapshot.questions;
        self.configurations = snapshot.configurations;
        self.answers = snapshot.answers;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }
}

/// Entities that live in one of the workspace mirrors.
pub trait Mirrored: Entity {
    fn mirror(state: &WorkspaceState) -> &Vec<Self>;

    fn mirror_mut(state: &mut WorkspaceState) -> &mut Vec<Self>;
}

impl Mirrored for Document {
    fn mirror(state: &WorkspaceState) -> &Vec<Self> {
        &state.documents
    }

    fn mirror_mut(state: &mut WorkspaceState) -> &mut Vec<Self> {
        &mut state.documents
    }
}

impl Mirrored for Question {
    fn mirror(state: &WorkspaceState) -> &Vec<Self> {
        &state.questions
    }

    fn mirror_mut(state: &mut WorkspaceState) -> &mut Vec<Self> {
        &mut state.questions
    }
}

impl Mirrored for Configuration {
    fn mirror(state: &WorkspaceState) -> &Vec<Self> {
        &state.configurations
    }

    fn mirror_mut(state: &mut WorkspaceState) -> &mut Vec<Self> {
        &mut state.configurations
    }
}

/// Cheap handle to the shared state.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    inner: Arc<RwLock<WorkspaceState>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, WorkspaceState> {
        self.inner.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, WorkspaceState> {
        self.inner.write().await
    }

    pub async fn session_id(&self) -> Option<String> {
        self.read().await.session_id.clone()
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.read().await.documents.clone()
    }

    pub async fn questions(&self) -> Vec<Question> {
        self.read().await.questions.clone()
    }

    pub async fn configurations(&self) -> Vec<Configuration> {
        self.read().await.configurations.clone()
    }

    /// Answers stored server-side with the session.
    pub async fn stored_answers(&self) -> Vec<LlmResponse> {
        self.read().await.answers.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.read().await.phase
    }

    pub async fn last_run(&self) -> Option<EvaluationRun> {
        self.read().await.last_run.clone()
    }

    pub async fn verdict(&self) -> Option<Verdict> {
        self.read().await.verdict.clone()
    }
}
