//! Judge runs over the latest evaluation.

use crate::api::ServiceClient;
use crate::error::{RagEvalError, Result};
use crate::models::Verdict;
use crate::workspace::{Phase, Stage, Workspace};
use tracing::{info, warn};

/// Asks the judge model to compare configurations and holds the verdict.
#[derive(Debug, Clone)]
pub struct JudgeRunner {
    client: ServiceClient,
    workspace: Workspace,
}

impl JudgeRunner {
    pub fn new(client: ServiceClient, workspace: Workspace) -> Self {
        Self { client, workspace }
    }

    /// Judge the last successful run of `session_id`.
    ///
    /// Refused without a request when there is no non-empty run for the
    /// session. On success the verdict replaces any previous one; on
    /// failure the previous verdict is kept.
    pub async fn evaluate(&self, judge_llm: &str, api_key: &str, session_id: &str) -> Result<Verdict> {
        if session_id.trim().is_empty() {
            return Err(RagEvalError::validation("session id is required"));
        }
        if judge_llm.trim().is_empty() {
            return Err(RagEvalError::validation("judge model is required"));
        }
        if api_key.is_empty() {
            return Err(RagEvalError::validation("API key is required"));
        }

        let epoch = {
            let mut state = self.workspace.write().await;

            if state.phase.is_busy() {
                return Err(RagEvalError::InvalidState(format!(
                    "cannot start the judge while {}",
                    state.phase
                )));
            }

            let has_results = state
                .last_run
                .as_ref()
                .is_some_and(|run| run.session_id == session_id && !run.is_empty());
            if !state.is_active(session_id) || !has_results {
                return Err(RagEvalError::InvalidState(
                    "run an evaluation with results before asking the judge".to_string(),
                ));
            }

            state.phase = Phase::RunningJudge;
            state.epoch
        };

        info!(session_id, judge_llm, "starting judge");

        let client = self.client.clone();
        let workspace = self.workspace.clone();
        let judge_llm = judge_llm.to_string();
        let api_key = api_key.to_string();
        let session_id = session_id.to_string();

        let task = tokio::spawn(async move {
            let outcome = client.run_judge(&judge_llm, &api_key, &session_id).await;

            let mut state = workspace.write().await;
            if !state.is_same_epoch(epoch) || !state.is_active(&session_id) {
                warn!(session_id = %session_id, "discarding verdict for a session that is no longer active");
                return Err(RagEvalError::Superseded(format!(
                    "judge of session {} finished after the session changed",
                    session_id
                )));
            }

            match outcome {
                Ok(verdict) => {
                    state.phase = Phase::JudgeDone;
                    state.verdict = Some(verdict.clone());
                    info!(insights = verdict.analysis.len(), "judge finished");
                    Ok(verdict)
                }
                Err(err) => {
                    state.phase = Phase::Failed(Stage::Judge);
                    warn!(error = %err, "judge failed");
                    Err(err)
                }
            }
        });

        task.await
            .map_err(|e| RagEvalError::InvalidState(format!("judge task failed: {}", e)))?
    }

    /// The single current verdict, if any.
    pub async fn verdict(&self) -> Option<Verdict> {
        self.workspace.verdict().await
    }
}
