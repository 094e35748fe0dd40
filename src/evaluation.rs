//! Batch evaluation runs and result correlation.
//!
//! The service answers every question with every configuration and returns
//! one flat list. Results tagged with a `configuration_id` are matched by
//! id; untagged results are matched cyclically, result `i` belonging to
//! configuration `i mod N`. Correlation only affects how results are
//! grouped for display.

use crate::api::{RunOutput, ServiceClient};
use crate::error::{RagEvalError, Result};
use crate::models::{mean, Configuration, LlmResponse};
use crate::workspace::{Phase, Stage, Workspace};
use serde::Serialize;
use tracing::{info, warn};

/// Configuration index for flat result `index` when results cycle over
/// `configurations` entries.
pub fn correlate_index(index: usize, configurations: usize) -> Option<usize> {
    (configurations > 0).then(|| index % configurations)
}

/// Results of one successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRun {
    pub session_id: String,
    pub query_llm: String,
    /// Answers in service emission order.
    pub answers: Vec<LlmResponse>,
    /// Configurations the answers correlate against.
    pub configurations: Vec<Configuration>,
}

/// One answer with the configuration that produced it.
#[derive(Debug, Clone, Copy)]
pub struct CorrelatedResult<'a> {
    pub index: usize,
    pub response: &'a LlmResponse,
    pub configuration: Option<&'a Configuration>,
}

/// Aggregate scores of one configuration across all its answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    pub configuration: Configuration,
    pub results: usize,
    pub mean_rus: Option<f64>,
    pub mean_similarity: Option<f64>,
    pub mean_relevance: Option<f64>,
}

impl EvaluationRun {
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Index into `configurations` of the configuration behind result `index`.
    pub fn configuration_index(&self, index: usize) -> Option<usize> {
        let response = self.answers.get(index)?;

        if let Some(id) = &response.configuration_id {
            if let Some(position) = self.configurations.iter().position(|c| &c.id == id) {
                return Some(position);
            }
        }

        correlate_index(index, self.configurations.len())
    }

    pub fn configuration_for(&self, index: usize) -> Option<&Configuration> {
        self.configuration_index(index)
            .and_then(|i| self.configurations.get(i))
    }

    /// Every answer paired with its configuration, in emission order.
    pub fn correlated(&self) -> Vec<CorrelatedResult<'_>> {
        self.answers
            .iter()
            .enumerate()
            .map(|(index, response)| CorrelatedResult {
                index,
                response,
                configuration: self.configuration_for(index),
            })
            .collect()
    }

    /// Per-configuration averages, in configuration order.
    pub fn summaries(&self) -> Vec<ConfigurationSummary> {
        let mut grouped: Vec<Vec<&LlmResponse>> = vec![Vec::new(); self.configurations.len()];
        for (index, response) in self.answers.iter().enumerate() {
            if let Some(slot) = self.configuration_index(index) {
                grouped[slot].push(response);
            }
        }

        self.configurations
            .iter()
            .zip(grouped)
            .map(|(configuration, responses)| ConfigurationSummary {
                configuration: configuration.clone(),
                results: responses.len(),
                mean_rus: mean(
                    responses
                        .iter()
                        .filter_map(|r| r.rus_metrics.map(|m| m.rus)),
                ),
                mean_similarity: mean(responses.iter().filter_map(|r| r.mean_similarity())),
                mean_relevance: mean(responses.iter().filter_map(|r| r.mean_relevance())),
            })
            .collect()
    }
}

/// Triggers batch runs and keeps the latest successful one.
#[derive(Debug, Clone)]
pub struct EvaluationRunner {
    client: ServiceClient,
    workspace: Workspace,
}

impl EvaluationRunner {
    pub fn new(client: ServiceClient, workspace: Workspace) -> Self {
        Self { client, workspace }
    }

    /// Run every question against every configuration of `session_id`.
    ///
    /// Refused without a request unless the session is active and has at
    /// least one document, question and configuration. A failed run keeps
    /// no results.
    pub async fn run(&self, query_llm: &str, api_key: &str, session_id: &str) -> Result<EvaluationRun> {
        if session_id.trim().is_empty() {
            return Err(RagEvalError::validation("session id is required"));
        }
        if query_llm.trim().is_empty() {
            return Err(RagEvalError::validation("query model is required"));
        }
        if api_key.is_empty() {
            return Err(RagEvalError::validation("API key is required"));
        }

        let (epoch, configurations) = {
            let mut state = self.workspace.write().await;

            if !state.is_active(session_id) {
                return Err(RagEvalError::validation(format!(
                    "session {} is not the active session",
                    session_id
                )));
            }
            if state.phase.is_busy() {
                return Err(RagEvalError::InvalidState(format!(
                    "cannot start an evaluation while {}",
                    state.phase
                )));
            }

            let missing: Vec<&str> = [
                ("a document", state.documents.is_empty()),
                ("a question", state.questions.is_empty()),
                ("a configuration", state.configurations.is_empty()),
            ]
            .into_iter()
            .filter_map(|(what, empty)| empty.then_some(what))
            .collect();

            if !missing.is_empty() {
                return Err(RagEvalError::validation(format!(
                    "add {} before running an evaluation",
                    missing.join(", ")
                )));
            }

            state.phase = Phase::RunningRag;
            (state.epoch, state.configurations.clone())
        };

        info!(
            session_id,
            query_llm,
            configurations = configurations.len(),
            "starting evaluation run"
        );

        // The request runs in its own task so a dropped caller cannot leave
        // the workflow stuck in RunningRag.
        let client = self.client.clone();
        let workspace = self.workspace.clone();
        let api_key = api_key.to_string();
        let query_llm = query_llm.to_string();
        let session_id = session_id.to_string();

        let task = tokio::spawn(async move {
            let outcome = client
                .run_evaluation(&query_llm, &api_key, &session_id)
                .await;
            Self::finish(&workspace, epoch, session_id, query_llm, configurations, outcome).await
        });

        task.await
            .map_err(|e| RagEvalError::InvalidState(format!("evaluation task failed: {}", e)))?
    }

    async fn finish(
        workspace: &Workspace,
        epoch: u64,
        session_id: String,
        query_llm: String,
        fallback_configurations: Vec<Configuration>,
        outcome: Result<RunOutput>,
    ) -> Result<EvaluationRun> {
        let mut state = workspace.write().await;

        if !state.is_same_epoch(epoch) || !state.is_active(&session_id) {
            warn!(session_id = %session_id, "discarding evaluation results for a session that is no longer active");
            return Err(RagEvalError::Superseded(format!(
                "evaluation of session {} finished after the session changed",
                session_id
            )));
        }

        match outcome {
            Ok(output) => {
                let configurations = if output.configurations.is_empty() {
                    fallback_configurations
                } else {
                    output.configurations
                };

                let run = EvaluationRun {
                    session_id,
                    query_llm,
                    answers: output.answers,
                    configurations,
                };

                state.phase = Phase::RagDone;
                state.last_run = Some(run.clone());
                state.verdict = None;
                info!(answers = run.answers.len(), "evaluation run finished");
                Ok(run)
            }
            Err(err) => {
                state.phase = Phase::Failed(Stage::Rag);
                state.last_run = None;
                warn!(error = %err, "evaluation run failed");
                Err(err)
            }
        }
    }

    pub async fn last_run(&self) -> Option<EvaluationRun> {
        self.workspace.last_run().await
    }

    pub async fn phase(&self) -> Phase {
        self.workspace.phase().await
    }
}
