//! HTTP client for the RAG evaluation service.
//!
//! Every call is a single request with no retry. Non-success statuses are
//! turned into [`RagEvalError::Service`] (or [`RagEvalError::NotFound`] for
//! 404) carrying the server's `detail` message when it sent one.

use crate::config::ServiceConfig;
use crate::error::{RagEvalError, Result};
use crate::models::{
    Configuration, ConfigurationWire, Document, DocumentUpload, LlmResponse, NewConfiguration,
    Question, SessionSnapshot, Verdict,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    detail: serde_json::Value,
}

impl ApiError {
    fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateQuestionRequest<'a> {
    question_string: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RunRagRequest<'a> {
    query_llm: &'a str,
    api_key: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RunJudgeRequest<'a> {
    judge_llm: &'a str,
    api_key: &'a str,
    session_id: &'a str,
}

/// Run responses come either wrapped with the configurations used, or as
/// a bare list of answers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunResponse {
    Wrapped {
        answers: Vec<LlmResponse>,
        #[serde(default, deserialize_with = "crate::models::decodable_configurations")]
        configurations: Vec<Configuration>,
    },
    Bare(Vec<LlmResponse>),
}

/// Output of a batch run, in service emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub answers: Vec<LlmResponse>,
    /// Configurations the service reports having used. May be empty.
    pub configurations: Vec<Configuration>,
}

impl From<RunResponse> for RunOutput {
    fn from(response: RunResponse) -> Self {
        match response {
            RunResponse::Wrapped {
                answers,
                configurations,
            } => Self {
                answers,
                configurations,
            },
            RunResponse::Bare(answers) => Self {
                answers,
                configurations: Vec::new(),
            },
        }
    }
}

/// Client for the evaluation service.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    client: Client,
    api_base: String,
}

impl ServiceClient {
    /// Create a new client with the given service configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagEvalError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Get the URL for an API path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// URL of a plot file. Both names become single escaped path segments.
    fn plot_url(&self, session_id: &str, file_name: &str) -> Result<Url> {
        for segment in [session_id, file_name] {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\'])
            {
                return Err(RagEvalError::validation(format!(
                    "'{}' is not a valid session id or plot file name",
                    segment
                )));
            }
        }

        let mut url = Url::parse(&self.endpoint("plots"))
            .map_err(|e| RagEvalError::Config(format!("invalid api_base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RagEvalError::Config("api_base cannot carry a path".to_string()))?
            .push(session_id)
            .push(file_name);
        Ok(url)
    }

    /// Send a request and map non-success statuses to errors.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiError>(&body) {
            Ok(api_error) => api_error.message(),
            Err(_) if body.trim().is_empty() => format!(
                "{} failed: {}",
                what,
                status.canonical_reason().unwrap_or("unknown status")
            ),
            Err(_) => format!("{} failed: {}", what, body),
        };

        if status == StatusCode::NOT_FOUND {
            return Err(RagEvalError::NotFound(message));
        }

        Err(RagEvalError::Service {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            RagEvalError::InvalidResponse(format!("failed to parse {} response: {}", what, e))
        })
    }

    /// Ask the service for a fresh session id.
    pub async fn create_session(&self) -> Result<String> {
        let url = self.endpoint("create/session");
        debug!(url = %url, "creating session");

        let response = self.send(self.client.post(&url), "create session").await?;
        let created: CreatedSession = Self::decode(response, "create session").await?;

        if created.id.is_empty() {
            return Err(RagEvalError::InvalidResponse(
                "service returned an empty session id".to_string(),
            ));
        }
        Ok(created.id)
    }

    /// Fetch the full snapshot of a session. A 404 becomes `NotFound`.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        let url = self.endpoint("get/session");
        debug!(url = %url, session_id, "loading session");

        let request = self.client.get(&url).query(&[("session_id", session_id)]);
        let response = self.send(request, "load session").await?;
        Self::decode(response, "load session").await
    }

    pub async fn upload_document(
        &self,
        upload: &DocumentUpload,
        session_id: &str,
    ) -> Result<Document> {
        let url = self.endpoint("upload/document");
        debug!(url = %url, file = %upload.file_name, bytes = upload.content.len(), "uploading document");

        let part = Part::bytes(upload.content.clone())
            .file_name(upload.file_name.clone())
            .mime_str(DocumentUpload::CONTENT_TYPE)?;
        let form = Form::new()
            .part("file", part)
            .text("session_id", session_id.to_string());

        let response = self
            .send(self.client.post(&url).multipart(form), "upload document")
            .await?;
        Self::decode(response, "upload document").await
    }

    pub async fn delete_document(&self, document_id: &str, session_id: &str) -> Result<()> {
        self.delete("delete/document", "document_id", document_id, session_id)
            .await
    }

    pub async fn add_question(&self, text: &str, session_id: &str) -> Result<Question> {
        let url = self.endpoint("create/question");
        debug!(url = %url, session_id, "adding question");

        let request = self.client.post(&url).json(&CreateQuestionRequest {
            question_string: text,
            session_id,
        });
        let response = self.send(request, "add question").await?;
        Self::decode(response, "add question").await
    }

    pub async fn delete_question(&self, question_id: &str, session_id: &str) -> Result<()> {
        self.delete("delete/question", "question_id", question_id, session_id)
            .await
    }

    pub async fn add_configuration(
        &self,
        draft: &NewConfiguration,
        session_id: &str,
    ) -> Result<Configuration> {
        let url = self.endpoint("create/configuration");
        debug!(url = %url, session_id, strategy = %draft.strategy, "adding configuration");

        let request = self
            .client
            .post(&url)
            .json(&ConfigurationWire::for_create(draft, session_id));
        let response = self.send(request, "add configuration").await?;
        Self::decode(response, "add configuration").await
    }

    pub async fn delete_configuration(
        &self,
        configuration_id: &str,
        session_id: &str,
    ) -> Result<()> {
        self.delete(
            "delete/configuration",
            "configuration_id",
            configuration_id,
            session_id,
        )
        .await
    }

    async fn delete(
        &self,
        path: &str,
        id_param: &str,
        id: &str,
        session_id: &str,
    ) -> Result<()> {
        let url = self.endpoint(path);
        debug!(url = %url, id, session_id, "deleting");

        let request = self
            .client
            .delete(&url)
            .query(&[(id_param, id), ("session_id", session_id)]);
        self.send(request, path).await?;
        Ok(())
    }

    /// Run every question against every configuration.
    pub async fn run_evaluation(
        &self,
        query_llm: &str,
        api_key: &str,
        session_id: &str,
    ) -> Result<RunOutput> {
        let url = self.endpoint("run/rag");
        debug!(url = %url, session_id, query_llm, "running evaluation");

        let request = self.client.post(&url).json(&RunRagRequest {
            query_llm,
            api_key,
            session_id,
        });
        let response = self.send(request, "evaluation run").await?;
        let run: RunResponse = Self::decode(response, "evaluation run").await?;
        Ok(run.into())
    }

    /// Ask the judge model to compare the last run's answers.
    pub async fn run_judge(
        &self,
        judge_llm: &str,
        api_key: &str,
        session_id: &str,
    ) -> Result<Verdict> {
        let url = self.endpoint("run/judge");
        debug!(url = %url, session_id, judge_llm, "running judge");

        let request = self.client.post(&url).json(&RunJudgeRequest {
            judge_llm,
            api_key,
            session_id,
        });
        let response = self.send(request, "judge").await?;
        Self::decode(response, "judge").await
    }

    /// Download a visualization image produced during a run.
    pub async fn fetch_visualization(&self, session_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let url = self.plot_url(session_id, file_name)?;
        debug!(url = %url, "fetching visualization");

        let response = self.send(self.client.get(url), "fetch visualization").await?;
        Ok(response.bytes().await?.to_vec())
    }
}
