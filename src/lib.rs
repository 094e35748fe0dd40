//! RAG Evaluator - client-side orchestration for comparing retrieval pipelines.
//!
//! A remote evaluation service does the chunking, embedding, retrieval and
//! judging. This library manages everything on the client side of that
//! service: which session is active, the documents, questions and
//! configurations in it, running an evaluation across all configurations,
//! matching the flat result list back to configurations, and asking a judge
//! model for a recommendation.
//!
//! # Quick Start
//!
//! ```no_run
//! use rag_evaluator::{
//!     config::Config,
//!     models::{ChunkingStrategy, DocumentUpload, NewConfiguration},
//!     session::Hydration,
//!     Workbench,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let bench = Workbench::from_config(&config)?;
//!
//!     // Resume the last session, or start a new one
//!     let session_id = match bench.session.hydrate_on_start().await {
//!         Hydration::Restored(summary) => summary.session_id,
//!         _ => bench.session.create_session().await?,
//!     };
//!
//!     let upload = DocumentUpload::from_path(Path::new("report.pdf"))?;
//!     bench.documents.create(&upload, &session_id).await?;
//!     bench.questions.create("What drove revenue growth?", &session_id).await?;
//!
//!     let draft = NewConfiguration::new(
//!         ChunkingStrategy::Sentence { sentence_size: 3 },
//!         "sentence-transformer",
//!         "cosine",
//!         3,
//!     );
//!     bench.configurations.create(&draft, &session_id).await?;
//!
//!     let run = bench
//!         .evaluation
//!         .run(&config.models.query_llm, &config.models.api_key, &session_id)
//!         .await?;
//!     for result in run.correlated() {
//!         println!("{:?}: {}", result.configuration.map(|c| c.label()), result.response.answer);
//!     }
//!
//!     let verdict = bench
//!         .judge
//!         .evaluate(&config.models.judge_llm, &config.models.api_key, &session_id)
//!         .await?;
//!     println!("{}", verdict.recommendation);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **SessionController**: session id, its persistence, startup hydration
//! - **CollectionManager**: create/delete with a confirmed-state mirror
//! - **EvaluationRunner**: batch runs and result correlation
//! - **JudgeRunner**: the current verdict
//! - **Workspace**: the shared state all of the above read and write

pub mod api;
pub mod collections;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod judge;
pub mod models;
pub mod persistence;
pub mod session;
pub mod workbench;
pub mod workspace;

// Re-export commonly used types
pub use api::ServiceClient;
pub use collections::CollectionManager;
pub use config::Config;
pub use error::{RagEvalError, Result};
pub use evaluation::{EvaluationRun, EvaluationRunner};
pub use judge::JudgeRunner;
pub use persistence::SessionStore;
pub use session::{Hydration, SessionController};
pub use workbench::Workbench;
pub use workspace::{Phase, Workspace};
