//! Data model shared with the evaluation service.
//!
//! Every entity here is created by the service and echoed back with its
//! canonical id, so the client never invents ids. Decoding is lenient about
//! null and missing optional fields because the service emits both.

use crate::error::{RagEvalError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// Maximum number of visualization images attached to one answer.
pub const MAX_VISUALIZATIONS: usize = 3;

/// Anything stored in a session-scoped mirror.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in logs and errors.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn session_id(&self) -> &str;
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_extension: String,
    pub session_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processed: bool,
}

impl Entity for Document {
    const KIND: &'static str = "document";

    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// A question asked against every configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(alias = "text")]
    pub question_string: String,
    pub session_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Question {
    const KIND: &'static str = "question";

    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// How documents are split into retrievable chunks.
///
/// Each strategy carries exactly the one size that means something for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    Fixed { chunk_size: u32 },
    Sentence { sentence_size: u32 },
    Paragraph { paragraph_size: u32 },
    Page { page_size: u32 },
    Tokens { token_size: u32 },
}

impl ChunkingStrategy {
    /// Size of a stored configuration whose size the service did not report.
    /// Services that keep only `chunk_size` lose the strategy-specific size.
    pub const UNREPORTED_SIZE: u32 = 0;

    /// Names accepted by [`ChunkingStrategy::from_parts`].
    pub const NAMES: [&'static str; 5] = ["fixed", "sentence", "paragraph", "page", "tokens"];

    /// Build a strategy from its wire name and size.
    pub fn from_parts(name: &str, size: u32) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed { chunk_size: size }),
            "sentence" => Ok(Self::Sentence {
                sentence_size: size,
            }),
            "paragraph" => Ok(Self::Paragraph {
                paragraph_size: size,
            }),
            "page" => Ok(Self::Page { page_size: size }),
            "tokens" => Ok(Self::Tokens { token_size: size }),
            other => Err(RagEvalError::validation(format!(
                "unknown chunking strategy '{}', expected one of {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }

    /// Wire name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Sentence { .. } => "sentence",
            Self::Paragraph { .. } => "paragraph",
            Self::Page { .. } => "page",
            Self::Tokens { .. } => "tokens",
        }
    }

    /// The one meaningful size.
    pub fn size(&self) -> u32 {
        match *self {
            Self::Fixed { chunk_size } => chunk_size,
            Self::Sentence { sentence_size } => sentence_size,
            Self::Paragraph { paragraph_size } => paragraph_size,
            Self::Page { page_size } => page_size,
            Self::Tokens { token_size } => token_size,
        }
    }

    /// Wire field that carries the size.
    pub fn size_field(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "chunk_size",
            Self::Sentence { .. } => "sentence_size",
            Self::Paragraph { .. } => "paragraph_size",
            Self::Page { .. } => "page_size",
            Self::Tokens { .. } => "token_size",
        }
    }

    pub fn size_reported(&self) -> bool {
        self.size() != Self::UNREPORTED_SIZE
    }

    fn size_text(&self) -> String {
        if self.size_reported() {
            self.size().to_string()
        } else {
            "?".to_string()
        }
    }
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.size_text())
    }
}

/// One retrieval pipeline to compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigurationWire", into = "ConfigurationWire")]
pub struct Configuration {
    pub id: String,
    pub name: Option<String>,
    pub session_id: String,
    pub created_at: Option<String>,
    pub strategy: ChunkingStrategy,
    pub embedding_model: String,
    pub similarity_metric: String,
    pub num_chunks: u32,
}

impl Configuration {
    /// Display label: the name when set, otherwise `strategy/size/model`.
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{}/{}/{}",
                self.strategy.name(),
                self.strategy.size_text(),
                self.embedding_model
            ),
        }
    }
}

impl Entity for Configuration {
    const KIND: &'static str = "configuration";

    fn id(&self) -> &str {
        &self.id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Flat wire shape of a configuration: strategy name plus one optional size
/// field per strategy. Older payloads put every size in `chunk_size`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ConfigurationWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub chunking_strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    pub embedding_model: String,
    pub similarity_metric: String,
    pub num_chunks: u32,
}

impl ConfigurationWire {
    fn with_strategy(mut self, strategy: ChunkingStrategy) -> Self {
        self.chunking_strategy = strategy.name().to_string();
        match strategy {
            ChunkingStrategy::Fixed { chunk_size } => self.chunk_size = Some(chunk_size),
            ChunkingStrategy::Sentence { sentence_size } => {
                self.sentence_size = Some(sentence_size)
            }
            ChunkingStrategy::Paragraph { paragraph_size } => {
                self.paragraph_size = Some(paragraph_size)
            }
            ChunkingStrategy::Page { page_size } => self.page_size = Some(page_size),
            ChunkingStrategy::Tokens { token_size } => self.token_size = Some(token_size),
        }
        self
    }

    /// Request body for creating `draft` in `session_id`.
    pub(crate) fn for_create(draft: &NewConfiguration, session_id: &str) -> Self {
        Self {
            name: draft.name.clone(),
            session_id: Some(session_id.to_string()),
            embedding_model: draft.embedding_model.clone(),
            similarity_metric: draft.similarity_metric.clone(),
            num_chunks: draft.num_chunks,
            ..Default::default()
        }
        .with_strategy(draft.strategy)
    }

    fn strategy(&self) -> std::result::Result<ChunkingStrategy, String> {
        let specific = match self.chunking_strategy.to_ascii_lowercase().as_str() {
            "fixed" => None,
            "sentence" => self.sentence_size,
            "paragraph" => self.paragraph_size,
            "page" => self.page_size,
            "tokens" => self.token_size,
            other => return Err(format!("unknown chunking strategy '{}'", other)),
        };

        let size = specific
            .or(self.chunk_size)
            .unwrap_or(ChunkingStrategy::UNREPORTED_SIZE);

        ChunkingStrategy::from_parts(&self.chunking_strategy, size).map_err(|e| e.to_string())
    }
}

impl TryFrom<ConfigurationWire> for Configuration {
    type Error = String;

    fn try_from(wire: ConfigurationWire) -> std::result::Result<Self, Self::Error> {
        let strategy = wire.strategy()?;
        Ok(Self {
            id: wire.id.ok_or("configuration is missing its id")?,
            session_id: wire
                .session_id
                .ok_or("configuration is missing its session_id")?,
            name: wire.name,
            created_at: wire.created_at,
            strategy,
            embedding_model: wire.embedding_model,
            similarity_metric: wire.similarity_metric,
            num_chunks: wire.num_chunks,
        })
    }
}

impl From<Configuration> for ConfigurationWire {
    fn from(config: Configuration) -> Self {
        Self {
            id: Some(config.id),
            name: config.name,
            session_id: Some(config.session_id),
            created_at: config.created_at,
            embedding_model: config.embedding_model,
            similarity_metric: config.similarity_metric,
            num_chunks: config.num_chunks,
            ..Default::default()
        }
        .with_strategy(config.strategy)
    }
}

/// A configuration as entered by the user, before the service assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConfiguration {
    pub name: Option<String>,
    pub strategy: ChunkingStrategy,
    pub embedding_model: String,
    pub similarity_metric: String,
    pub num_chunks: u32,
}

impl NewConfiguration {
    pub fn new(
        strategy: ChunkingStrategy,
        embedding_model: impl Into<String>,
        similarity_metric: impl Into<String>,
        num_chunks: u32,
    ) -> Self {
        Self {
            name: None,
            strategy,
            embedding_model: embedding_model.into(),
            similarity_metric: similarity_metric.into(),
            num_chunks,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reject drafts the service would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.strategy.size() == 0 {
            return Err(RagEvalError::validation(format!(
                "{} must be greater than zero",
                self.strategy.size_field()
            )));
        }
        if self.num_chunks == 0 {
            return Err(RagEvalError::validation(
                "num_chunks must be greater than zero",
            ));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(RagEvalError::validation("embedding model is required"));
        }
        if self.similarity_metric.trim().is_empty() {
            return Err(RagEvalError::validation("similarity metric is required"));
        }
        Ok(())
    }
}

/// A retrieved chunk as reported for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_number: u32,
    pub text: String,
    pub relevance_score: f64,
    pub similarity_score: f64,
}

/// Composite retrieval utilization scores, computed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RusMetrics {
    pub rus: f64,
    pub normalized_dcr: f64,
    pub scaled_correlation: f64,
    pub wasted_similarity_penalty: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_plots<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut plots = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(plot)) => vec![plot],
        Some(OneOrMany::Many(plots)) => plots,
    };
    plots.retain(|p| !p.is_empty());
    plots.truncate(MAX_VISUALIZATIONS);
    Ok(plots)
}

/// The answer one configuration produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub question: String,
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: Vec<Chunk>,
    /// Image references: inline data or asset file names.
    #[serde(default, deserialize_with = "deserialize_plots")]
    pub visualization_plot: Vec<String>,
    #[serde(default)]
    pub rus_metrics: Option<RusMetrics>,
    /// Set by services that tag results with their origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}

impl LlmResponse {
    pub fn mean_similarity(&self) -> Option<f64> {
        mean(self.chunks.iter().map(|c| c.similarity_score))
    }

    pub fn mean_relevance(&self) -> Option<f64> {
        mean(self.chunks.iter().map(|c| c.relevance_score))
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Full server-side state of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub documents: Vec<Document>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "decodable_configurations")]
    pub configurations: Vec<Configuration>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<LlmResponse>,
}

/// Keep the configurations that decode; log and skip the rest so one bad
/// entry does not fail the whole session.
pub(crate) fn decodable_configurations<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<Configuration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Configuration>(value) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "skipping configuration the client cannot decode");
                None
            }
        })
        .collect())
}

/// The judge model's comparison of all configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub recommendation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: Vec<String>,
}

/// A file about to be uploaded.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl DocumentUpload {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
    const PDF_MAGIC: &'static [u8] = b"%PDF-";

    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| RagEvalError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        Ok(Self { file_name, content })
    }

    /// Only PDFs are accepted: the name must end in `.pdf` and the bytes
    /// must start with the PDF header.
    pub fn check_type(&self) -> Result<()> {
        let has_pdf_extension = std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        if !has_pdf_extension {
            return Err(RagEvalError::UploadRejected(format!(
                "'{}' is not a PDF file",
                self.file_name
            )));
        }

        if !self.content.starts_with(Self::PDF_MAGIC) {
            return Err(RagEvalError::UploadRejected(format!(
                "'{}' does not contain PDF data",
                self.file_name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_configuration_from_flat_wire() {
        let value = json!({
            "id": "c1",
            "session_id": "s1",
            "chunking_strategy": "sentence",
            "token_size": null,
            "sentence_size": 3,
            "paragraph_size": null,
            "page_size": null,
            "embedding_model": "sentence-transformer",
            "similarity_metric": "cosine",
            "num_chunks": 4
        });
        let config: Configuration = serde_json::from_value(value).unwrap();
        assert_eq!(
            config.strategy,
            ChunkingStrategy::Sentence { sentence_size: 3 }
        );
        assert_eq!(config.label(), "sentence/3/sentence-transformer");
    }

    #[test]
    fn test_configuration_falls_back_to_chunk_size() {
        let value = json!({
            "id": "c1",
            "session_id": "s1",
            "chunking_strategy": "tokens",
            "chunk_size": 256,
            "embedding_model": "bert",
            "similarity_metric": "euclidean",
            "num_chunks": 2
        });
        let config: Configuration = serde_json::from_value(value).unwrap();
        assert_eq!(config.strategy, ChunkingStrategy::Tokens { token_size: 256 });
    }

    #[test]
    fn test_configuration_without_size_decodes_as_unreported() {
        let value = json!({
            "id": "c1",
            "session_id": "s1",
            "chunking_strategy": "sentence",
            "chunk_size": null,
            "embedding_model": "bert",
            "similarity_metric": "cosine",
            "num_chunks": 2
        });
        let config: Configuration = serde_json::from_value(value).unwrap();
        assert_eq!(config.strategy, ChunkingStrategy::Sentence { sentence_size: 0 });
        assert!(!config.strategy.size_reported());
        assert_eq!(config.label(), "sentence/?/bert");
        assert_eq!(config.strategy.to_string(), "sentence(?)");
    }

    #[test]
    fn test_snapshot_skips_undecodable_configurations() {
        let value = json!({
            "id": "s1",
            "configurations": [
                {"id": "c1", "session_id": "s1", "chunking_strategy": "semantic",
                 "chunk_size": 3, "embedding_model": "bert",
                 "similarity_metric": "cosine", "num_chunks": 2},
                {"id": "c2", "session_id": "s1", "chunking_strategy": "fixed",
                 "chunk_size": 500, "embedding_model": "ada-002",
                 "similarity_metric": "cosine", "num_chunks": 3}
            ],
            "questions": [{"id": "q1", "question_string": "Why?", "session_id": "s1"}]
        });
        let snapshot: SessionSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.configurations.len(), 1);
        assert_eq!(snapshot.configurations[0].id, "c2");
        assert_eq!(snapshot.questions.len(), 1);
    }

    #[test]
    fn test_configuration_serializes_only_active_size() {
        let config = Configuration {
            id: "c1".into(),
            name: Some("baseline".into()),
            session_id: "s1".into(),
            created_at: None,
            strategy: ChunkingStrategy::Fixed { chunk_size: 500 },
            embedding_model: "ada-002".into(),
            similarity_metric: "cosine".into(),
            num_chunks: 3,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["chunking_strategy"], "fixed");
        assert_eq!(value["chunk_size"], 500);
        assert!(value.get("sentence_size").is_none());
        assert!(value.get("token_size").is_none());
        assert_eq!(config.label(), "baseline");
    }

    #[test]
    fn test_create_body_has_no_id() {
        let draft = NewConfiguration::new(
            ChunkingStrategy::Paragraph { paragraph_size: 2 },
            "roberta",
            "jaccard",
            5,
        );
        let value = serde_json::to_value(ConfigurationWire::for_create(&draft, "s9")).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["session_id"], "s9");
        assert_eq!(value["paragraph_size"], 2);
    }

    #[test]
    fn test_new_configuration_validation() {
        let zero_size =
            NewConfiguration::new(ChunkingStrategy::Page { page_size: 0 }, "bert", "cosine", 3);
        assert!(matches!(
            zero_size.validate(),
            Err(RagEvalError::Validation(msg)) if msg.contains("page_size")
        ));

        let no_model =
            NewConfiguration::new(ChunkingStrategy::Page { page_size: 1 }, " ", "cosine", 3);
        assert!(no_model.validate().is_err());

        let ok = NewConfiguration::new(ChunkingStrategy::Page { page_size: 1 }, "bert", "cosine", 3);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_unknown_strategy() {
        assert!(ChunkingStrategy::from_parts("semantic", 3).is_err());
        assert_eq!(
            ChunkingStrategy::from_parts("Tokens", 128).unwrap(),
            ChunkingStrategy::Tokens { token_size: 128 }
        );
    }

    #[test]
    fn test_question_accepts_text_alias() {
        let q: Question =
            serde_json::from_value(json!({"id": "q1", "text": "What is RUS?", "session_id": "s1"}))
                .unwrap();
        assert_eq!(q.question_string, "What is RUS?");
    }

    #[test]
    fn test_visualization_plot_shapes() {
        let single: LlmResponse = serde_json::from_value(json!({
            "question": "q", "answer": "a", "chunks": [], "visualization_plot": "abc"
        }))
        .unwrap();
        assert_eq!(single.visualization_plot, vec!["abc".to_string()]);

        let none: LlmResponse = serde_json::from_value(json!({
            "question": "q", "answer": "a", "visualization_plot": null
        }))
        .unwrap();
        assert!(none.visualization_plot.is_empty());

        let many: LlmResponse = serde_json::from_value(json!({
            "question": "q", "answer": "a",
            "visualization_plot": ["p1.png", "p2.png", "p3.png", "p4.png"]
        }))
        .unwrap();
        assert_eq!(many.visualization_plot.len(), MAX_VISUALIZATIONS);
    }

    #[test]
    fn test_document_tolerates_nulls() {
        let doc: Document = serde_json::from_value(json!({
            "id": "d1",
            "file_name": "report.pdf",
            "file_path": null,
            "file_type": "application/pdf",
            "file_size": 1024,
            "file_extension": "pdf",
            "session_id": "s1"
        }))
        .unwrap();
        assert_eq!(doc.file_path, "");
        assert!(!doc.processed);
    }

    #[test]
    fn test_pdf_check() {
        let pdf = DocumentUpload::new("Report.PDF", b"%PDF-1.7\n...".to_vec());
        assert!(pdf.check_type().is_ok());

        let txt = DocumentUpload::new("notes.txt", b"%PDF-1.7".to_vec());
        assert!(matches!(txt.check_type(), Err(RagEvalError::UploadRejected(_))));

        let fake = DocumentUpload::new("fake.pdf", b"hello".to_vec());
        assert!(matches!(fake.check_type(), Err(RagEvalError::UploadRejected(_))));
    }

    #[test]
    fn test_chunk_means() {
        let response = LlmResponse {
            question: "q".into(),
            answer: "a".into(),
            chunks: vec![
                Chunk {
                    chunk_number: 1,
                    text: "x".into(),
                    relevance_score: 1.0,
                    similarity_score: 0.5,
                },
                Chunk {
                    chunk_number: 2,
                    text: "y".into(),
                    relevance_score: 0.0,
                    similarity_score: 0.25,
                },
            ],
            visualization_plot: vec![],
            rus_metrics: None,
            configuration_id: None,
            question_id: None,
        };
        assert_eq!(response.mean_relevance(), Some(0.5));
        assert_eq!(response.mean_similarity(), Some(0.375));
    }
}
