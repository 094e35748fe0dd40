//! RAG Evaluator CLI
//!
//! Manage a session's documents, questions and retrieval configurations,
//! then run them against the evaluation service and ask a judge to pick one.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rag_evaluator::{
    config::Config,
    evaluation::EvaluationRun,
    models::{ChunkingStrategy, DocumentUpload, NewConfiguration},
    session::{Hydration, SessionLoad},
    Workbench,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// RAG Evaluator - compare retrieval pipeline configurations
#[derive(Parser)]
#[command(name = "rag-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log requests and state changes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the active session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Manage documents (PDF only)
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Manage questions
    Questions {
        #[command(subcommand)]
        action: QuestionsAction,
    },

    /// Manage retrieval configurations
    Configs {
        #[command(subcommand)]
        action: ConfigsAction,
    },

    /// Run every question against every configuration
    Run {
        /// Model that answers the questions (defaults to config)
        #[arg(long)]
        query_llm: Option<String>,

        /// Also ask this judge model to recommend a configuration
        #[arg(long)]
        judge: Option<String>,

        /// Save the run (and verdict) as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download a visualization image from a run
    Plot {
        /// Session the plot belongs to
        session_id: String,

        /// Plot file name as reported in the results
        file_name: String,

        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Start a new, empty session
    New,
    /// Show the active session and its contents
    Show,
    /// Switch to an existing session
    Use { session_id: String },
}

#[derive(Subcommand)]
enum DocsAction {
    /// Upload PDF files; directories are searched for PDFs
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete a document
    Rm { id: String },
    /// List documents
    Ls,
}

#[derive(Subcommand)]
enum QuestionsAction {
    /// Add a question
    Add { text: String },
    /// Delete a question
    Rm { id: String },
    /// List questions
    Ls,
}

#[derive(Subcommand)]
enum ConfigsAction {
    /// Add a configuration
    Add {
        /// Chunking strategy: fixed, sentence, paragraph, page or tokens
        #[arg(long)]
        strategy: String,

        /// Size for the chosen strategy (characters, sentences, paragraphs, pages or tokens)
        #[arg(long)]
        size: u32,

        /// Embedding model, e.g. sentence-transformer, bert, roberta
        #[arg(long, default_value = "sentence-transformer")]
        embedding_model: String,

        /// Similarity metric: cosine, euclidean or jaccard
        #[arg(long, default_value = "cosine")]
        metric: String,

        /// Number of chunks to retrieve per question
        #[arg(short = 'k', long, default_value_t = 3)]
        num_chunks: u32,

        /// Optional display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a configuration
    Rm { id: String },
    /// List configurations
    Ls,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rag_evaluator=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    let bench = Workbench::from_config(&config).context("Invalid configuration")?;

    match cli.command {
        Commands::Session { action } => cmd_session(&bench, action).await,
        Commands::Docs { action } => cmd_docs(&bench, action).await,
        Commands::Questions { action } => cmd_questions(&bench, action).await,
        Commands::Configs { action } => cmd_configs(&bench, action).await,
        Commands::Run {
            query_llm,
            judge,
            output,
        } => cmd_run(&bench, &config, query_llm, judge, output).await,
        Commands::Plot {
            session_id,
            file_name,
            output,
        } => cmd_plot(&config, &session_id, &file_name, &output).await,
    }
}

/// Restore the persisted session or explain how to get one.
async fn active_session(bench: &Workbench) -> Result<String> {
    match bench.session.hydrate_on_start().await {
        Hydration::Restored(summary) => Ok(summary.session_id),
        Hydration::NoSession => {
            anyhow::bail!("No active session. Run 'rag-eval session new' first.")
        }
        Hydration::Degraded(err) => {
            anyhow::bail!(
                "Could not restore the previous session ({}). Run 'rag-eval session new' to start over.",
                err
            )
        }
    }
}

async fn cmd_session(bench: &Workbench, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::New => {
            let session_id = bench
                .session
                .create_session()
                .await
                .context("Failed to create session")?;
            println!("Started session {}", session_id);
        }
        SessionAction::Show => {
            let session_id = active_session(bench).await?;
            print_session(bench, &session_id).await;
        }
        SessionAction::Use { session_id } => {
            match bench
                .session
                .load_session(&session_id)
                .await
                .context("Failed to load session")?
            {
                SessionLoad::Loaded(_) => print_session(bench, &session_id).await,
                SessionLoad::NoSession => {
                    println!("Session {} does not exist. No session is active.", session_id)
                }
            }
        }
    }
    Ok(())
}

async fn print_session(bench: &Workbench, session_id: &str) {
    let workspace = bench.workspace();
    println!("Session {}", session_id);
    println!("{}", "─".repeat(40));
    println!("  Documents:       {}", workspace.documents().await.len());
    println!("  Questions:       {}", workspace.questions().await.len());
    println!("  Configurations:  {}", workspace.configurations().await.len());
    println!("  Stored answers:  {}", workspace.stored_answers().await.len());
    println!("  Session file:    {}", bench.session.store().path().display());
}

/// Expand directories into the PDF files they contain.
fn collect_pdfs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

async fn cmd_docs(bench: &Workbench, action: DocsAction) -> Result<()> {
    let session_id = active_session(bench).await?;

    match action {
        DocsAction::Add { paths } => {
            let files = collect_pdfs(&paths);
            if files.is_empty() {
                anyhow::bail!("No PDF files found");
            }

            let mut failures = 0;
            for file in &files {
                match upload(bench, file, &session_id).await {
                    Ok(id) => println!("  uploaded {} ({})", file.display(), id),
                    Err(e) => {
                        failures += 1;
                        println!("  skipped  {}: {:#}", file.display(), e);
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} of {} uploads failed", failures, files.len());
            }
        }
        DocsAction::Rm { id } => {
            bench
                .documents
                .delete(&id, &session_id)
                .await
                .context("Failed to delete document")?;
            println!("Deleted document {}", id);
        }
        DocsAction::Ls => {
            let documents = bench.documents.items().await;
            if documents.is_empty() {
                println!("No documents.");
            }
            for doc in documents {
                println!(
                    "{}  {} ({:.1} KB)",
                    doc.id,
                    doc.file_name,
                    doc.file_size as f64 / 1024.0
                );
            }
        }
    }
    Ok(())
}

async fn upload(bench: &Workbench, path: &Path, session_id: &str) -> Result<String> {
    let upload = DocumentUpload::from_path(path)?;
    let document = bench.documents.create(&upload, session_id).await?;
    Ok(document.id)
}

async fn cmd_questions(bench: &Workbench, action: QuestionsAction) -> Result<()> {
    let session_id = active_session(bench).await?;

    match action {
        QuestionsAction::Add { text } => {
            let question = bench
                .questions
                .create(text.as_str(), &session_id)
                .await
                .context("Failed to add question")?;
            println!("Added question {}", question.id);
        }
        QuestionsAction::Rm { id } => {
            bench
                .questions
                .delete(&id, &session_id)
                .await
                .context("Failed to delete question")?;
            println!("Deleted question {}", id);
        }
        QuestionsAction::Ls => {
            let questions = bench.questions.items().await;
            if questions.is_empty() {
                println!("No questions.");
            }
            for question in questions {
                println!("{}  {}", question.id, question.question_string);
            }
        }
    }
    Ok(())
}

async fn cmd_configs(bench: &Workbench, action: ConfigsAction) -> Result<()> {
    let session_id = active_session(bench).await?;

    match action {
        ConfigsAction::Add {
            strategy,
            size,
            embedding_model,
            metric,
            num_chunks,
            name,
        } => {
            let strategy = ChunkingStrategy::from_parts(&strategy, size)?;
            let mut draft = NewConfiguration::new(strategy, embedding_model, metric, num_chunks);
            if let Some(name) = name {
                draft = draft.with_name(name);
            }

            let configuration = bench
                .configurations
                .create(&draft, &session_id)
                .await
                .context("Failed to add configuration")?;
            println!(
                "Added configuration {} ({})",
                configuration.id,
                configuration.label()
            );
        }
        ConfigsAction::Rm { id } => {
            bench
                .configurations
                .delete(&id, &session_id)
                .await
                .context("Failed to delete configuration")?;
            println!("Deleted configuration {}", id);
        }
        ConfigsAction::Ls => {
            let configurations = bench.configurations.items().await;
            if configurations.is_empty() {
                println!("No configurations.");
            }
            for config in configurations {
                println!(
                    "{}  {}  [{} · {} · top {}]",
                    config.id,
                    config.label(),
                    config.strategy,
                    config.similarity_metric,
                    config.num_chunks
                );
            }
        }
    }
    Ok(())
}

async fn cmd_run(
    bench: &Workbench,
    config: &Config,
    query_llm: Option<String>,
    judge: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    config.validate_for_run().context("Invalid configuration")?;
    let session_id = active_session(bench).await?;
    let query_llm = query_llm.unwrap_or_else(|| config.models.query_llm.clone());

    println!("Running evaluation with {}...", query_llm);
    let start = Instant::now();
    let run = bench
        .evaluation
        .run(&query_llm, &config.models.api_key, &session_id)
        .await
        .context("Evaluation failed")?;
    println!("Finished in {:.2?}\n", start.elapsed());

    print_run(&run);

    let verdict = match judge {
        Some(judge_llm) => {
            println!("\nAsking {} to compare configurations...", judge_llm);
            let verdict = bench
                .judge
                .evaluate(&judge_llm, &config.models.api_key, &session_id)
                .await
                .context("Judge failed")?;

            println!("\nRecommendation: {}", verdict.recommendation);
            for (i, insight) in verdict.analysis.iter().enumerate() {
                println!("  {}. {}", i + 1, insight);
            }
            Some(verdict)
        }
        None => None,
    };

    if let Some(path) = output {
        let report = serde_json::json!({
            "run": run,
            "summaries": run.summaries(),
            "verdict": verdict,
        });
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize results")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nResults saved to: {}", path.display());
    }

    Ok(())
}

fn print_run(run: &EvaluationRun) {
    println!("Results:");
    println!("{}", "─".repeat(60));

    for result in run.correlated() {
        let label = result
            .configuration
            .map(|c| c.label())
            .unwrap_or_else(|| "unknown configuration".to_string());
        println!("{:>3}. [{}] {}", result.index + 1, label, result.response.question);

        let answer: String = result.response.answer.chars().take(200).collect();
        println!("     Answer: {}", answer);
        if result.response.answer.chars().count() > 200 {
            println!("     ...");
        }

        for chunk in &result.response.chunks {
            println!(
                "     chunk #{:<3} relevance {:.2}  similarity {:.2}",
                chunk.chunk_number, chunk.relevance_score, chunk.similarity_score
            );
        }
        if let Some(metrics) = result.response.rus_metrics {
            println!(
                "     RUS {:.3} (dcr {:.3}, corr {:.3}, waste {:.3})",
                metrics.rus,
                metrics.normalized_dcr,
                metrics.scaled_correlation,
                metrics.wasted_similarity_penalty
            );
        }
        println!();
    }

    println!("{}", "─".repeat(60));
    println!("Per configuration:");
    for summary in run.summaries() {
        let fmt = |v: Option<f64>| v.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".into());
        println!(
            "  {:<40} results {:>3}  RUS {}  similarity {}  relevance {}",
            summary.configuration.label(),
            summary.results,
            fmt(summary.mean_rus),
            fmt(summary.mean_similarity),
            fmt(summary.mean_relevance)
        );
    }
}

async fn cmd_plot(config: &Config, session_id: &str, file_name: &str, output: &Path) -> Result<()> {
    let client = rag_evaluator::ServiceClient::new(&config.service)?;
    let bytes = client
        .fetch_visualization(session_id, file_name)
        .await
        .context("Failed to fetch visualization")?;

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Saved {} ({:.1} KB) to {}",
        file_name,
        bytes.len() as f64 / 1024.0,
        output.display()
    );
    Ok(())
}
