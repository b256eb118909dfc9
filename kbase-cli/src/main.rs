//! `kbase`: ask questions about your own documents from the terminal.
//!
//! ```text
//! kbase --ingest handbook.pdf --ingest https://example.com/faq
//! kbase --ingest notes.md --question "What did we decide about pricing?"
//! ```
//!
//! Configuration comes from the environment (a `.env` file is honoured);
//! `PERPLEXITY_API_KEY` is required.

mod console;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use kbase_rag::{DocumentSource, KnowledgeSession, SessionConfig};
use tracing_subscriber::{EnvFilter, fmt};

/// Question answering over PDF, text, Markdown, Word and web documents.
#[derive(Parser)]
#[command(name = "kbase")]
#[command(version)]
#[command(about = "Ask questions about your own documents")]
struct Cli {
    /// Directory for the persisted vector index (overrides KBASE_INDEX_DIR)
    #[arg(long, value_name = "DIR")]
    index_dir: Option<PathBuf>,

    /// Number of chunks retrieved per question (overrides KBASE_TOP_K)
    #[arg(long, value_name = "N")]
    top_k: Option<usize>,

    /// File path or http(s) URL to ingest before answering; repeatable
    #[arg(long, value_name = "PATH_OR_URL")]
    ingest: Vec<String>,

    /// Answer one question and exit instead of starting the interactive shell
    #[arg(long, short)]
    question: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kbase=info,kbase_rag=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = SessionConfig::from_env().context("invalid configuration")?;
    if let Some(dir) = cli.index_dir {
        config.index_dir = dir;
    }
    if let Some(top_k) = cli.top_k {
        config.rag = kbase_rag::RagConfig::builder()
            .chunk_size(config.rag.chunk_size)
            .chunk_overlap(config.rag.chunk_overlap)
            .top_k(top_k)
            .build()
            .context("invalid --top-k")?;
    }

    let mut session =
        KnowledgeSession::from_config(config).await.context("failed to start session")?;

    for input in &cli.ingest {
        console::ingest(&mut session, DocumentSource::parse(input)).await;
    }

    match cli.question {
        Some(question) => {
            println!("{}", session.ask(&question).await);
            Ok(())
        }
        None => console::run(&mut session).await,
    }
}
