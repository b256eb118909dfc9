//! End-to-end tests for the knowledge-base session.

mod common;

use std::sync::Arc;

use common::{BrokenEmbeddings, EchoModel, docx, local_session, pdf, serve_page};
use kbase_rag::local::INDEX_FILE;
use kbase_rag::{
    AskOutcome, Chunker, DocumentSource, HashingEmbeddingProvider, InMemoryVectorStore,
    KnowledgeSession, LocalVectorStore, NO_DOCUMENTS_MESSAGE, RagConfig, RagError,
    RecursiveChunker, SessionState, VectorStore,
};

/// Ingesting `source` grows the document list and the index holds exactly
/// the chunker's output for the whole list.
async fn assert_ingest_indexes_everything(source: DocumentSource) {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;

    let report = session.ingest(source).await.unwrap();
    assert!(report.documents_added >= 1);
    assert_eq!(session.documents().len(), report.documents_added);
    assert_eq!(session.state(), SessionState::Ready);

    let config = session.config();
    let expected = RecursiveChunker::new(config.chunk_size, config.chunk_overlap)
        .split(session.documents());
    assert!(!expected.is_empty());
    assert_eq!(report.chunk_count, expected.len());
    assert_eq!(session.index().len().await.unwrap(), expected.len());
}

#[tokio::test]
async fn ingest_text_file() {
    let source = DocumentSource::file("notes.txt", "Plain text notes about llamas.");
    assert_ingest_indexes_everything(source).await;
}

#[tokio::test]
async fn ingest_markdown_file() {
    let source = DocumentSource::file("readme.md", "# Heading\n\nSome *markdown* body.");
    assert_ingest_indexes_everything(source).await;
}

#[tokio::test]
async fn ingest_pdf_file() {
    let source = DocumentSource::file("guide.pdf", pdf(&["Page one text", "Page two text"]));
    assert_ingest_indexes_everything(source).await;
}

#[tokio::test]
async fn ingest_word_file() {
    let source = DocumentSource::file("memo.docx", docx(&["First paragraph", "Second paragraph"]));
    assert_ingest_indexes_everything(source).await;
}

#[tokio::test]
async fn ingest_web_page() {
    let url = serve_page(
        "<html><head><script>track()</script></head><body><p>Web page body</p></body></html>",
    )
    .await;
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;

    let report = session.ingest(DocumentSource::Url(url.clone())).await.unwrap();
    assert_eq!(report.documents_added, 1);
    assert_eq!(session.documents()[0].content, "Web page body");
    assert_eq!(session.documents()[0].source(), url);
}

#[tokio::test]
async fn ingest_from_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("facts.txt");
    std::fs::write(&path, "Facts on disk.").unwrap();

    assert_ingest_indexes_everything(DocumentSource::parse(path.to_str().unwrap())).await;
}

#[tokio::test]
async fn ingest_persists_index_to_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("index");
    let (mut session, _) = local_session(&dir).await;

    session.ingest(DocumentSource::file("a.txt", "persisted content")).await.unwrap();
    assert!(dir.join(INDEX_FILE).exists());

    let reopened = LocalVectorStore::open(&dir).await.unwrap();
    assert_eq!(reopened.len().await.unwrap(), 1);
}

#[tokio::test]
async fn reset_then_ask_reports_no_documents() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("index");
    let (mut session, model) = local_session(&dir).await;
    session.ingest(DocumentSource::file("a.txt", "something to forget")).await.unwrap();
    session.ask("what?").await;
    assert!(dir.exists());

    session.reset().await.unwrap();
    assert!(!dir.exists());
    assert!(session.documents().is_empty());
    assert!(session.history().is_empty());
    assert_eq!(session.state(), SessionState::Empty);

    let outcome = session.ask("Anything left?").await;
    assert!(matches!(outcome, AskOutcome::NoDocuments));
    assert_eq!(outcome.text(), NO_DOCUMENTS_MESSAGE);
    assert_eq!(model.prompts.lock().unwrap().len(), 1);

    // The session keeps working after a reset.
    session.ingest(DocumentSource::file("b.txt", "fresh start")).await.unwrap();
    assert!(dir.join(INDEX_FILE).exists());
}

#[tokio::test]
async fn failed_reset_still_empties_the_index() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("index");
    let (mut session, _) = local_session(&dir).await;
    session.ingest(DocumentSource::file("a.txt", "something to forget")).await.unwrap();

    std::fs::remove_dir_all(&dir).unwrap();
    std::fs::write(&dir, b"in the way").unwrap();

    let err = session.reset().await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreError { .. }));
    assert_eq!(session.state(), SessionState::Empty);
    assert!(session.index().is_empty().await.unwrap());
    assert!(session.retrieve("forget").await.unwrap().is_empty());
}

#[tokio::test]
async fn ingesting_twice_doubles_chunks() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;
    let text = "Paragraph one about rivers.\n\n".repeat(30);

    let first = session.ingest(DocumentSource::file("rivers.txt", text.clone())).await.unwrap();
    let second = session.ingest(DocumentSource::file("rivers.txt", text)).await.unwrap();

    assert!(first.chunk_count > 1);
    assert_eq!(second.chunk_count, first.chunk_count * 2);
    assert_eq!(session.documents().len(), 2);
}

#[tokio::test]
async fn unsupported_type_leaves_session_unchanged() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;
    session.ingest(DocumentSource::file("a.txt", "kept")).await.unwrap();

    let err = session.ingest(DocumentSource::file("data.xyz", "ignored")).await.unwrap_err();
    assert!(matches!(err, RagError::UnsupportedType { ref name } if name == "data.xyz"));
    assert!(!err.is_fatal());
    assert_eq!(session.documents().len(), 1);
    assert_eq!(session.index().len().await.unwrap(), 1);
}

#[tokio::test]
async fn blank_pdf_adds_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;

    let report = session.ingest(DocumentSource::file("blank.pdf", pdf(&["   "]))).await.unwrap();
    assert_eq!(report.documents_added, 0);
    assert_eq!(report.chunk_count, 0);
    assert_eq!(session.state(), SessionState::Empty);
}

#[tokio::test]
async fn invalid_utf8_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;

    let err = session
        .ingest(DocumentSource::file("bad.txt", vec![0xffu8, 0xfe, 0x00]))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::DecodeError { .. }));
    assert!(session.documents().is_empty());
}

#[tokio::test]
async fn retrieve_on_empty_session_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    let (session, _) = local_session(&temp.path().join("index")).await;
    assert!(session.retrieve("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn answer_is_grounded_in_retrieved_context() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, model) = local_session(&temp.path().join("index")).await;
    session
        .ingest(DocumentSource::file("france.txt", "Paris is the capital of France."))
        .await
        .unwrap();
    session
        .ingest(DocumentSource::file(
            "rust.txt",
            "Rust guarantees memory safety without a garbage collector.",
        ))
        .await
        .unwrap();

    let outcome = session.ask("What is the capital of France?").await;
    assert!(outcome.is_answered());
    assert!(outcome.text().contains("Paris"));

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].starts_with("Answer the question based only on the following context:\n"));
    assert!(prompts[0].ends_with("\n\nQuestion: What is the capital of France?"));

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "What is the capital of France?");
    assert_eq!(history[1].content, outcome.text());
}

#[tokio::test]
async fn retrieval_is_bounded_by_top_k() {
    let temp = tempfile::tempdir().unwrap();
    let (mut session, _) = local_session(&temp.path().join("index")).await;
    for i in 0..5 {
        let note = format!("Note number {i} about apples.");
        session.ingest(DocumentSource::file(format!("{i}.txt"), note)).await.unwrap();
    }

    let context = session.retrieve("apples").await.unwrap();
    assert_eq!(context.len(), 3);
}

#[tokio::test]
async fn embedding_failure_keeps_previous_state() {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let mut broken = KnowledgeSession::builder()
        .embedding_provider(Arc::new(BrokenEmbeddings))
        .vector_store(store.clone())
        .language_model(Arc::new(EchoModel::default()))
        .build()
        .await
        .unwrap();

    let err = broken.ingest(DocumentSource::file("a.txt", "never indexed")).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert!(broken.documents().is_empty());
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn construction_clears_stale_index() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("index");
    {
        let (mut session, _) = local_session(&dir).await;
        session.ingest(DocumentSource::file("old.txt", "left over from last run")).await.unwrap();
    }
    assert!(dir.join(INDEX_FILE).exists());

    let (session, _) = local_session(&dir).await;
    assert!(!dir.exists());
    assert_eq!(session.index().len().await.unwrap(), 0);
}

#[tokio::test]
async fn custom_config_controls_chunking() {
    let config = RagConfig::builder().chunk_size(40).chunk_overlap(5).top_k(1).build().unwrap();
    let mut session = KnowledgeSession::builder()
        .config(config)
        .embedding_provider(Arc::new(HashingEmbeddingProvider::new(128)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .language_model(Arc::new(EchoModel::default()))
        .build()
        .await
        .unwrap();

    let report = session
        .ingest(DocumentSource::file("long.txt", "word ".repeat(100)))
        .await
        .unwrap();
    assert!(report.chunk_count > 1);
    assert_eq!(session.retrieve("word").await.unwrap().len(), 1);
}
