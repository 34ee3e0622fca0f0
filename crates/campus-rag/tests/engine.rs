//! End-to-end engine tests with stub generation backends

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use campus_rag::error::{Error, Result};
use campus_rag::providers::{GenerationClient, HashEmbedder};
use campus_rag::storage::VectorStore;
use campus_rag::{ConversationMessage, RagConfig, RagEngine};

/// Generation stub that records every prompt and returns a canned answer
struct CannedClient {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedClient {
    fn new(reply: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply: reply.to_string(),
                prompts: Arc::clone(&prompts),
            },
            prompts,
        )
    }
}

#[async_trait]
impl GenerationClient for CannedClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "canned"
    }
}

/// Generation stub that never answers within a sane budget
struct SlowClient;

#[async_trait]
impl GenerationClient for SlowClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn test_engine(
    store_dir: &Path,
    generator: Arc<dyn GenerationClient>,
    rag_timeout_secs: u64,
) -> RagEngine {
    let mut config = RagConfig::default();
    config.rag_timeout_secs = rag_timeout_secs;
    config.vector_db.storage_path = store_dir.join("vectors.db");

    let store = VectorStore::open(&config.vector_db.storage_path, &config.vector_db.collection)
        .expect("open store");

    RagEngine::with_components(config, Arc::new(HashEmbedder::new(64)), generator, store)
        .expect("build engine")
}

fn write_corpus(dir: &Path) {
    std::fs::write(
        dir.join("library.txt"),
        "The library opens at eight in the morning and closes at ten at night. \
         Student cards are required to borrow books.",
    )
    .unwrap();
    std::fs::write(
        dir.join("housing.md"),
        "# Housing\n\nDorm applications open in June. Rooms are assigned in August.",
    )
    .unwrap();
}

#[tokio::test]
async fn ingest_directory_then_answer_grounded() {
    let docs = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_corpus(docs.path());

    let (client, prompts) = CannedClient::new("The library opens at 8am.");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    let report = engine.ingest_directory(docs.path()).await.unwrap();
    assert_eq!(report.files, 2);
    assert!(report.chunks >= 2);

    let answer = engine
        .invoke("When does the library open?", &[])
        .await
        .unwrap();
    assert_eq!(answer.answer, "The library opens at 8am.");
    assert!(!answer.sources.is_empty());

    // Sources are deduplicated by label
    let mut labels: Vec<&str> = answer.sources.iter().map(|s| s.label.as_str()).collect();
    let before = labels.len();
    labels.dedup();
    assert_eq!(labels.len(), before);

    let prompts = prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("[Source: library.txt]"));
    assert!(prompts[0].contains("Question: When does the library open?"));
}

#[tokio::test]
async fn empty_store_answers_without_grounding() {
    let store_dir = tempfile::tempdir().unwrap();
    let (client, prompts) = CannedClient::new("I have no campus documents about that.");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    let answer = engine.invoke("What about parking?", &[]).await.unwrap();
    assert!(answer.sources.is_empty());

    let prompts = prompts.lock();
    assert!(prompts[0].contains("Aucun document"));
    assert!(!prompts[0].contains("[Source:"));
}

#[tokio::test]
async fn history_is_rendered_into_the_prompt() {
    let store_dir = tempfile::tempdir().unwrap();
    let (client, prompts) = CannedClient::new("ok");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    let history = vec![
        ConversationMessage::student("When does the library open?"),
        ConversationMessage::assistant("At eight in the morning."),
    ];
    engine.invoke("And when does it close?", &history).await.unwrap();

    let prompts = prompts.lock();
    assert!(prompts[0].contains("Student: When does the library open?"));
    assert!(prompts[0].contains("Assistant: At eight in the morning."));
}

#[tokio::test]
async fn reingesting_the_same_file_duplicates_chunks() {
    let docs = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    let path = docs.path().join("note.txt");
    std::fs::write(&path, "Grades are published on the student portal.").unwrap();

    let (client, _) = CannedClient::new("ok");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    let first = engine.ingest_file(&path).await.unwrap();
    let second = engine.ingest_file(&path).await.unwrap();
    assert_eq!(first, second);

    let results = engine.search("grades", Some(20)).await.unwrap();
    assert_eq!(results.len(), first + second);
}

#[tokio::test]
async fn reset_empties_the_collection_and_is_idempotent() {
    let docs = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_corpus(docs.path());

    let (client, _) = CannedClient::new("ok");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    engine.ingest_directory(docs.path()).await.unwrap();
    assert!(!engine.search("library", None).await.unwrap().is_empty());

    engine.reset().await.unwrap();
    assert!(engine.search("library", None).await.unwrap().is_empty());

    // Resetting an empty collection also succeeds
    engine.reset().await.unwrap();

    // Ingestion keeps working after a reset
    let report = engine.ingest_directory(docs.path()).await.unwrap();
    assert_eq!(report.files, 2);
}

#[tokio::test]
async fn search_bounds_and_orders_results() {
    let docs = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_corpus(docs.path());

    let (client, _) = CannedClient::new("ok");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);
    engine.ingest_directory(docs.path()).await.unwrap();

    let results = engine.search("library opening hours", Some(1)).await.unwrap();
    assert_eq!(results.len(), 1);

    let all = engine.search("library opening hours", Some(10)).await.unwrap();
    for pair in all.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn slow_generation_times_out_within_the_budget() {
    let store_dir = tempfile::tempdir().unwrap();
    let engine = test_engine(store_dir.path(), Arc::new(SlowClient), 1);

    let start = Instant::now();
    let err = engine.invoke("Anything?", &[]).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout());
    assert!(matches!(err, Error::GenerationTimeout { budget_secs: 1 }));
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn unsupported_files_are_rejected_one_by_one_but_skipped_in_directories() {
    let docs = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    write_corpus(docs.path());
    std::fs::write(docs.path().join("data.csv"), "a,b,c").unwrap();

    let (client, _) = CannedClient::new("ok");
    let engine = test_engine(store_dir.path(), Arc::new(client), 30);

    let err = engine
        .ingest_file(&PathBuf::from(docs.path().join("data.csv")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));

    // The directory scan skips it instead of failing
    let report = engine.ingest_directory(docs.path()).await.unwrap();
    assert_eq!(report.files, 2);
}
