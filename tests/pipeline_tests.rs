//! End-to-end pipeline tests
//!
//! Normalize -> segment -> store -> embed -> index -> retrieve -> answer,
//! with a deterministic embedder and a mock LLM in place of real models.

mod common;

use common::mocks::{MockEmbedder, MockLLMClient};
use common::{sample_store, SAMPLE_DOCUMENT};
use ragline::cli::chat::{ChatSession, ChatTurn};
use ragline::cli::output::Output;
use ragline::rag::answer::{AnswerEngine, AnswerSettings};
use ragline::rag::cache::CachedEmbedder;
use ragline::rag::chunker::{split_sentences, Chunk, Segmenter};
use ragline::rag::indexer;
use ragline::rag::normalizer::TextNormalizer;
use ragline::rag::retriever::{Retriever, ELLIPSIS};
use ragline::rag::store::ChunkStore;
use ragline::types::AppError;
use ragline_vector::DistanceMetric;
use std::sync::Arc;
use tempfile::TempDir;

const DIMENSIONS: usize = 256;

async fn setup_retriever(store: ChunkStore) -> (Arc<MockEmbedder>, Retriever) {
    let embedder = Arc::new(MockEmbedder::new(DIMENSIONS));
    let index = indexer::build_index(embedder.as_ref(), &store, 2, DistanceMetric::Euclidean)
        .await
        .expect("index build");
    let retriever = Retriever::new(embedder.clone(), Arc::new(index), Arc::new(store));
    (embedder, retriever)
}

async fn setup_engine(llm: MockLLMClient) -> AnswerEngine {
    let (_, retriever) = setup_retriever(sample_store(400)).await;
    AnswerEngine::new(retriever, Arc::new(llm), AnswerSettings::default())
}

// =============================================================================
// Segmentation
// =============================================================================

#[test]
fn test_sample_document_segments_by_heading() {
    let store = sample_store(400);
    let headings: Vec<&str> = store.iter().map(Chunk::heading).collect();

    assert_eq!(
        headings,
        vec!["Introduction", "Processes", "Memory Management", "File Systems"]
    );
    assert_eq!(
        store.get(1).unwrap().body(),
        "A process is a program in execution. Each process has its own address space, \
         registers and program counter. The scheduler decides which process runs next."
    );
    // page markers are gone
    assert!(store.iter().all(|c| !c.body().contains("Page 2")));
}

#[test]
fn test_small_budget_keeps_sentences_whole() {
    let text = TextNormalizer::default().normalize(SAMPLE_DOCUMENT);
    let chunks = Segmenter::new(15).segment_text(&text);

    assert!(chunks.len() > 4);
    for chunk in &chunks {
        let sentences = split_sentences(chunk.body());
        assert!(chunk.word_count() > 0);
        assert!(chunk.word_count() <= 15 || sentences.len() == 1);
        // each body is a run of whole sentences from the document
        for sentence in sentences {
            assert!(text.replace('\n', " ").contains(sentence), "{}", sentence);
        }
    }
}

#[test]
fn test_segmentation_is_deterministic() {
    assert_eq!(sample_store(20), sample_store(20));
}

// =============================================================================
// Retrieval
// =============================================================================

#[tokio::test]
async fn test_retrieves_relevant_chunk_first() {
    let (_, retriever) = setup_retriever(sample_store(400)).await;

    let results = retriever
        .search("What is virtual memory and a page fault?", 2)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].heading, "Memory Management");
    assert!(results[0].distance <= results[1].distance);
}

#[tokio::test]
async fn test_retrieve_truncates_to_max_chars() {
    let (_, retriever) = setup_retriever(sample_store(400)).await;

    let texts = retriever
        .retrieve("What is a process?", 3, 10)
        .await
        .unwrap();

    assert_eq!(texts.len(), 3);
    for text in texts {
        assert!(text.ends_with(ELLIPSIS));
        assert_eq!(text.chars().count(), 10 + ELLIPSIS.chars().count());
    }
}

#[tokio::test]
async fn test_persisted_files_give_identical_results() {
    let temp_dir = TempDir::new().unwrap();
    let chunks_path = temp_dir.path().join("output_chunks_fixed.txt");
    let index_path = temp_dir.path().join("faiss_index.bin");

    let store = sample_store(30);
    store.write(&chunks_path).await.unwrap();

    let embedder = Arc::new(MockEmbedder::new(DIMENSIONS));
    let index = indexer::build_index(embedder.as_ref(), &store, 3, DistanceMetric::Euclidean)
        .await
        .unwrap();
    indexer::save_index(&index_path, &index).await.unwrap();

    let in_memory = Retriever::new(embedder.clone(), Arc::new(index), Arc::new(store));
    let from_disk = Retriever::new(
        embedder,
        Arc::new(indexer::load_index(&index_path).await.unwrap()),
        Arc::new(ChunkStore::read(&chunks_path).await.unwrap()),
    );

    for query in ["scheduler", "file system directories", "operating system hardware"] {
        let a = in_memory.search(query, 4).await.unwrap();
        let b = from_disk.search(query, 4).await.unwrap();
        assert_eq!(a, b);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.distance.to_bits(), y.distance.to_bits());
        }
    }
}

#[tokio::test]
async fn test_chunk_prefixed_lines_survive_write_and_read() {
    let text = TextNormalizer::default().normalize(
        "Introduction\nAn operating system manages hardware.\n\nchunking basics\n\
         chunks are the unit of retrieval. A document is split before it is embedded.\n",
    );
    let written = ChunkStore::new(Segmenter::new(400).segment_text(&text));
    assert_eq!(written.len(), 2);

    let temp_dir = TempDir::new().unwrap();
    let chunks_path = temp_dir.path().join("output_chunks_fixed.txt");
    written.write(&chunks_path).await.unwrap();
    let store = ChunkStore::read(&chunks_path).await.unwrap();
    assert_eq!(store, written.as_stored().unwrap());
    assert!(store.len() > written.len());

    let (_, retriever) = setup_retriever(store).await;
    assert_eq!(retriever.index().len(), retriever.store().len());

    let k = retriever.store().len();
    let texts = retriever
        .retrieve("What is the unit of retrieval?", k, 500)
        .await
        .unwrap();
    assert_eq!(texts.len(), k);
    assert!(texts[0].contains("unit of retrieval"));
    assert!(texts.iter().any(|t| t.starts_with("chunking basics")));
}

#[tokio::test]
async fn test_desynchronized_store_is_not_found() {
    let full = sample_store(400);
    let embedder = Arc::new(MockEmbedder::new(DIMENSIONS));
    let index = indexer::build_index(embedder.as_ref(), &full, 8, DistanceMetric::Euclidean)
        .await
        .unwrap();

    let truncated = ChunkStore::new(full.chunks()[..2].to_vec());
    let retriever = Retriever::new(embedder, Arc::new(index), Arc::new(truncated));

    let result = retriever.retrieve("memory", 4, 500).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_embedder_model_change_is_dimension_mismatch() {
    let store = sample_store(400);
    let (_, retriever) = setup_retriever(store.clone()).await;

    let other = Retriever::new(
        Arc::new(MockEmbedder::new(32)),
        Arc::new(retriever.index().clone()),
        Arc::new(store),
    );
    let result = other.retrieve("memory", 2, 500).await;
    assert!(matches!(
        result,
        Err(AppError::DimensionMismatch {
            expected: DIMENSIONS,
            actual: 32
        })
    ));
}

#[tokio::test]
async fn test_query_cache_skips_repeat_embeddings() {
    let store = sample_store(400);
    let inner = Arc::new(MockEmbedder::new(DIMENSIONS));
    let index = indexer::build_index(inner.as_ref(), &store, 8, DistanceMetric::Euclidean)
        .await
        .unwrap();
    let calls_after_index = inner.calls();

    let cached = Arc::new(CachedEmbedder::new(inner.clone(), 16));
    let retriever = Retriever::new(cached.clone(), Arc::new(index), Arc::new(store));

    let first = retriever.retrieve("what is a process?", 2, 500).await.unwrap();
    let second = retriever.retrieve("what is a process?", 2, 500).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(inner.calls(), calls_after_index + 1);
    assert_eq!(cached.stats().hits, 1);
}

// =============================================================================
// Answering
// =============================================================================

#[tokio::test]
async fn test_answer_prompt_and_trimming() {
    let llm = MockLLMClient::new("  A process is a program in execution.  \n");
    let engine = setup_engine(llm.clone()).await;

    let answer = engine.answer("What is a process?").await.unwrap();
    assert_eq!(answer, "A process is a program in execution.");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    let (prompt, max_tokens) = &prompts[0];
    assert_eq!(*max_tokens, 100);
    assert!(prompt.starts_with("Answer the question based on the context below:\n\nContext:\n"));
    assert!(prompt.ends_with("\n\nQuestion: What is a process?\nAnswer:"));
    assert!(prompt.contains("Processes\nA process is a program in execution."));
}

#[tokio::test]
async fn test_answer_context_is_limited() {
    let llm = MockLLMClient::new("ok");
    let (_, retriever) = setup_retriever(sample_store(400)).await;
    let settings = AnswerSettings {
        top_k: 1,
        max_context_chars: 20,
        max_tokens: 50,
    };
    let engine = AnswerEngine::new(retriever, Arc::new(llm.clone()), settings);

    engine.answer("scheduler").await.unwrap();

    let (prompt, max_tokens) = &llm.prompts()[0];
    assert_eq!(*max_tokens, 50);
    let context = prompt
        .strip_prefix("Answer the question based on the context below:\n\nContext:\n")
        .and_then(|rest| rest.split("\n\nQuestion:").next())
        .unwrap();
    assert_eq!(context.chars().count(), 20 + ELLIPSIS.len());
}

// =============================================================================
// Chat loop
// =============================================================================

#[tokio::test]
async fn test_chat_turns() {
    let session = ChatSession::new(setup_engine(MockLLMClient::new("Answer.")).await);

    assert_eq!(session.handle_line("   ").await.unwrap(), ChatTurn::Skip);
    assert_eq!(session.handle_line("Quit").await.unwrap(), ChatTurn::Exit);
    assert_eq!(
        session.handle_line("What is memory?").await.unwrap(),
        ChatTurn::Answer("Answer.".to_string())
    );
}

#[tokio::test]
async fn test_chat_generation_failure_is_recoverable() {
    let session = ChatSession::new(setup_engine(MockLLMClient::failing()).await);

    match session.handle_line("What is a file system?").await.unwrap() {
        ChatTurn::Recoverable(message) => assert!(message.contains("context window")),
        other => panic!("expected a recoverable turn, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_fatal_error_ends_session() {
    let session = ChatSession::new(setup_engine(MockLLMClient::fatal()).await);
    let result = session.handle_line("What is a file system?").await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_chat_loop_runs_until_exit() {
    let llm = MockLLMClient::new("Answer.");
    let session = ChatSession::new(setup_engine(llm.clone()).await);

    let input: &[u8] = b"What is a process?\n\nwhat is memory?\nexit\nnever asked\n";
    session.run(input, &Output::no_color()).await.unwrap();

    let asked: Vec<String> = llm
        .prompts()
        .iter()
        .map(|(p, _)| p.lines().rev().nth(1).unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        asked,
        vec!["Question: What is a process?", "Question: what is memory?"]
    );
}

#[tokio::test]
async fn test_chat_loop_continues_after_generation_failure() {
    let llm = MockLLMClient::failing();
    let session = ChatSession::new(setup_engine(llm.clone()).await);

    let input: &[u8] = b"first\nsecond\n";
    session.run(input, &Output::no_color()).await.unwrap();

    assert_eq!(llm.prompts().len(), 2);
}
