//! Subcommand implementations
//!
//! Each command wires the configured pipeline stages together, reports
//! progress through [`Output`] and returns the first fatal error.

use super::chat::ChatSession;
use super::output::{Output, Stage, Status};
use crate::llm::{LLMClient, Provider};
use crate::rag::answer::{AnswerEngine, AnswerSettings};
use crate::rag::cache::CachedEmbedder;
use crate::rag::chunker::Segmenter;
use crate::rag::embeddings::{create_embedder, Embedder};
use crate::rag::indexer;
use crate::rag::normalizer::TextNormalizer;
use crate::rag::retriever::Retriever;
use crate::rag::store::ChunkStore;
use crate::types::{AppError, Result};
use crate::utils::toml_config::RagConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Read a UTF-8 input document. A missing file is [`AppError::InputNotFound`].
pub async fn read_input(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::InputNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}

fn request_timeout(config: &RagConfig) -> Duration {
    Duration::from_secs(config.generation.timeout_secs)
}

/// The configured embedder behind the query cache.
pub fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn Embedder>> {
    let inner = create_embedder(&config.embedding, request_timeout(config))?;
    Ok(Arc::new(CachedEmbedder::new(
        inner,
        config.embedding.query_cache_capacity,
    )))
}

/// Load the chunk store and index named in `[paths]` into a retriever.
pub async fn retriever_from_config(config: &RagConfig) -> Result<Retriever> {
    let store = ChunkStore::read(&config.paths.chunks).await?;
    let index = indexer::load_index(&config.paths.index).await?;
    info!(
        vectors = index.len(),
        dimensions = index.dimensions(),
        "Loaded index"
    );

    Ok(Retriever::new(
        embedder_from_config(config)?,
        Arc::new(index),
        Arc::new(store),
    ))
}

/// Retriever plus the configured LLM.
pub async fn answer_engine_from_config(config: &RagConfig) -> Result<AnswerEngine> {
    let retriever = retriever_from_config(config).await?;
    let llm: Arc<dyn LLMClient> = Arc::from(
        Provider::from_config(&config.generation).create_client(request_timeout(config))?,
    );
    Ok(AnswerEngine::new(
        retriever,
        llm,
        AnswerSettings::from_config(config),
    ))
}

fn segmenter(config: &RagConfig, max_words: Option<usize>) -> Result<Segmenter> {
    let mut chunking = config.chunking.clone();
    if let Some(words) = max_words {
        if words == 0 {
            return Err(AppError::InvalidInput(
                "--max-words must be greater than 0".to_string(),
            ));
        }
        chunking.max_words = words;
    }
    Ok(Segmenter::from_config(&chunking))
}

/// `ragline clean`
pub async fn clean(input: &Path, output_path: &Path, config: &RagConfig, output: &Output) -> Result<()> {
    let raw = read_input(input).await?;
    let normalizer = TextNormalizer::from_config(&config.normalize)?;
    let cleaned = normalizer.normalize(&raw);

    write_text(output_path, &cleaned).await?;
    output.cleaned(output_path, raw.chars().count(), cleaned.chars().count());
    Ok(())
}

/// `ragline chunk`
pub async fn chunk(
    input: &Path,
    output_path: Option<PathBuf>,
    max_words: Option<usize>,
    config: &RagConfig,
    output: &Output,
) -> Result<ChunkStore> {
    let text = read_input(input).await?;
    let segmenter = segmenter(config, max_words)?;
    let store = ChunkStore::new(segmenter.segment_text(&text));

    let path = output_path.unwrap_or_else(|| config.paths.chunks.clone());
    store.write(&path).await?;

    output.store_written(&path, store.len(), segmenter.max_words());
    Ok(store)
}

/// `ragline index`
pub async fn index(
    chunks_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config: &RagConfig,
    output: &Output,
) -> Result<()> {
    let chunks_path = chunks_path.unwrap_or_else(|| config.paths.chunks.clone());
    let store = ChunkStore::read(&chunks_path).await?;
    output.store_loaded(&chunks_path, store.len());

    build_and_save_index(&store, output_path, config, output).await
}

async fn build_and_save_index(
    store: &ChunkStore,
    output_path: Option<PathBuf>,
    config: &RagConfig,
    output: &Output,
) -> Result<()> {
    let embedder = create_embedder(&config.embedding, request_timeout(config))?;

    let index = indexer::build_index(
        embedder.as_ref(),
        store,
        config.embedding.batch_size,
        config.index.metric()?,
    )
    .await?;

    let path = output_path.unwrap_or_else(|| config.paths.index.clone());
    indexer::save_index(&path, &index).await?;

    output.index_written(&path, index.len(), index.dimensions(), embedder.model_name());
    Ok(())
}

/// `ragline ingest`: clean, chunk and index in one pass.
///
/// The index is built from the store as `search` will read it back, so
/// vector ids and chunk ids agree even when a line starts with `chunk`.
pub async fn ingest(input: &Path, max_words: Option<usize>, config: &RagConfig, output: &Output) -> Result<()> {
    output.stage(Stage::Clean);
    let raw = read_input(input).await?;
    let cleaned = TextNormalizer::from_config(&config.normalize)?.normalize(&raw);

    output.stage(Stage::Chunk);
    let segmenter = segmenter(config, max_words)?;
    let store = ChunkStore::new(segmenter.segment_text(&cleaned));
    store.write(&config.paths.chunks).await?;
    let store = store.as_stored()?;
    output.store_written(&config.paths.chunks, store.len(), segmenter.max_words());

    output.stage(Stage::Index);
    build_and_save_index(&store, None, config, output).await?;

    output.ingested(input);
    Ok(())
}

/// `ragline search`
pub async fn search(query: &str, k: usize, preview_chars: usize, config: &RagConfig, output: &Output) -> Result<()> {
    if k == 0 {
        return Err(AppError::InvalidInput("-k must be greater than 0".to_string()));
    }

    let retriever = retriever_from_config(config).await?;
    let results = retriever.search(query, k).await?;

    output.search_results(&results, preview_chars);
    Ok(())
}

/// `ragline ask`
pub async fn ask(question: &str, config: &RagConfig, output: &Output) -> Result<()> {
    let engine = answer_engine_from_config(config).await?;
    let answer = engine.answer(question).await?;
    output.answer(&answer);
    Ok(())
}

/// `ragline chat`
pub async fn chat(config: &RagConfig, output: &Output) -> Result<()> {
    let engine = answer_engine_from_config(config).await?;
    output.banner(&config.generation.model);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    ChatSession::new(engine).run(stdin, output).await
}

/// `ragline config`
pub fn show_config(config: &RagConfig, validate: bool, output: &Output) -> Result<()> {
    config.validate()?;
    if validate {
        output.status(Status::Done, "Configuration is valid");
        return Ok(());
    }

    println!("{}", config.to_toml_string()?);
    Ok(())
}
