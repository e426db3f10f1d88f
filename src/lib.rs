//! # ragline
//!
//! Local retrieval augmented generation over a single document: clean the
//! extracted text, cut it into heading-aware chunks, embed and index the
//! chunks, and answer questions from the closest ones.
//!
//! ## Overview
//!
//! ragline can be used in two ways:
//!
//! 1. **As a CLI** - Run the `ragline` binary (`ingest`, `search`, `chat`, ...)
//! 2. **As a library** - Compose the pipeline stages in your own program
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragline::rag::{indexer, ChunkStore, Retriever, Segmenter, TextNormalizer};
//! use ragline::rag::embeddings::OllamaEmbedder;
//! use ragline_vector::DistanceMetric;
//! use std::{sync::Arc, time::Duration};
//!
//! let text = TextNormalizer::default().normalize(&raw);
//! let store = ChunkStore::new(Segmenter::new(400).segment_text(&text));
//!
//! let embedder = Arc::new(OllamaEmbedder::new(
//!     "http://localhost:11434",
//!     "all-minilm",
//!     Duration::from_secs(60),
//! )?);
//! let index = indexer::build_index(embedder.as_ref(), &store, 32, DistanceMetric::Euclidean).await?;
//!
//! let retriever = Retriever::new(embedder, Arc::new(index), Arc::new(store));
//! for context in retriever.retrieve("What is an operating system?", 2, 500).await? {
//!     println!("{context}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | In-process fastembed embedding models |
//!
//! ## Modules
//!
//! - [`rag`] - Pipeline stages (normalize, chunk, store, embed, index, retrieve, answer)
//! - [`llm`] - Text generation clients (Ollama, llama.cpp)
//! - [`cli`] - Command-line interface and interactive chat
//! - [`types`] - Error types
//! - [`utils`] - Configuration

/// Command-line interface, output helpers and the chat loop.
pub mod cli;
/// Text generation clients.
pub mod llm;
/// Retrieval augmented generation pipeline stages.
pub mod rag;
/// Error types.
pub mod types;
/// Configuration loading.
pub mod utils;

pub use llm::{LLMClient, Provider};
pub use rag::{AnswerEngine, Chunk, ChunkStore, Embedder, Retriever, Segmenter, TextNormalizer};
pub use types::{AppError, Result};
pub use utils::{ConfigError, RagConfig};

pub use ragline_vector::{DistanceMetric, FlatIndex, SearchHit};
