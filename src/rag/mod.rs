//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! Stages, in the order a document flows through them:
//!
//! 1. [`normalizer`] - strip page artifacts, fold whitespace
//! 2. [`chunker`] - heading-aware, sentence-safe chunks under a word budget
//! 3. [`store`] - the `chunk<N>:` text file shared by indexing and querying
//! 4. [`embeddings`] / [`indexer`] - embed every chunk, build and persist an exact index
//! 5. [`retriever`] - embed a question, find the nearest chunks
//! 6. [`answer`] - put the context in a prompt and ask the LLM
//!
//! # Example
//!
//! ```ignore
//! use ragline::rag::{chunker::Segmenter, normalizer::TextNormalizer, store::ChunkStore};
//!
//! let text = TextNormalizer::default().normalize(&raw);
//! let store = ChunkStore::new(Segmenter::new(400).segment_text(&text));
//! store.write("output_chunks_fixed.txt").await?;
//!
//! let index = indexer::build_index(embedder.as_ref(), &store, 32, DistanceMetric::Euclidean).await?;
//! let retriever = Retriever::new(embedder, Arc::new(index), Arc::new(store));
//! let context = retriever.retrieve("What is a kernel?", 2, 500).await?;
//! ```

pub mod answer;
pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod indexer;
pub mod normalizer;
pub mod retriever;
pub mod store;

pub use answer::{build_prompt, AnswerEngine, AnswerSettings};
pub use cache::CachedEmbedder;
pub use chunker::{Chunk, Segmenter};
pub use embeddings::Embedder;
pub use normalizer::TextNormalizer;
pub use retriever::Retriever;
pub use store::ChunkStore;
