//! CLI module for ragline
//!
//! Provides command-line interface parsing and handling for the ragline binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod chat;
pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragline - local retrieval augmented generation over a single document
///
/// Cleans extracted document text, splits it into heading-aware chunks,
/// indexes the chunk embeddings and answers questions from the closest chunks.
#[derive(Parser, Debug)]
#[command(
    name = "ragline",
    version,
    about = "ragline - chunk, index and chat with a document using local models",
    long_about = "Cleans extracted document text, splits it into heading-aware chunks under a\n\
                  word budget, embeds and indexes them, and answers questions grounded in the\n\
                  closest chunks using a local LLM (Ollama or llama.cpp).",
    after_help = "EXAMPLES:\n    \
                  ragline clean book.txt -o cleaned.txt   # Strip page markers, fold whitespace\n    \
                  ragline chunk cleaned.txt               # Write output_chunks_fixed.txt\n    \
                  ragline index                           # Embed chunks, write faiss_index.bin\n    \
                  ragline ingest book.txt                 # All three steps at once\n    \
                  ragline search \"What is an operating system?\"\n    \
                  ragline chat                            # Interactive question answering"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./ragline.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize extracted text (page markers, whitespace, blank lines)
    Clean {
        /// Raw extracted text file
        input: PathBuf,

        /// Where to write the cleaned text
        #[arg(short, long, default_value = "cleaned_output.txt")]
        output: PathBuf,
    },

    /// Split cleaned text into heading-labeled chunks
    Chunk {
        /// Cleaned text file
        input: PathBuf,

        /// Chunk store to write (defaults to paths.chunks)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Word budget per chunk (defaults to chunking.max_words)
        #[arg(long)]
        max_words: Option<usize>,
    },

    /// Embed every chunk and write the vector index
    Index {
        /// Chunk store to read (defaults to paths.chunks)
        #[arg(long)]
        chunks: Option<PathBuf>,

        /// Index file to write (defaults to paths.index)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean, chunk and index a raw text file in one pass
    Ingest {
        /// Raw extracted text file
        input: PathBuf,

        /// Word budget per chunk (defaults to chunking.max_words)
        #[arg(long)]
        max_words: Option<usize>,
    },

    /// Show the chunks closest to a query
    Search {
        /// Query text
        query: String,

        /// Number of results
        #[arg(short, default_value_t = 3)]
        k: usize,

        /// Characters of each chunk to show
        #[arg(long, default_value_t = 300)]
        preview_chars: usize,
    },

    /// Answer a single question from the indexed document
    Ask {
        /// The question
        question: String,
    },

    /// Interactive question answering (type 'exit' or 'quit' to leave)
    Chat,

    /// Show the effective configuration
    Config {
        /// Only validate the configuration
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
