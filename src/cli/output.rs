//! Terminal reporting for the ragline CLI
//!
//! Every pipeline command reports through [`Output`]: one status line per
//! written artifact, a `[n/3]` marker per ingest stage, ranked search hits
//! and the chat exchange. Status lines go to stdout, errors to stderr.

use crate::rag::retriever::RetrievedChunk;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::path::Path;

/// Kind of a one-line status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Info,
    Warn,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Done => "✓",
            Status::Info => "•",
            Status::Warn => "⚠",
            Status::Error => "✗",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Status::Done => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Error => "[ERROR]",
        }
    }
}

/// Stages of `ragline ingest`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Chunk,
    Index,
}

impl Stage {
    const COUNT: usize = 3;

    fn position(self) -> usize {
        match self {
            Stage::Clean => 1,
            Stage::Chunk => 2,
            Stage::Index => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Stage::Clean => "Cleaning text",
            Stage::Chunk => "Chunking",
            Stage::Index => "Embedding and indexing",
        }
    }
}

/// Pipeline reporter; plain text when colors are off
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Format a status line without printing it
    pub fn status_line(&self, status: Status, message: &str) -> String {
        if !self.colored {
            return format!("  {} {}", status.tag(), message);
        }
        match status {
            Status::Done => format!("  {} {}", status.symbol().green().bold(), message.green()),
            Status::Info => format!("  {} {}", status.symbol().blue(), message),
            Status::Warn => format!("  {} {}", status.symbol().yellow().bold(), message.yellow()),
            Status::Error => format!("  {} {}", status.symbol().red().bold(), message.red()),
        }
    }

    /// Print a status line; errors go to stderr
    pub fn status(&self, status: Status, message: &str) {
        let line = self.status_line(status, message);
        if status == Status::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn info(&self, message: &str) {
        self.status(Status::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Status::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Status::Error, message);
    }

    /// Format the `key: value` detail lines under a status line
    pub fn detail_lines(&self, details: &[(&str, String)]) -> Vec<String> {
        details
            .iter()
            .map(|(key, value)| {
                if self.colored {
                    format!("    {}: {}", key.dimmed(), value.bright_white())
                } else {
                    format!("    {}: {}", key, value)
                }
            })
            .collect()
    }

    fn written(&self, what: &str, path: &Path, details: &[(&str, String)]) {
        self.status(Status::Done, &format!("Wrote {} {}", what, path.display()));
        for line in self.detail_lines(details) {
            println!("{}", line);
        }
    }

    /// `[n/3]` marker for an ingest stage
    pub fn stage(&self, stage: Stage) {
        let counter = format!("[{}/{}]", stage.position(), Stage::COUNT);
        if self.colored {
            println!("  {} {}", counter.dimmed(), stage.label().bright_white());
        } else {
            println!("  {} {}", counter, stage.label());
        }
    }

    /// Cleaned text written, with the size change
    pub fn cleaned(&self, path: &Path, chars_before: usize, chars_after: usize) {
        self.written(
            "cleaned text",
            path,
            &[("characters", format!("{} -> {}", chars_before, chars_after))],
        );
    }

    /// Chunk store written
    pub fn store_written(&self, path: &Path, chunks: usize, max_words: usize) {
        self.written(
            "chunk store",
            path,
            &[("chunks", chunks.to_string()), ("max words", max_words.to_string())],
        );
        if chunks == 0 {
            self.warning("No chunks produced; is the input empty?");
        }
    }

    /// Chunk store read from disk
    pub fn store_loaded(&self, path: &Path, chunks: usize) {
        self.info(&format!("Loaded {} chunks from {}", chunks, path.display()));
    }

    /// Index written
    pub fn index_written(&self, path: &Path, vectors: usize, dimensions: usize, model: &str) {
        self.written(
            "index",
            path,
            &[
                ("vectors", vectors.to_string()),
                ("dimensions", dimensions.to_string()),
                ("model", model.to_string()),
            ],
        );
    }

    /// Every ingest stage finished
    pub fn ingested(&self, input: &Path) {
        let message = format!("Document ingested: {}", input.display());
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// Format one ranked hit: a rank line, then the indented preview
    pub fn hit_lines(&self, hit: &RetrievedChunk, preview_chars: usize) -> Vec<String> {
        let rank = format!("Rank {}", hit.rank);
        let distance = format!("(distance={:.4})", hit.distance);
        let mut lines = vec![if self.colored {
            format!("\n  {} {}", rank.bright_cyan().bold(), distance.dimmed())
        } else {
            format!("\n  {} {}", rank, distance)
        }];
        lines.extend(
            hit.preview(preview_chars)
                .lines()
                .map(|line| format!("    {}", line)),
        );
        lines
    }

    /// Ranked search results with previews
    pub fn search_results(&self, hits: &[RetrievedChunk], preview_chars: usize) {
        let title = format!("Top {} relevant chunks", hits.len());
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
        for hit in hits {
            for line in self.hit_lines(hit, preview_chars) {
                println!("{}", line);
            }
        }
    }

    /// Chat banner with the answering model
    pub fn banner(&self, model: &str) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!("\n  {} {}", "ragline".bright_cyan().bold(), version.dimmed());
            println!(
                "  {} {}\n",
                "RAG chatbot is ready, answering with".bright_white(),
                model.bright_white().bold()
            );
        } else {
            println!("\n  ragline {}", version);
            println!("  RAG chatbot is ready, answering with {}\n", model);
        }
    }

    /// Chat input prompt, without a newline
    pub fn prompt(&self) {
        if self.colored {
            print!("{} ", "You:".bright_yellow().bold());
        } else {
            print!("You: ");
        }
        io::stdout().flush().ok();
    }

    /// A generated answer
    pub fn answer(&self, answer: &str) {
        if self.colored {
            println!("\n{} {}\n", "Bot:".bright_green().bold(), answer);
        } else {
            println!("\nBot: {}\n", answer);
        }
    }

    /// A recoverable generation failure and what to try instead
    pub fn generation_failed(&self, message: &str, hint: &str) {
        self.warning(&format!("Error: {}", message));
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), hint.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", hint);
        }
    }

    /// End of the chat session; `eof` when input ran out rather than `exit`
    pub fn goodbye(&self, eof: bool) {
        if eof {
            println!();
        }
        self.info("Goodbye!");
    }
}
