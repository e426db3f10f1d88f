//! Chunk store: the on-disk text file shared by the chunking and retrieval
//! stages.
//!
//! Records are written as `chunk<N>:\n<heading>\n<body>\n\n` with `N` the
//! 1-based emission order. When reading, any line starting with `chunk`
//! opens a new record, so ids are positional: the `k`-th record read gets id
//! `k - 1`, which is also the id of its vector in the index.
//!
//! A heading or body line that itself starts with `chunk` therefore opens a
//! record of its own when read back. Such a line is kept as the first line
//! of the new record, and the record it interrupted keeps whatever it had
//! read so far (possibly nothing). Index the store as read back, see
//! [`ChunkStore::as_stored`], so vector ids match what retrieval loads.

use crate::rag::chunker::Chunk;
use crate::types::{AppError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Prefix that marks the start of a record.
pub const RECORD_PREFIX: &str = "chunk";

/// A record label as written by [`ChunkStore::render`].
static RECORD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^chunk\d+:\s*$").expect("valid regex"));

/// Ordered, id-addressable collection of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
}

impl ChunkStore {
    /// Build a store from chunks in emission order.
    ///
    /// Ids are reassigned positionally so they always match vector ids.
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(id, chunk)| {
                if chunk.id() == id {
                    chunk
                } else {
                    Chunk::new(id, chunk.heading(), chunk.body())
                }
            })
            .collect();
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Retrievable text of every chunk, in id order.
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(Chunk::text).collect()
    }

    /// Render the store file contents.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            out.push_str(&format!(
                "{}{}:\n{}\n{}\n\n",
                RECORD_PREFIX,
                chunk.number(),
                chunk.heading(),
                chunk.body()
            ));
        }
        out
    }

    /// Parse store file contents.
    ///
    /// Within a record the first non-blank line is the heading and the
    /// remaining lines form the body; a record with no lines has an empty
    /// heading and body. Non-blank text before the first record is rejected.
    pub fn parse(content: &str) -> Result<Self> {
        let mut records: Vec<Vec<&str>> = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            if line.starts_with(RECORD_PREFIX) {
                if RECORD_LABEL.is_match(line) {
                    records.push(Vec::new());
                } else {
                    records.push(vec![line]);
                }
                continue;
            }
            match records.last_mut() {
                Some(record) => record.push(line),
                None if line.trim().is_empty() => {}
                None => {
                    return Err(AppError::InvalidInput(format!(
                        "line {}: text before the first '{}' record",
                        line_no + 1,
                        RECORD_PREFIX
                    )))
                }
            }
        }

        let chunks: Vec<Chunk> = records
            .into_iter()
            .enumerate()
            .map(|(id, lines)| parse_record(id, &lines))
            .collect();

        debug!(chunks = chunks.len(), "Parsed chunk store");
        Ok(Self { chunks })
    }

    /// The store exactly as [`read`](Self::read) will see it after
    /// [`write`](Self::write).
    ///
    /// Equal to `self` unless a heading or body line starts with `chunk`.
    pub fn as_stored(&self) -> Result<Self> {
        let stored = Self::parse(&self.render())?;
        if stored.len() != self.len() {
            warn!(
                written = self.len(),
                read_back = stored.len(),
                "Lines starting with '{}' split records in the chunk store",
                RECORD_PREFIX
            );
        }
        Ok(stored)
    }

    /// Write the store to `path`, creating parent directories.
    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.render()).await?;
        info!(chunks = self.len(), path = %path.display(), "Wrote chunk store");
        Ok(())
    }

    /// Read a store file. A missing file is [`AppError::InputNotFound`].
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::InputNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self::parse(&content)?;
        if store.is_empty() {
            warn!(path = %path.display(), "Chunk store contains no records");
        }
        info!(chunks = store.len(), path = %path.display(), "Loaded chunk store");
        Ok(store)
    }
}

fn parse_record(id: usize, lines: &[&str]) -> Chunk {
    let mut lines = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty());
    let heading = lines.next().unwrap_or_default();
    let body = lines.collect::<Vec<_>>().join("\n");

    Chunk::new(id, heading, body)
}
