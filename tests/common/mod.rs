#![allow(dead_code)]

pub mod mocks;

use ragline::rag::chunker::Segmenter;
use ragline::rag::normalizer::TextNormalizer;
use ragline::rag::store::ChunkStore;

/// A short extracted "book" with page markers and ragged spacing.
pub const SAMPLE_DOCUMENT: &str = "--- Page 1 ---
Introduction
An operating system is software that manages computer hardware, and it provides
common services for programs.   It acts as an intermediary between users and the hardware.



Processes
A process is a program in execution. Each process has its own address space,
registers and program counter. The scheduler decides which process runs next.
Page 2

--- Page 2 ---
Memory Management
Virtual memory lets a process use more memory than is physically installed.
Pages are mapped to frames by the page table. A page fault occurs when a page
is not resident in memory.

File Systems
A file system organizes data on storage devices into files and directories.
";

/// Normalize and segment [`SAMPLE_DOCUMENT`].
pub fn sample_store(max_words: usize) -> ChunkStore {
    let text = TextNormalizer::default().normalize(SAMPLE_DOCUMENT);
    ChunkStore::new(Segmenter::new(max_words).segment_text(&text))
}
