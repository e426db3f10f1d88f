//! Heading-aware, sentence-safe chunking.
//!
//! The segmenter walks normalized text line by line. Short unpunctuated lines
//! become the active heading, blank lines end a paragraph, and everything
//! else accumulates into the current paragraph. Each finished paragraph is
//! split into sentences and greedily packed into chunks of at most
//! `max_words` words. A sentence is never split: one that is longer than the
//! budget gets a chunk of its own.

use crate::utils::toml_config::ChunkingConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Heading label used until the first heading line is seen.
pub const DEFAULT_HEADING: &str = "General";

/// A capitalized title made of letters, spaces and hyphens, or "Lecture".
static SHORT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Lecture|[A-Z][A-Za-z\s\-]+)$").expect("valid regex"));

/// An immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    id: usize,
    heading: String,
    body: String,
}

impl Chunk {
    /// Create a chunk. `id` is its 0-based position in the chunk sequence.
    pub fn new(id: usize, heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            heading: heading.into(),
            body: body.into(),
        }
    }

    /// Positional id, aligned with the vector id in the index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// 1-based number used in the chunk store (`chunk<N>:`).
    pub fn number(&self) -> usize {
        self.id + 1
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The retrievable text: heading, newline, body. An empty part is
    /// left out along with the newline.
    pub fn text(&self) -> String {
        match (self.heading.is_empty(), self.body.is_empty()) {
            (false, false) => format!("{}\n{}", self.heading, self.body),
            (true, _) => self.body.clone(),
            (false, true) => self.heading.clone(),
        }
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.body)
    }
}

/// How a single input line is treated by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only: ends the current paragraph.
    Blank,
    /// Becomes the active heading.
    Heading,
    /// Appended to the current paragraph.
    Body,
}

/// Classify one line.
pub fn classify_line(line: &str, heading_max_words: usize) -> LineKind {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Blank
    } else if is_heading(line, heading_max_words) {
        LineKind::Heading
    } else {
        LineKind::Body
    }
}

/// Heading heuristic.
///
/// A line is a heading when it is a short title (capitalized letters,
/// spaces and hyphens only, or the literal "Lecture"), or when it has at
/// most `heading_max_words` words and does not end with a period. Short
/// statements without a final period are therefore headings too.
pub fn is_heading(line: &str, heading_max_words: usize) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    if SHORT_TITLE.is_match(line) {
        return true;
    }
    count_words(line) <= heading_max_words && !line.ends_with('.')
}

/// Number of whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split a paragraph into sentences.
///
/// A boundary is a run of whitespace directly after `.`, `!` or `?`; the
/// punctuation stays with its sentence. Fragments are trimmed and empty
/// ones dropped.
pub fn split_sentences<'a>(text: &'a str) -> Vec<&'a str> {
    let mut sentences = Vec::new();
    let mut push = |fragment: &'a str| {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            sentences.push(fragment);
        }
    };

    let mut start = 0;
    let mut after_terminal = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if after_terminal && c.is_whitespace() {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            push(&text[start..i]);
            start = end;
            after_terminal = false;
            continue;
        }
        after_terminal = matches!(c, '.' | '!' | '?');
    }
    push(&text[start..]);

    sentences
}

/// Greedily pack sentences into groups of at most `max_words` words.
///
/// A sentence goes into the current group unless that would push the group
/// past `max_words` *and* the group already holds something; then the group
/// is closed first. Reaching exactly `max_words` does not close a group.
pub fn pack_sentences<'a>(sentences: &[&'a str], max_words: usize) -> Vec<Vec<&'a str>> {
    let mut groups = Vec::new();
    let mut current: Vec<&'a str> = Vec::new();
    let mut current_count = 0;

    for &sentence in sentences {
        let word_count = count_words(sentence);
        if current_count + word_count > max_words && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
            current_count = 0;
        }
        current.push(sentence);
        current_count += word_count;
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Splits normalized text into labeled, word-bounded chunks.
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_words: usize,
    heading_max_words: usize,
    default_heading: String,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl Segmenter {
    /// Create a segmenter with the given word budget and default heuristics.
    ///
    /// A budget of 0 is treated as 1.
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
            heading_max_words: ChunkingConfig::default().heading_max_words,
            default_heading: DEFAULT_HEADING.to_string(),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_words)
            .with_heading_max_words(config.heading_max_words)
            .with_default_heading(config.default_heading.clone())
    }

    pub fn with_heading_max_words(mut self, words: usize) -> Self {
        self.heading_max_words = words;
        self
    }

    pub fn with_default_heading(mut self, heading: impl Into<String>) -> Self {
        self.default_heading = heading.into();
        self
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Segment a document given as ordered lines.
    pub fn segment<I, S>(&self, lines: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chunks = lines
            .into_iter()
            .fold(SegmentState::default(), |state, line| {
                state.feed(self, line.as_ref())
            })
            .finish(self);

        debug!(chunks = chunks.len(), max_words = self.max_words, "Segmented document");
        chunks
    }

    /// Segment a whole document, splitting it into lines first.
    pub fn segment_text(&self, text: &str) -> Vec<Chunk> {
        self.segment(text.lines())
    }
}

/// Accumulator threaded through a single pass over the lines.
#[derive(Debug, Default)]
struct SegmentState {
    heading: Option<String>,
    paragraph: Vec<String>,
    chunks: Vec<Chunk>,
}

impl SegmentState {
    fn feed(mut self, segmenter: &Segmenter, line: &str) -> Self {
        match classify_line(line, segmenter.heading_max_words) {
            LineKind::Blank => self.flush_paragraph(segmenter),
            LineKind::Heading => {
                self.flush_paragraph(segmenter);
                self.heading = Some(line.trim().to_string());
            }
            LineKind::Body => self.paragraph.push(line.trim().to_string()),
        }
        self
    }

    fn flush_paragraph(&mut self, segmenter: &Segmenter) {
        if self.paragraph.is_empty() {
            return;
        }

        let paragraph = self.paragraph.join(" ");
        self.paragraph.clear();

        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            return;
        }

        let heading = self
            .heading
            .as_deref()
            .unwrap_or(&segmenter.default_heading);
        let sentences = split_sentences(paragraph);

        for group in pack_sentences(&sentences, segmenter.max_words) {
            let chunk = Chunk::new(self.chunks.len(), heading, group.join(" "));
            trace!(id = chunk.id(), words = chunk.word_count(), heading, "Emitted chunk");
            self.chunks.push(chunk);
        }
    }

    fn finish(mut self, segmenter: &Segmenter) -> Vec<Chunk> {
        self.flush_paragraph(segmenter);
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Introduction", true)]
    #[case("Lecture", true)]
    #[case("Operating System Concepts", true)]
    #[case("Self-Paced Learning Module", true)]
    #[case("1.2 Process scheduling", true)]
    #[case("What is a kernel?", true)]
    #[case("The kernel manages memory.", false)]
    #[case("", false)]
    #[case("   ", false)]
    #[case(
        "a process is a program in execution and it has its own address space",
        false
    )]
    #[case(
        "A Process Is A Program In Execution With Its Own Private Address Space",
        true
    )]
    fn test_is_heading(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_heading(line, 10), expected);
    }

    #[rstest]
    #[case("One. Two! Three? Four", vec!["One.", "Two!", "Three?", "Four"])]
    #[case("No terminal punctuation here", vec!["No terminal punctuation here"])]
    #[case("Version 2.5 is out. Update now.", vec!["Version 2.5 is out.", "Update now."])]
    #[case("Wait...  what?\tYes.", vec!["Wait...", "what?", "Yes."])]
    #[case("  ", vec![])]
    #[case("Ends here.   ", vec!["Ends here."])]
    fn test_split_sentences(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_sentences(text), expected);
    }

    #[test]
    fn test_pack_never_splits_sentences() {
        let sentences = ["a b c.", "d e.", "f g h i.", "j."];
        let groups = pack_sentences(&sentences, 5);
        assert_eq!(groups, vec![vec!["a b c.", "d e."], vec!["f g h i.", "j."]]);
    }

    #[test]
    fn test_pack_oversized_sentence_stands_alone() {
        let sentences = ["short.", "this sentence has far too many words.", "tail."];
        let groups = pack_sentences(&sentences, 3);
        assert_eq!(
            groups,
            vec![
                vec!["short."],
                vec!["this sentence has far too many words."],
                vec!["tail."]
            ]
        );
    }

    #[test]
    fn test_intro_scenario() {
        let chunks = Segmenter::new(100).segment([
            "Introduction",
            "This is sentence one. This is sentence two.",
        ]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].heading(), "Introduction");
        assert_eq!(chunks[0].body(), "This is sentence one. This is sentence two.");
        assert_eq!(chunks[0].text(), "Introduction\nThis is sentence one. This is sentence two.");
        assert_eq!(chunks[0].number(), 1);
    }

    #[test]
    fn test_exact_budget_is_one_chunk() {
        let chunks = Segmenter::new(10).segment([
            "One two three four five. Six seven eight nine ten.",
        ]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count(), 10);
    }

    #[test]
    fn test_one_word_over_budget_splits_at_sentence() {
        let chunks = Segmenter::new(10).segment([
            "One two three four five. Six seven eight nine ten eleven.",
        ]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].word_count() < 10);
        assert_eq!(chunks[0].body(), "One two three four five.");
        assert_eq!(chunks[1].body(), "Six seven eight nine ten eleven.");
    }

    #[test]
    fn test_no_headings_uses_general() {
        let chunks = Segmenter::new(400).segment([
            "The scheduler picks the next process to run on the processor core.",
            "",
            "Memory is divided into pages that are mapped by the page table.",
        ]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.heading() == DEFAULT_HEADING));
    }

    #[test]
    fn test_text_skips_empty_parts() {
        assert_eq!(Chunk::new(0, "H", "body").text(), "H\nbody");
        assert_eq!(Chunk::new(0, "", "body").text(), "body");
        assert_eq!(Chunk::new(0, "H", "").text(), "H");
        assert_eq!(Chunk::new(0, "", "").text(), "");
    }

    #[test]
    fn test_empty_document() {
        assert!(Segmenter::default().segment(Vec::<String>::new()).is_empty());
        assert!(Segmenter::default().segment_text("").is_empty());
        assert!(Segmenter::default().segment_text("\n\n  \n").is_empty());
    }

    #[test]
    fn test_heading_switches_and_flushes() {
        let text = "\
Processes
A process is an instance of a program that is being executed by the system.
It owns resources such as memory and open files.
Threads
A thread is the smallest unit of execution that the scheduler can dispatch.";

        let chunks = Segmenter::new(400).segment_text(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].heading(), "Processes");
        assert_eq!(
            chunks[0].body(),
            "A process is an instance of a program that is being executed by the system. \
             It owns resources such as memory and open files."
        );
        assert_eq!(chunks[1].heading(), "Threads");
        assert_eq!(chunks[1].id(), 1);
    }

    #[test]
    fn test_heading_without_body_emits_nothing() {
        let chunks = Segmenter::new(400).segment(["Chapter One", "Chapter Two"]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_ids_are_sequential() {
        let text = "Topic\nFirst sentence here. Second one here. Third sentence is here.";
        let chunks = Segmenter::new(3).segment_text(text);
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id(), i);
            assert_eq!(chunk.heading(), "Topic");
        }
    }

    #[test]
    fn test_sentences_survive_chunking_intact() {
        let paragraph = "Alpha beta gamma. Delta epsilon! Zeta eta theta iota? \
                         Kappa lambda mu nu xi omicron. Pi.";
        let expected = split_sentences(paragraph);

        for max_words in 1..12 {
            let chunks = Segmenter::new(max_words).segment([paragraph]);
            let rebuilt: Vec<&str> = chunks
                .iter()
                .flat_map(|c| split_sentences(c.body()))
                .collect();
            assert_eq!(rebuilt, expected, "max_words = {}", max_words);

            for chunk in &chunks {
                assert!(chunk.word_count() > 0);
                let sentences = split_sentences(chunk.body());
                assert!(chunk.word_count() <= max_words || sentences.len() == 1);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Heading\nOne two. Three four five. Six.\n\nSeven eight nine ten eleven twelve thirteen.";
        let a = Segmenter::new(4).segment_text(text);
        let b = Segmenter::new(4).segment_text(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_default_heading() {
        let chunks = Segmenter::new(50)
            .with_default_heading("Preface")
            .segment(["This book covers kernels, processes, memory and file systems."]);
        assert_eq!(chunks[0].heading(), "Preface");
    }
}
