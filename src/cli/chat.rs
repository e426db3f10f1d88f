//! Interactive question/answer loop.

use super::output::Output;
use crate::rag::answer::AnswerEngine;
use crate::types::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Shown after a recoverable generation failure.
pub const RETRY_HINT: &str = "Try a shorter question or fewer/more concise context chunks.";

/// Outcome of one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTurn {
    /// `exit` or `quit`
    Exit,
    /// Blank line
    Skip,
    Answer(String),
    /// Generation failed; the session continues
    Recoverable(String),
}

/// Whether `line` asks to end the session (case-insensitive `exit`/`quit`).
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub struct ChatSession {
    engine: AnswerEngine,
}

impl ChatSession {
    pub fn new(engine: AnswerEngine) -> Self {
        Self { engine }
    }

    /// Handle one line of input.
    ///
    /// Generation failures become [`ChatTurn::Recoverable`]; any other error
    /// ends the session and is returned.
    pub async fn handle_line(&self, line: &str) -> Result<ChatTurn> {
        let query = line.trim();
        if query.is_empty() {
            return Ok(ChatTurn::Skip);
        }
        if is_exit_command(query) {
            return Ok(ChatTurn::Exit);
        }

        match self.engine.answer(query).await {
            Ok(answer) => Ok(ChatTurn::Answer(answer)),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Generation failed");
                Ok(ChatTurn::Recoverable(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Read questions from `input` until `exit`, `quit` or end of input.
    pub async fn run<R>(&self, input: R, output: &Output) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            output.prompt();
            let Some(line) = lines.next_line().await? else {
                output.goodbye(true);
                return Ok(());
            };

            match self.handle_line(&line).await? {
                ChatTurn::Exit => {
                    output.goodbye(false);
                    return Ok(());
                }
                ChatTurn::Skip => continue,
                ChatTurn::Answer(answer) => output.answer(&answer),
                ChatTurn::Recoverable(message) => output.generation_failed(&message, RETRY_HINT),
            }
        }
    }
}
