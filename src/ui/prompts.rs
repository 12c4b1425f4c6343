//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode; the workflow holds no
//! [`Prompt`] at all otherwise. [`Prompter`] works over any reader and
//! writer so it can be driven from a byte buffer in tests. In production it
//! reads stdin and writes the question to stderr, keeping stdout for
//! results.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled: input closed")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Something that can ask the user questions.
pub trait Prompt {
    /// Yes/no question. `default` applies to an empty answer.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Free-text question. Returns the trimmed answer.
    fn input(&mut self, message: &str) -> Result<String, PromptError>;
}

/// Line-based prompter.
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompter over the terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the writer (tests inspect what was asked).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>, PromptError> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompt for Prompter<R, W> {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = match self.ask(&format!("{} ({}): ", message, hint))? {
            Some(answer) => answer,
            None => return Ok(false),
        };

        if answer.is_empty() {
            return Ok(default);
        }
        Ok(is_yes(&answer))
    }

    fn input(&mut self, message: &str) -> Result<String, PromptError> {
        self.ask(&format!("{}: ", message))?
            .ok_or(PromptError::Cancelled)
    }
}

/// `y` or `yes`, any case.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
