//! Interactive prompts
//!
//! The only cancellation points of a run. End of input, Esc and Ctrl-C all
//! count as "no".

use inquire::InquireError;
use std::io::{self, BufRead, IsTerminal, Write};

pub trait Prompt: Send + Sync {
    /// `y/N` question. Anything but `y`/`yes` is a no.
    fn confirm(&self, question: &str) -> io::Result<bool>;

    /// Free-form answer, `None` on end of input.
    fn ask(&self, question: &str) -> io::Result<Option<String>>;
}

/// Reads answers from stdin, writes questions to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} [y/N] "))?;
        Ok(answer.as_deref().is_some_and(is_yes))
    }

    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}")?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            println!();
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Terminal prompts with line editing, for an operator at a TTY.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        match inquire::Confirm::new(question).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(e) => cancelled(e).map(|()| false),
        }
    }

    fn ask(&self, question: &str) -> io::Result<Option<String>> {
        let question = question.trim_end_matches([':', ' ']);
        match inquire::Text::new(question).prompt() {
            Ok(answer) => Ok(Some(answer.trim().to_string())),
            Err(e) => cancelled(e).map(|()| None),
        }
    }
}

/// `Ok` when the operator backed out of the prompt, the error otherwise.
fn cancelled(err: InquireError) -> io::Result<()> {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => Ok(()),
        InquireError::IO(e) => Err(e),
        other => Err(io::Error::other(other)),
    }
}

/// `InquirePrompt` when both ends are a terminal, `StdinPrompt` when input is
/// piped (inquire refuses to read from a non-TTY).
pub fn for_stdio() -> Box<dyn Prompt> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        Box::new(InquirePrompt)
    } else {
        Box::new(StdinPrompt)
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
