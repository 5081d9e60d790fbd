//! Interactive confirmation before cluster mutations.
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

pub trait Confirmer: Send + Sync {
    /// Ask the operator; `true` means proceed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompts on stderr and reads a `y`/`yes` answer from stdin. Anything else declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        let mut err = io::stderr();
        let _ = write!(err, "{prompt} [y/N]: ");
        let _ = err.flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Replays scripted answers in order and records the prompts it saw. Declines once the
/// script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<Vec<bool>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    #[must_use]
    pub fn new(answers: &[bool]) -> Self {
        let mut a = answers.to_vec();
        a.reverse();
        Self {
            answers: Mutex::new(a),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or(false)
    }
}
