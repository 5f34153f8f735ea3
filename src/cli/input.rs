//! User input utilities for interactive CLI prompts
//!
//! Conversion confirmations for `canon --ask`. Prompts go to stderr so a
//! file written to stdout stays clean.

use crate::app::services::unit_conversion::ConversionPrompt;
use crate::{Error, Result};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Ask a yes/no question on stderr and read the answer from `input`
///
/// Empty input answers `default`.
pub fn confirm_with<R: BufRead>(input: &mut R, question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    eprint!("{} {}: ", question, hint);
    io::stderr()
        .flush()
        .map_err(|e| Error::io("Failed to flush stderr", e))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| Error::io("Failed to read user input", e))?;

    Ok(parse_answer(&answer).unwrap_or(default))
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks on the terminal before each conversion
///
/// Answers are remembered per parameter and unit pair, so a batch asks
/// once for every distinct conversion.
#[derive(Debug, Default)]
pub struct StdinPrompt {
    answers: Mutex<HashMap<(String, String, String), bool>>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversionPrompt for StdinPrompt {
    fn confirm(&self, parameter: &str, from: &str, to: &str) -> bool {
        // Holding the lock while asking keeps concurrent prompts apart
        let mut answers = self.answers.lock().unwrap_or_else(|e| e.into_inner());
        let key = (parameter.to_string(), from.to_string(), to.to_string());
        if let Some(&answer) = answers.get(&key) {
            return answer;
        }

        let question = format!("Convert {} from {} to {}?", parameter, from, to);
        let answer = confirm_with(&mut io::stdin().lock(), &question, false).unwrap_or(false);
        answers.insert(key, answer);
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Some(true));
        assert_eq!(parse_answer(" YES "), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("maybe"), None);
    }

    #[test]
    fn test_confirm_with_default() {
        let mut input = Cursor::new("\n");
        assert!(confirm_with(&mut input, "Convert?", true).unwrap());

        let mut input = Cursor::new("\n");
        assert!(!confirm_with(&mut input, "Convert?", false).unwrap());

        let mut input = Cursor::new("yes\n");
        assert!(confirm_with(&mut input, "Convert?", false).unwrap());
    }

    #[test]
    fn test_remembered_answers_skip_the_terminal() {
        let prompt = StdinPrompt::new();
        prompt
            .answers
            .lock()
            .unwrap()
            .insert(("OXYGEN".into(), "ML/L".into(), "UMOL/KG".into()), true);
        assert!(prompt.confirm("OXYGEN", "ML/L", "UMOL/KG"));
    }
}
