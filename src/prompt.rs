// User Prompt collaborator
// confirm() gates destructive actions, notify() surfaces messages.

use std::io::{self, BufRead, Write};

pub trait UserPrompt {
    fn confirm(&mut self, message: &str) -> bool;
    fn notify(&mut self, message: &str);
}

/// Prompts on stdin/stdout. With `assume_yes` every confirmation passes.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Fixed answer for every confirmation; records everything it was shown
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: bool,
    pub confirmations: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        self.confirmations.push(message.to_string());
        self.answer
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_scripted_prompt_records() {
        let mut prompt = ScriptedPrompt::answering(false);
        assert!(!prompt.confirm("delete?"));
        prompt.notify("done");
        assert_eq!(prompt.confirmations, vec!["delete?"]);
        assert_eq!(prompt.notices, vec!["done"]);
    }
}
