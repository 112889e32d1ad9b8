//! Command line tokenization
//!
//! Splits one raw command line into a command name and its arguments.
//! There is no quoting or escaping: every input line is a single atomic
//! command and arguments are separated by runs of whitespace.

/// A command line split into name and arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedCommand {
    /// First token, `None` for an empty or whitespace-only line
    pub name: Option<String>,
    /// Remaining tokens in order
    pub args: Vec<String>,
}

impl TokenizedCommand {
    /// Command name as a string slice
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the line contained no tokens at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

/// Split a command line on runs of whitespace
pub fn tokenize(line: &str) -> TokenizedCommand {
    let mut tokens = line.split_whitespace().map(str::to_string);
    let name = tokens.next();
    TokenizedCommand {
        name,
        args: tokens.collect(),
    }
}

/// First whitespace-delimited token of a command line, without allocating
pub fn command_name(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}
