//! External command execution.
//!
//! Everything that spawns an OS process lives under this module. Probes
//! describe what to run with a [`CommandSpec`] and get back a
//! [`CommandOutput`]; they never touch process handles themselves.

pub mod group;
pub mod runner;

pub use group::run_parallel;
pub use runner::run;

use std::borrow::Cow;

use thiserror::Error;

/// A program plus its already-tokenized arguments. No shell is involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Split captured output into lines.
    pub split: bool,
    /// Treat a nonzero exit status as an error.
    pub check: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            split: true,
            check: false,
        }
    }

    /// Keep output as a single string.
    pub fn raw(mut self) -> Self {
        self.split = false;
        self
    }

    /// Fail on nonzero exit instead of returning whatever was captured.
    pub fn checked(mut self) -> Self {
        self.check = true;
        self
    }

    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Captured output of one finished command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutput {
    Text(String),
    Lines(Vec<String>),
}

impl CommandOutput {
    pub(crate) fn from_text(text: String, split: bool) -> Self {
        if split {
            CommandOutput::Lines(split_lines(&text))
        } else {
            CommandOutput::Text(text)
        }
    }

    pub fn empty(split: bool) -> Self {
        CommandOutput::from_text(String::new(), split)
    }

    pub fn lines(&self) -> Vec<&str> {
        match self {
            CommandOutput::Text(text) => split_lines_ref(text),
            CommandOutput::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }

    /// Line `index`, or `None` when the command produced fewer lines.
    pub fn line(&self, index: usize) -> Option<&str> {
        match self {
            CommandOutput::Text(text) => split_lines_ref(text).get(index).copied(),
            CommandOutput::Lines(lines) => lines.get(index).map(String::as_str),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        match self {
            CommandOutput::Text(text) => Cow::Borrowed(text),
            CommandOutput::Lines(lines) => {
                let mut joined = lines.join("\n");
                if !lines.is_empty() {
                    joined.push('\n');
                }
                Cow::Owned(joined)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandOutput::Text(text) => text.is_empty(),
            CommandOutput::Lines(lines) => lines.is_empty(),
        }
    }
}

/// Split on `\n`, dropping a single trailing empty element.
pub fn split_lines(text: &str) -> Vec<String> {
    split_lines_ref(text).into_iter().map(str::to_string).collect()
}

fn split_lines_ref(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("supervising task ended before the command finished")]
    Supervisor,
    #[error("`{program}` exited with status {code:?}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        output: CommandOutput,
    },
}

impl CommandError {
    /// The binary could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommandError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Output captured before a strict-mode failure.
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            CommandError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_one_trailing_empty_line() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn line_lookup_is_bounded() {
        let out = CommandOutput::from_text("header\nrow\n".to_string(), true);
        assert_eq!(out.line(1), Some("row"));
        assert_eq!(out.line(2), None);

        let raw = CommandOutput::from_text("only\n".to_string(), false);
        assert_eq!(raw.line(0), Some("only"));
        assert_eq!(raw.line(1), None);
    }

    #[test]
    fn text_round_trips_split_output() {
        let out = CommandOutput::from_text("x\ny\n".to_string(), true);
        assert_eq!(out.text(), "x\ny\n");
        assert!(CommandOutput::empty(true).is_empty());
    }

    #[test]
    fn command_builders() {
        let spec = CommandSpec::new("ping", ["-c", "1", "host"]).raw().checked();
        assert!(!spec.split);
        assert!(spec.check);
        assert_eq!(spec.display(), "ping -c 1 host");
    }
}
