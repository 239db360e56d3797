//! Line-oriented command processing for the interactive prompt.

use seglog_core::{CoreError, Log};
use thiserror::Error;

/// Errors returned to the prompt for a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command name is not `APPEND` or `READ`.
    #[error("unsupported command: {0}")]
    Unsupported(String),

    /// The argument of `READ` is not a decimal `u64`.
    #[error("invalid offset: {0:?}")]
    InvalidOffset(String),

    /// The log rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name as typed.
    pub name: String,
    /// Everything after the first space, verbatim.
    pub args: String,
}

impl Command {
    /// Builds a command from a name and its arguments.
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }

    /// Splits a trimmed line on its first space.
    ///
    /// `APPEND hello world` has the name `APPEND` and the arguments
    /// `hello world`; a line without a space has empty arguments.
    pub fn parse(line: &str) -> Self {
        match line.trim().split_once(' ') {
            Some((name, args)) => Self::new(name, args),
            None => Self::new(line.trim(), ""),
        }
    }

    /// Whether the line asks the prompt to stop.
    pub fn is_exit(&self) -> bool {
        self.name.eq_ignore_ascii_case("exit") && self.args.is_empty()
    }
}

/// Runs one command against the log and renders its output.
///
/// Command names are case-insensitive. `APPEND` stores the arguments as the
/// record and prints the offset; `READ` prints the record as text, with
/// invalid UTF-8 replaced.
pub fn process(command: &Command, log: &Log) -> Result<String, CommandError> {
    match command.name.to_ascii_uppercase().as_str() {
        "APPEND" => {
            let offset = log.append(command.args.as_bytes())?;
            Ok(offset.to_string())
        }
        "READ" => {
            let offset = command
                .args
                .trim()
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidOffset(command.args.clone()))?;
            let record = log.read(offset)?;
            Ok(String::from_utf8_lossy(&record).into_owned())
        }
        _ => Err(CommandError::Unsupported(command.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_core::Config;

    #[test]
    fn parse_splits_on_first_space() {
        assert_eq!(
            Command::parse("APPEND hello world"),
            Command::new("APPEND", "hello world")
        );
        assert_eq!(Command::parse("  READ 3  "), Command::new("READ", "3"));
        assert_eq!(Command::parse("APPEND"), Command::new("APPEND", ""));
        assert!(Command::parse("Exit").is_exit());
        assert!(!Command::parse("exit now").is_exit());
    }

    #[test]
    fn processes_commands_in_order() {
        let log = Log::open_in_memory(Config::default()).unwrap();

        let cases: [(&str, &str, Option<&str>); 5] = [
            ("APPEND", "hello world", Some("0")),
            ("READ", "0", Some("hello world")),
            ("READ", "100", None),
            ("INVALID", "", None),
            ("APPEND", "", Some("1")),
        ];

        for (name, args, expected) in cases {
            let result = process(&Command::new(name, args), &log);
            match expected {
                Some(output) => assert_eq!(result.unwrap(), output, "{name} {args}"),
                None => assert!(result.is_err(), "{name} {args}"),
            }
        }
    }

    #[test]
    fn names_are_case_insensitive() {
        let log = Log::open_in_memory(Config::default()).unwrap();
        assert_eq!(process(&Command::parse("append x"), &log).unwrap(), "0");
        assert_eq!(process(&Command::parse("Read 0"), &log).unwrap(), "x");
    }

    #[test]
    fn error_kinds() {
        let log = Log::open_in_memory(Config::default()).unwrap();

        assert!(matches!(
            process(&Command::new("DELETE", "0"), &log),
            Err(CommandError::Unsupported(name)) if name == "DELETE"
        ));
        assert!(matches!(
            process(&Command::new("READ", "-1"), &log),
            Err(CommandError::InvalidOffset(_))
        ));
        assert!(matches!(
            process(&Command::new("READ", "7"), &log),
            Err(CommandError::Core(CoreError::OffsetNotFound { offset: 7 }))
        ));
    }
}
