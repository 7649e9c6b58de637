//! Centralised error hierarchy for the **mlscript interpreter**.
//!
//! All subsystems (scanner, parser, class resolution, runtime, CLI) convert
//! their internal failure modes into one of the variants defined here.  This
//! enables a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving the source line of
//! every diagnostic.
//!
//! The module **does not** print diagnostics itself; front ends decide
//! presentation.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MlError {
    /// Lexical (scanner) error with source line information.
    #[error("LexError on line {line}: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("SyntaxError: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error, tagged with the triggering node's line when
    /// one is known.
    #[error("Runtime Error{}: {message}", fmt_line(.line))]
    Runtime {
        message: String,
        line: Option<usize>,
    },

    /// A `throw` that no `catch` intercepted.  The payload is rendered eagerly
    /// because runtime values are not `Send`.
    #[error("Uncaught exception on line {line}: {value}")]
    Uncaught { value: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn fmt_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" on line {}", line),
        None => String::new(),
    }
}

impl MlError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        MlError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        MlError::Parse { message, line }
    }

    /// Helper constructor for line‑tagged **runtime** failures.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        MlError::Runtime {
            message,
            line: Some(line),
        }
    }

    /// Runtime failure raised where no source line is available (host calls,
    /// class-table bookkeeping).  Callers usually attach a line later through
    /// [`MlError::at_line`].
    pub fn untagged<S: Into<String>>(msg: S) -> Self {
        MlError::Runtime {
            message: msg.into(),
            line: None,
        }
    }

    /// Attach `line` to an untagged runtime error; every other variant is
    /// returned unchanged.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            MlError::Runtime {
                message,
                line: None,
            } => MlError::Runtime {
                message,
                line: Some(line),
            },
            other => other,
        }
    }

    /// Source line of the failure, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            MlError::Lex { line, .. } | MlError::Parse { line, .. } => Some(*line),
            MlError::Runtime { line, .. } => *line,
            MlError::Uncaught { line, .. } => Some(*line),
            MlError::Io(_) | MlError::Utf8(_) => None,
        }
    }

    /// Lex and parse failures abort the whole parse unit; front ends use this
    /// to pick an exit status.
    pub fn is_static(&self) -> bool {
        matches!(self, MlError::Lex { .. } | MlError::Parse { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, MlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_errors_pick_up_a_line_once() {
        let err = MlError::untagged("boom").at_line(4).at_line(9);

        assert_eq!(err.line(), Some(4));
        assert_eq!(err.to_string(), "Runtime Error on line 4: boom");
    }

    #[test]
    fn static_errors_are_classified() {
        assert!(MlError::lex(1, "x").is_static());
        assert!(MlError::parse(1, "x").is_static());
        assert!(!MlError::runtime(1, "x").is_static());
    }
}
