use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unterminated string, invalid line continuation, unknown character.
    Lexical,
    /// Unexpected token, missing or mismatched terminator.
    Syntax,
    /// Recognized syntax that this parser deliberately does not model.
    Unsupported,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parse failure. Grammar rules return this; the statement parser turns it into a
/// [`Diagnostic`] once it has decided how to recover.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error at {span}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexical, message, span)
    }

    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Unsupported, message, span)
    }
}

/// Input that cannot be treated as VBA source text at all.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },
    #[error("source looks like binary data (NUL byte at offset {offset})")]
    Binary { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// What the parser did to carry on after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryKind {
    /// The rest of the logical line was replaced by an error node.
    SkippedToLineEnd,
    /// Skipped up to the next `:` statement separator.
    SkippedToSeparator,
    /// An open block was closed implicitly at end of input.
    ClosedAtEndOfInput,
    /// An open block was closed by a terminator belonging to an enclosing block.
    ClosedByOuterTerminator,
    /// The block was closed by a terminator of the wrong kind.
    ClosedByMismatchedTerminator,
    /// A block opened past the nesting limit was skipped through its matching terminator.
    SkippedBlock,
    /// The offending clause was skipped; the surrounding statement or header line was kept.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub recovery: RecoveryKind,
}

impl Diagnostic {
    #[must_use]
    pub fn from_error(err: ParseError, recovery: RecoveryKind) -> Self {
        let severity = match err.kind {
            ErrorKind::Unsupported if recovery == RecoveryKind::Skipped => Severity::Warning,
            _ => Severity::Error,
        };
        Self {
            severity,
            kind: err.kind,
            span: err.span,
            message: err.message,
            recovery,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.span.start.line,
            self.span.start.column,
            self.severity.as_str(),
            self.kind,
            self.message
        )
    }
}
