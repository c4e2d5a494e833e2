// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for lexical analysis.
//!
//! Errors carry source locations ([`Span`]) for precise diagnostics.
//! They integrate with [`miette`] for beautiful error reporting.

use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A lexical error encountered during tokenization.
///
/// The formatter treats any lexical error as fatal for the current file:
/// a partial token stream must never reach the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(flatiron::lex))]
pub struct LexError {
    /// The kind of lexical error.
    #[source]
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
    /// The 1-based source line of the error.
    pub line: u32,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span, line: u32) -> Self {
        Self { kind, span, line }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// An unexpected character was encountered.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// A string literal was not terminated.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// A quoted atom was not terminated.
    #[error("unterminated quoted atom")]
    UnterminatedAtom,

    /// An invalid escape sequence in a string, quoted atom, or character.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// An invalid number literal.
    #[error("invalid number literal")]
    InvalidNumber,

    /// An invalid character literal.
    #[error("invalid character literal")]
    InvalidCharacter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('~'), Span::new(0, 1), 1);
        assert_eq!(err.to_string(), "unexpected character '~'");

        let err = LexError::new(LexErrorKind::UnterminatedString, Span::new(0, 10), 2);
        assert_eq!(err.to_string(), "unterminated string literal");
    }

    #[test]
    fn lex_error_location() {
        let err = LexError::new(LexErrorKind::UnterminatedAtom, Span::new(5, 15), 3);
        assert_eq!(err.span.start(), 5);
        assert_eq!(err.line, 3);
    }
}
