// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Semantic equivalence checking between input and output.
//!
//! **DDD Context:** Formatting — Verification
//!
//! The driver's second line of defence: after formatting, the original and
//! the reformatted text are re-lexed and their semantic token streams
//! compared. Comments are excluded (they carry no program meaning and the
//! builder may move one across a separator); line numbers are ignored.
//! Literal values compare decoded, so requoting an atom or re-escaping a
//! string is equivalence-preserving while any dropped or reordered token
//! is not.
//!
//! A mismatch means the formatter broke the code; the driver diverts the
//! unsafe output to a crash dump instead of overwriting the file.

use miette::Diagnostic;
use thiserror::Error;

use crate::source_analysis::{lex, LexError, Token, TokenKind};

/// Why the formatted output is not equivalent to the input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EquivalenceError {
    /// The formatted output no longer tokenizes.
    #[error("formatted output no longer tokenizes: {0}")]
    #[diagnostic(code(flatiron::formatter_broke_the_code))]
    Relex(#[from] LexError),

    /// A token changed between input and output.
    #[error(
        "token {index} changed: `{expected}` (input line {original_line}) \
         became `{found}` (output line {formatted_line})"
    )]
    #[diagnostic(code(flatiron::formatter_broke_the_code))]
    Mismatch {
        /// Index into the semantic token stream.
        index: usize,
        /// Canonical text of the input token.
        expected: String,
        /// Canonical text of the output token.
        found: String,
        /// Source line in the input.
        original_line: u32,
        /// Source line in the output.
        formatted_line: u32,
    },

    /// The number of semantic tokens changed.
    #[error("semantic token count changed: {original} before, {formatted} after")]
    #[diagnostic(code(flatiron::formatter_broke_the_code))]
    CountMismatch {
        /// Semantic token count of the input.
        original: usize,
        /// Semantic token count of the output.
        formatted: usize,
    },
}

/// Checks that `formatted` is semantically equivalent to `original`.
///
/// # Errors
///
/// Returns an [`EquivalenceError`] naming the first divergence.
pub fn check_equivalence(original: &str, formatted: &str) -> Result<(), EquivalenceError> {
    let before = significant(lex(original)?);
    let after = significant(lex(formatted)?);

    for (index, (b, a)) in before.iter().zip(after.iter()).enumerate() {
        if b.kind != a.kind {
            return Err(EquivalenceError::Mismatch {
                index,
                expected: b.text().to_string(),
                found: a.text().to_string(),
                original_line: b.line,
                formatted_line: a.line,
            });
        }
    }

    if before.len() != after.len() {
        return Err(EquivalenceError::CountMismatch {
            original: before.len(),
            formatted: after.len(),
        });
    }

    Ok(())
}

fn significant(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Comment(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_changes_are_equivalent() {
        check_equivalence("foo( X )->ok.", "foo(X) -> ok.\n").unwrap();
    }

    #[test]
    fn requoting_an_atom_is_equivalent() {
        check_equivalence("f() -> 'ok'.", "f() -> ok.\n").unwrap();
    }

    #[test]
    fn comment_movement_is_equivalent() {
        check_equivalence("f() -> ok. % done", "% done\nf() -> ok.\n").unwrap();
    }

    #[test]
    fn dropped_token_is_detected() {
        let err = check_equivalence("f() -> {a, b}.", "f() -> {a}.\n").unwrap_err();
        assert!(matches!(
            err,
            EquivalenceError::Mismatch { .. } | EquivalenceError::CountMismatch { .. }
        ));
    }

    #[test]
    fn changed_literal_is_detected() {
        let err = check_equivalence("f() -> 1.", "f() -> 2.\n").unwrap_err();
        let EquivalenceError::Mismatch {
            expected, found, ..
        } = err
        else {
            panic!("expected mismatch, got {err:?}");
        };
        assert_eq!(expected, "1");
        assert_eq!(found, "2");
    }

    #[test]
    fn broken_output_is_detected() {
        let err = check_equivalence("f() -> ok.", "f() -> \"oops.\n").unwrap_err();
        assert!(matches!(err, EquivalenceError::Relex(_)));
    }
}
