// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the layout engine.
//!
//! All three kinds indicate either a bug in the builder or a token stream
//! from an incompatible source language. They are fatal to the current
//! file: the builder never recovers locally and never emits a partial
//! document. The driver's post-format equivalence check is the second line
//! of defence.

use miette::Diagnostic;
use thiserror::Error;

use crate::source_analysis::LexError;

/// An error raised while building or scanning a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FormatError {
    /// Scanner stack underflow, or a bracket/keyword that never closes.
    #[error("malformed token stream near line {line}: unbalanced bracket or keyword")]
    #[diagnostic(code(flatiron::malformed_token_stream))]
    MalformedTokenStream {
        /// The 1-based source line where the imbalance was detected.
        line: u32,
    },

    /// The builder ran out of tokens in the middle of a construct.
    #[error("unexpected end of input")]
    #[diagnostic(code(flatiron::unexpected_end_of_input))]
    UnexpectedEndOfInput,

    /// The builder encountered a token it does not recognise at this
    /// position.
    #[error("unknown token `{token}` at line {line}")]
    #[diagnostic(code(flatiron::unknown_token))]
    UnknownToken {
        /// Canonical text of the offending token.
        token: String,
        /// The 1-based source line of the offending token.
        line: u32,
    },

    /// The source text could not be tokenized.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),
}
