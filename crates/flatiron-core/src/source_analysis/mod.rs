// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokenization infrastructure for Erlang source code.
//!
//! **DDD Context:** Source Analysis
//!
//! The [`lex`] function converts source text into a flat stream of
//! [`Token`]s. Each token carries its [`TokenKind`] and 1-based source
//! line; comments are ordinary tokens so the layout engine can place them.
//!
//! ```
//! use flatiron_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("foo(X) -> ok.").unwrap();
//! assert_eq!(tokens.len(), 7);
//! assert!(matches!(tokens[0].kind, TokenKind::Atom(_)));
//! ```
//!
//! # Error Handling
//!
//! Lexical errors are fatal: the formatter must never rewrite a file it
//! could not tokenize completely. [`LexError`] integrates with miette for
//! structured diagnostics.

mod error;
mod lexer;
mod span;
mod token;

#[cfg(test)]
mod lexer_property_tests;

pub use error::{LexError, LexErrorKind};
pub use lexer::lex;
pub use span::Span;
pub use token::{atom_needs_quotes, print_atom, print_string, Token, TokenKind};
