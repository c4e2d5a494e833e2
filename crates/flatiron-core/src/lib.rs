// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Flatiron: a source-code formatter for Erlang.
//!
//! This crate contains the formatter core:
//! - Lexical analysis ([`source_analysis`]): source text to a flat token
//!   stream, comments included
//! - Layout ([`layout`]): a strictly-pretty document algebra and renderer
//! - Building ([`builder`]): the token-driven document builder encoding the
//!   language's formatting rules
//! - Verification ([`equivalence`]): the post-format semantic check
//!
//! The pipeline is `tokens → build(document) → lay-out(sdoc) → emit(text)`.
//! It is single-threaded, synchronous, and CPU-bound: callers may
//! parallelise over files but not within a single format.
//!
//! # Example
//!
//! ```
//! use flatiron_core::{format_source, FormatOptions};
//!
//! let out = format_source("foo( X )->ok.", &FormatOptions::default()).unwrap();
//! assert_eq!(out, "foo(X) -> ok.\n");
//! ```

pub mod builder;
pub mod equivalence;
pub mod error;
pub mod layout;
pub mod source_analysis;

pub use builder::format_tokens;
pub use equivalence::{check_equivalence, EquivalenceError};
pub use error::FormatError;

/// Default target line width.
pub const DEFAULT_LINE_LENGTH: usize = 100;

/// Core-level formatting options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Target line width in columns (byte-width accounting).
    pub line_length: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

/// Lexes and formats Erlang source text.
///
/// # Errors
///
/// Returns a [`FormatError`] if the source does not tokenize or the token
/// stream cannot be built into a document.
pub fn format_source(source: &str, options: &FormatOptions) -> Result<String, FormatError> {
    let tokens = source_analysis::lex(source)?;
    let width = isize::try_from(options.line_length).unwrap_or(isize::MAX);
    format_tokens(&tokens, width)
}
