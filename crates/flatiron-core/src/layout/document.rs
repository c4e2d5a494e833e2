// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Strictly-pretty document tree for source formatting.
//!
//! **DDD Context:** Formatting — Layout
//!
//! This module provides a composable [`Document`] type in the style of
//! Lindig's *Strictly Pretty* (2000). Builder functions return `Document`
//! values that are rendered in a final pass by [`crate::layout::pretty`].
//!
//! # Example
//!
//! ```
//! use flatiron_core::docvec;
//! use flatiron_core::layout::{break_, group, nest, pretty, INDENT};
//!
//! let doc = group(docvec!["foo(", nest(INDENT, docvec![break_(""), "Arg"]), break_(""), ")"]);
//! assert_eq!(pretty(&doc, 100), "foo(Arg)\n");
//! assert_eq!(pretty(&doc, 1), "foo(\n    Arg\n)\n");
//! ```
//!
//! Two decorations extend the paper's algebra:
//!
//! - [`Document::ForceBreak`] renders a subtree in break mode regardless of
//!   fit, used when an inline comment or a multi-clause construct must not
//!   be flattened.
//! - [`Document::Group`] carries an [`Inherit`] flag: an inheriting group
//!   adopts the enclosing group's mode instead of making its own decision,
//!   which is how a forced break propagates downwards.

use ecow::EcoString;

/// Indentation width used throughout formatting.
pub const INDENT: isize = 4;

/// Whether a group makes its own layout decision or adopts its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inherit {
    /// The group makes a fresh flat-or-break decision.
    SelfDecide,
    /// The group adopts the enclosing group's mode. A forced break above
    /// propagates through it; in flat surroundings it decides for itself.
    FromEnclosing,
}

/// A pretty-printable document tree.
///
/// Documents are immutable trees describing layout alternatives. The
/// renderer picks flat or broken layout per [`Document::Group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    /// Empty document.
    Nil,
    /// An inline literal string; width is its byte length.
    Text(EcoString),
    /// A sequence of documents (n-ary concatenation).
    Vec(Vec<Document>),
    /// A break point. Renders as its literal in flat mode and as newline
    /// plus indentation in break mode. The literals `"\n"` and `"\n\n"`
    /// render as (blank) line breaks in both modes.
    Break(EcoString),
    /// Adds to the current indentation for the inner document.
    Nest(isize, Box<Document>),
    /// Sets the inner document's indentation to the current column plus an
    /// offset (column-anchored indent).
    Underneath(isize, Box<Document>),
    /// A layout unit, rendered entirely flat or entirely broken.
    Group(Box<Document>, Inherit),
    /// Renders the inner document in break mode regardless of fit.
    ForceBreak(Box<Document>),
}

/// Coerce a value into a [`Document`].
pub trait Documentable {
    /// Converts this value into a `Document`.
    fn to_doc(self) -> Document;
}

impl Documentable for &str {
    fn to_doc(self) -> Document {
        Document::Text(self.into())
    }
}

impl Documentable for String {
    fn to_doc(self) -> Document {
        Document::Text(self.into())
    }
}

impl Documentable for EcoString {
    fn to_doc(self) -> Document {
        Document::Text(self)
    }
}

impl Documentable for Document {
    fn to_doc(self) -> Document {
        self
    }
}

impl Documentable for Vec<Document> {
    fn to_doc(self) -> Document {
        Document::Vec(self)
    }
}

/// Join multiple documents together in a vector.
///
/// Each element is converted to a `Document` via the [`Documentable`]
/// trait. Documents are concatenated directly — no separator is inserted.
#[macro_export]
macro_rules! docvec {
    () => {
        $crate::layout::Document::Vec(Vec::new())
    };

    ($first:expr $(,)?) => {
        $crate::layout::Document::Vec(
            vec![$crate::layout::Documentable::to_doc($first)]
        )
    };

    ($first:expr, $($rest:expr),+ $(,)?) => {
        match $crate::layout::Documentable::to_doc($first) {
            $crate::layout::Document::Vec(mut vec) => {
                $(
                    vec.push($crate::layout::Documentable::to_doc($rest));
                )*
                $crate::layout::Document::Vec(vec)
            },
            first => {
                $crate::layout::Document::Vec(
                    vec![first, $($crate::layout::Documentable::to_doc($rest)),+]
                )
            }
        }
    };
}

/// Creates a `Nil` document — an empty document.
#[must_use]
pub fn nil() -> Document {
    Document::Nil
}

/// Creates a `Text` document from anything string-like.
#[must_use]
pub fn text(s: impl Into<EcoString>) -> Document {
    Document::Text(s.into())
}

/// Creates a `Break` document with the given flat-mode literal.
#[must_use]
pub fn break_(flat: impl Into<EcoString>) -> Document {
    Document::Break(flat.into())
}

/// Creates a break that renders as a newline in both modes.
#[must_use]
pub fn newline() -> Document {
    Document::Break("\n".into())
}

/// Creates a break that renders as a blank line followed by indentation.
#[must_use]
pub fn blank_line() -> Document {
    Document::Break("\n\n".into())
}

/// Creates a `Nest` document — adds `indent` for the inner document.
#[must_use]
pub fn nest(indent: isize, doc: Document) -> Document {
    Document::Nest(indent, Box::new(doc))
}

/// Creates an `Underneath` document — anchors the inner document's indent
/// at the current column plus `offset`.
#[must_use]
pub fn underneath(offset: isize, doc: Document) -> Document {
    Document::Underneath(offset, Box::new(doc))
}

/// Creates a self-deciding `Group`.
#[must_use]
pub fn group(doc: Document) -> Document {
    Document::Group(Box::new(doc), Inherit::SelfDecide)
}

/// Creates a `Group` that adopts the enclosing group's mode.
#[must_use]
pub fn group_inherit(doc: Document) -> Document {
    Document::Group(Box::new(doc), Inherit::FromEnclosing)
}

/// Creates a `ForceBreak` document.
#[must_use]
pub fn force_break(doc: Document) -> Document {
    Document::ForceBreak(Box::new(doc))
}

/// Joins documents with a separator between each pair.
#[must_use]
pub fn join(docs: impl IntoIterator<Item = Document>, separator: &Document) -> Document {
    let mut result = Vec::new();
    for doc in docs {
        if !result.is_empty() {
            result.push(separator.clone());
        }
        result.push(doc);
    }
    if result.is_empty() {
        return Document::Nil;
    }
    Document::Vec(result)
}

/// Concatenates documents without any separator.
#[must_use]
pub fn concat(docs: impl IntoIterator<Item = Document>) -> Document {
    Document::Vec(docs.into_iter().collect())
}
