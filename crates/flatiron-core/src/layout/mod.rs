// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The layout engine: document algebra and renderer.
//!
//! **DDD Context:** Formatting — Layout
//!
//! The builder produces a [`Document`] tree; [`pretty`] renders it at a
//! target line width. See [`document`] for the algebra and [`render`] for
//! the group-fit decision and text emission.

pub mod document;
pub mod render;

pub use document::{
    blank_line, break_, concat, force_break, group, group_inherit, join, nest, newline, nil, text,
    underneath, Document, Documentable, Inherit, INDENT,
};
pub use render::{pretty, Sdoc};
