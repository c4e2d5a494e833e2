// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The token-driven document builder.
//!
//! **DDD Context:** Formatting — Builder
//!
//! [`format_tokens`] consumes the flat token stream one top-level item at a
//! time — attributes, specs, types, functions, comments, top-level config
//! lists — and joins the item documents with the blank-line policy:
//!
//! - consecutive attributes of the same name stay adjacent, different
//!   names get a blank line (conditional-compilation attributes count as
//!   one name so `-ifdef`/`-else`/`-endif` fences stay tight);
//! - a spec sticks to the function it describes;
//! - consecutive type declarations stay adjacent;
//! - module comments (`%%`) stack; a function comment sticks to what
//!   follows it;
//! - everything else is separated by one blank line.
//!
//! Specs and types have their outer parentheses stripped before building so
//! `-spec f(a) -> b.` and `-spec (f(a) -> b).` format identically. Bare
//! attributes (`-else.`, `-endif.`) print as-is; attributes with
//! unparenthesised trailing content are canonicalised to the parenthesised
//! form.

use ecow::{eco_format, EcoString};

use crate::docvec;
use crate::error::FormatError;
use crate::layout::{
    blank_line, break_, force_break, group, group_inherit, join, nest, newline, pretty, text,
    underneath, Document, INDENT,
};
use crate::source_analysis::{print_atom, Token, TokenKind};

pub(crate) mod clause;
pub(crate) mod expr;
pub(crate) mod scan;

use scan::Tag;

/// The primary entry: formats a complete token stream at the given width.
///
/// # Errors
///
/// Returns a [`FormatError`] if the stream is unbalanced, truncated, or
/// contains a token the builder does not recognise at that position.
pub fn format_tokens(tokens: &[Token], width: isize) -> Result<String, FormatError> {
    let doc = module_doc(tokens)?;
    Ok(pretty(&doc, width))
}

/// What the previous top-level item was; drives the blank-line policy.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemKind {
    Attribute(EcoString),
    Spec,
    Type,
    Function,
    ModuleComment,
    FunctionComment,
    List,
    Expr,
}

fn module_doc(tokens: &[Token]) -> Result<Document, FormatError> {
    let mut docs: Vec<Document> = Vec::new();
    let mut prev: Option<ItemKind> = None;
    let mut toks = tokens;

    while !toks.is_empty() {
        let (doc, kind, rest) = item_doc(toks)?;
        let consumed_last_line = toks[..toks.len() - rest.len()].last().map(|t| t.line);
        let (doc, rest) = attach_trailing_comment(doc, consumed_last_line, rest);

        if let Some(prev_kind) = &prev {
            docs.push(separator(prev_kind, &kind));
        }
        docs.push(doc);
        prev = Some(kind);
        toks = rest;
    }

    Ok(Document::Vec(docs))
}

/// A comment on the same line as the item's last token stays adjacent.
fn attach_trailing_comment<'a>(
    doc: Document,
    last_line: Option<u32>,
    rest: &'a [Token],
) -> (Document, &'a [Token]) {
    if let (Some(line), Some(tok)) = (last_line, rest.first()) {
        if let TokenKind::Comment(c) = &tok.kind {
            if tok.line == line {
                return (docvec![doc, text(eco_format!(" {c}"))], &rest[1..]);
            }
        }
    }
    (doc, rest)
}

/// The blank-line policy: a single newline keeps items adjacent, a blank
/// line separates them.
fn separator(prev: &ItemKind, cur: &ItemKind) -> Document {
    use ItemKind as K;
    match (prev, cur) {
        (K::ModuleComment, K::ModuleComment | K::Expr) => newline(),
        (K::FunctionComment, K::ModuleComment) => blank_line(),
        (K::FunctionComment, _) => newline(),
        (K::Attribute(a), K::Attribute(b)) if a == b => newline(),
        (K::Spec, K::Function) => newline(),
        (K::Type, K::Type) => newline(),
        _ => blank_line(),
    }
}

/// Conditional-compilation attributes count as one attribute kind, so no
/// blank lines appear inside `-ifdef`/`-else`/`-endif` fences.
fn attr_key(name: &str) -> EcoString {
    if matches!(
        name,
        "ifdef" | "ifndef" | "else" | "elif" | "endif" | "if" | "define"
    ) {
        "(conditional)".into()
    } else {
        name.into()
    }
}

fn item_doc(tokens: &[Token]) -> Result<(Document, ItemKind, &[Token]), FormatError> {
    use TokenKind as T;
    match tokens {
        [t, rest @ ..] => {
            if let T::Comment(c) = &t.kind {
                let kind = if c.starts_with("%%") {
                    ItemKind::ModuleComment
                } else {
                    ItemKind::FunctionComment
                };
                return Ok((text(c.clone()), kind, rest));
            }
            if matches!(&t.kind, T::Op(op) if op == "-")
                && matches!(rest.first().map(|t| &t.kind), Some(T::Atom(_) | T::If))
            {
                return attribute_doc(tokens);
            }
            form_doc(tokens)
        }
        [] => Err(FormatError::UnexpectedEndOfInput),
    }
}

/// A function, top-level config list, or bare expression/macro form.
fn form_doc(tokens: &[Token]) -> Result<(Document, ItemKind, &[Token]), FormatError> {
    let (item, rest) = match scan::until(tokens, &TokenKind::Dot) {
        Ok(split) => split,
        // Config fragments and test inputs may omit the final dot.
        Err(FormatError::UnexpectedEndOfInput) => (tokens, &tokens[tokens.len()..]),
        Err(e) => return Err(e),
    };

    if scan::find_top_level(item, &TokenKind::Arrow).is_some() {
        let (force, doc, _) = clause::clauses_doc(item)?;
        let doc = group(if force { force_break(doc) } else { doc });
        return Ok((doc, ItemKind::Function, rest));
    }

    let kind = match item.first().map(|t| &t.kind) {
        Some(TokenKind::LeftBracket | TokenKind::LeftBrace) => ItemKind::List,
        _ => ItemKind::Expr,
    };
    let has_dot = matches!(item.last().map(|t| &t.kind), Some(TokenKind::Dot));
    let inner = if has_dot {
        &item[..item.len() - 1]
    } else {
        item
    };
    let (_, doc) = expr::expr_doc(inner)?;
    let doc = if has_dot {
        docvec![doc, text(".")]
    } else {
        doc
    };
    Ok((doc, kind, rest))
}

fn attribute_doc(tokens: &[Token]) -> Result<(Document, ItemKind, &[Token]), FormatError> {
    let (item, rest) = scan::until(tokens, &TokenKind::Dot)?;
    let name_tok = &item[1];
    let name: EcoString = match &name_tok.kind {
        TokenKind::Atom(n) => n.clone(),
        TokenKind::If => "if".into(),
        _ => unreachable!("guarded by item_doc"),
    };
    let content = &item[2..item.len() - 1];

    match name.as_str() {
        "spec" | "callback" => {
            let doc = spec_doc(&name, content)?;
            Ok((doc, ItemKind::Spec, rest))
        }
        "type" | "opaque" if has_type_sep(content) => {
            let doc = type_doc(&name, content)?;
            Ok((doc, ItemKind::Type, rest))
        }
        _ => {
            let doc = generic_attribute_doc(&name, content)?;
            Ok((doc, ItemKind::Attribute(attr_key(&name)), rest))
        }
    }
}

fn has_type_sep(content: &[Token]) -> bool {
    let content = strip_outer_parens(content);
    scan::find_top_level(content, &TokenKind::TypeSep).is_some()
}

fn strip_outer_parens(content: &[Token]) -> &[Token] {
    match scan::remove_matching(content, &TokenKind::LeftParen, &TokenKind::RightParen) {
        Some((inner, tail)) if tail.is_empty() => inner,
        _ => content,
    }
}

fn generic_attribute_doc(
    name: &EcoString,
    content: &[Token],
) -> Result<Document, FormatError> {
    let prefix = eco_format!("-{}", print_atom(name));

    if content.is_empty() {
        return Ok(text(eco_format!("{prefix}.")));
    }

    if content[0].kind == TokenKind::LeftParen {
        if let Some((inner, tail)) =
            scan::remove_matching(content, &TokenKind::LeftParen, &TokenKind::RightParen)
        {
            if tail.is_empty() {
                let (_, doc) = expr::items_group(inner, &"(".into(), &").".into())?;
                return Ok(docvec![text(prefix), doc]);
            }
        }
    }

    // Unparenthesised trailing content gets synthesised parentheses so the
    // list-group path handles it uniformly.
    let (_, doc) = expr::items_group(content, &"(".into(), &").".into())?;
    Ok(docvec![text(prefix), doc])
}

/// Builds `-spec`/`-callback`, aligning the clauses of a multi-clause spec
/// beneath the character after the function name.
fn spec_doc(kw: &str, content: &[Token]) -> Result<Document, FormatError> {
    let content = strip_outer_parens(content);

    let mut raw: Vec<(&[Token], &[Token])> = Vec::new();
    let mut toks = content;
    loop {
        let Some(arrow) = scan::find_top_level(toks, &TokenKind::Arrow) else {
            return Err(FormatError::UnexpectedEndOfInput);
        };
        let head = &toks[..arrow];
        let (body, tag, rest) = scan::end_of_expr(&toks[arrow + 1..])?;
        raw.push((head, body));
        toks = rest;
        if tag != Tag::Semicolon {
            break;
        }
    }

    if let [(head, body)] = raw[..] {
        let (fh, head_d) = expr::expr_doc(head)?;
        let (fb, body_d) = expr::expr_doc(body)?;
        let inner = docvec![
            head_d,
            text(" ->"),
            nest(INDENT, docvec![break_(" "), group(body_d), text(".")]),
        ];
        let inner = if fh || fb { force_break(inner) } else { inner };
        return Ok(docvec![text(eco_format!("-{kw} ")), group(inner)]);
    }

    // Multi-clause: `Name` then every clause aligned underneath.
    let first_head = raw[0].0;
    let paren = first_head
        .iter()
        .position(|t| t.kind == TokenKind::LeftParen)
        .unwrap_or(first_head.len());
    let name: String = first_head[..paren].iter().map(|t| t.text().to_string()).collect();

    let count = raw.len();
    let mut clause_docs = Vec::with_capacity(count);
    for (i, (head, body)) in raw.into_iter().enumerate() {
        let head_slice = if i == 0 { &head[paren..] } else { head };
        let (_, head_d) = expr::expr_doc(head_slice)?;
        let (_, body_d) = expr::expr_doc(body)?;
        let suffix = if i == count - 1 { "." } else { ";" };
        clause_docs.push(group(docvec![
            head_d,
            text(" ->"),
            nest(INDENT, docvec![break_(" "), group(body_d), text(suffix)]),
        ]));
    }

    Ok(docvec![
        text(eco_format!("-{kw} ")),
        text(name),
        underneath(0, group_inherit(join(clause_docs, &newline()))),
    ])
}

/// Builds `-type`/`-opaque`, with continuation lines aligned under the
/// `::`.
fn type_doc(kw: &str, content: &[Token]) -> Result<Document, FormatError> {
    let content = strip_outer_parens(content);
    let Some(ts) = scan::find_top_level(content, &TokenKind::TypeSep) else {
        return Err(FormatError::UnexpectedEndOfInput);
    };

    let (fh, head_d) = expr::expr_doc(&content[..ts])?;
    let (fb, body_d) = expr::expr_doc(&content[ts + 1..])?;

    let tail = docvec![break_(" "), group(body_d), text(".")];
    let tail = if fh || fb { force_break(tail) } else { tail };
    Ok(group(docvec![
        text(eco_format!("-{kw} ")),
        head_d,
        text(" ::"),
        underneath(-2, group_inherit(tail)),
    ]))
}
