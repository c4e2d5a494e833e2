// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The expression builder: token runs to documents.
//!
//! **DDD Context:** Formatting — Builder
//!
//! Given one expression's token slice (already cut by
//! [`scan::end_of_expr`], terminator stripped), this module produces a
//! [`Document`] by recognising shape patterns in priority order: macro
//! references, block keywords, `when` guards, record/map sugar, `fun`
//! variants, calls, bracket groups, equations, boolean chains,
//! comprehensions, literals, and finally generic operators joined with a
//! breakable space.
//!
//! Small neighbouring tokens are fused into single text atoms where the
//! language reads them as one word: `foo/2`, `m:f/1`, `error:Reason`,
//! `X:4/little`, `?MODULE:new`. Fusing keeps the layout engine from ever
//! breaking inside them.
//!
//! Every builder returns a force-break flag alongside its document; a
//! forced break anywhere inside an expression bubbles up so the enclosing
//! group breaks too.

use ecow::{eco_format, EcoString};

use crate::docvec;
use crate::error::FormatError;
use crate::layout::{
    break_, force_break, group, group_inherit, join, nest, text, underneath, Document, INDENT,
};
use crate::source_analysis::{Token, TokenKind};

use super::clause;
use super::scan::{self, Tag};

/// Builds the document for one expression slice (no terminator).
pub(crate) fn expr_doc(tokens: &[Token]) -> Result<(bool, Document), FormatError> {
    let (force, parts) = expr_parts(tokens)?;
    Ok(finish_parts(force, parts))
}

/// Collapses accumulated parts into a single expression document.
///
/// A single part stands on its own; several parts become a group joined by
/// breakable spaces with continuation lines indented one level.
pub(crate) fn finish_parts(force: bool, parts: Vec<Document>) -> (bool, Document) {
    match parts.len() {
        0 => (force, Document::Nil),
        1 => {
            let doc = parts.into_iter().next().unwrap_or(Document::Nil);
            (force, doc)
        }
        _ => {
            let body = nest(INDENT, join(parts, &break_(" ")));
            let body = if force { force_break(body) } else { body };
            (force, group(body))
        }
    }
}

/// Is this token an operator-ish position after which a `-` is a sign and
/// a `#` starts a fresh record expression?
fn is_operator_position(prev: Option<&TokenKind>) -> bool {
    match prev {
        None => true,
        Some(kind) => matches!(
            kind,
            TokenKind::Op(_)
                | TokenKind::Equals
                | TokenKind::Arrow
                | TokenKind::TypeSep
                | TokenKind::Pipe
                | TokenKind::DoublePipe
                | TokenKind::AndAlso
                | TokenKind::OrElse
                | TokenKind::When
                | TokenKind::Catch
        ),
    }
}

/// Walks an expression slice into space-joined parts.
///
/// Boolean chains collapse finished operands into their own groups as they
/// go, so each `andalso`/`orelse`/`|` operand lays out independently.
pub(crate) fn expr_parts(tokens: &[Token]) -> Result<(bool, Vec<Document>), FormatError> {
    use TokenKind as T;

    let mut parts: Vec<Document> = Vec::new();
    let mut chain: Vec<Document> = Vec::new();
    let mut force = false;
    let mut comprehension = false;
    let mut toks = tokens;
    let mut prev: Option<&TokenKind> = None;

    while !toks.is_empty() {
        let cur = toks;
        match toks {
            [] => break,

            // Block keywords delegate to the clause builder.
            [t, ..] if t.kind.is_block_keyword() => {
                let (f, doc, rest) = clause::block_doc(toks)?;
                parts.push(doc);
                force |= f;
                toks = rest;
            }

            // fun: block form, type form, or fused arity reference.
            [t, rest @ ..] if t.kind == T::Fun => {
                if scan::fun_is_block(rest) {
                    let (f, doc, rest2) = clause::fun_block_doc(toks)?;
                    parts.push(doc);
                    force |= f;
                    toks = rest2;
                } else if matches!(rest.first().map(|t| &t.kind), Some(T::LeftParen)) {
                    let (f, doc, rest2) = bracket_doc(rest)?;
                    parts.push(docvec!["fun", doc]);
                    force |= f;
                    toks = rest2;
                } else {
                    let (fused, _, rest2) = fuse_atomic(rest, true)?;
                    parts.push(text(eco_format!("fun {fused}")));
                    toks = rest2;
                }
            }

            // when guard: continuation lines anchor at the guard's column.
            // Guard sequences keep their `,`/`;` separators.
            [w, rest @ ..] if w.kind == T::When => {
                let (f, gdocs) = guard_docs(rest)?;
                parts.push(docvec![
                    text("when "),
                    underneath(0, group_inherit(join(gdocs, &break_(" "))))
                ]);
                force |= f;
                toks = &[];
            }

            // Record/map sugar: #name{...}, #name.key, #{...}, and the
            // suffixed forms X#name{...}, X#{...}, X#name.key.
            [h, rest @ ..] if h.kind == T::Hash => {
                let (f, piece, rest2) = hash_doc(h, rest)?;
                force |= f;
                if is_operator_position(prev) || parts.is_empty() {
                    parts.push(piece);
                } else if let Some(last) = parts.pop() {
                    parts.push(docvec![last, piece]);
                }
                toks = rest2;
            }

            // Equation operators: `=`, `==`, `=:=`, `=/=`.
            [eq, rest @ ..] if eq.kind.is_equation_op() && !parts.is_empty() => {
                let op = eq.kind.text();
                let lhs = equation_lhs(std::mem::take(&mut parts), &op);
                if scan::until_any(rest, &[T::AndAlso, T::OrElse]).is_some() {
                    // A boolean chain on the right renders piecewise so each
                    // boolean term groups individually rather than lumping
                    // under the operator.
                    let (f, rparts) = expr_parts(rest)?;
                    let mut all = vec![lhs];
                    all.extend(rparts);
                    let body = nest(INDENT, join(all, &break_(" ")));
                    let body = if f { force_break(body) } else { body };
                    parts.push(group(body));
                    force |= f;
                } else {
                    let (f, rparts) = expr_parts(rest)?;
                    let (f, rhs) = finish_parts(f, rparts);
                    let inner = group_inherit(docvec![lhs, break_(" "), group(rhs)]);
                    let inner = if f { force_break(inner) } else { inner };
                    parts.push(group(nest(INDENT, inner)));
                    force |= f;
                }
                toks = &[];
            }

            // Boolean concatenators and alternatives: each operand becomes
            // its own group.
            [op, rest @ ..]
                if matches!(op.kind, T::AndAlso | T::OrElse | T::Pipe) && !parts.is_empty() =>
            {
                let (_, operand) = finish_parts(false, std::mem::take(&mut parts));
                chain.push(docvec![operand, text(eco_format!(" {}", op.kind.text()))]);
                toks = rest;
            }

            // List comprehension: `||` prefixes the generator/filter run.
            [dp, rest @ ..] if dp.kind == T::DoublePipe => {
                let (f, rparts) = expr_parts(rest)?;
                let (f, body) = finish_parts(f, rparts);
                parts.push(docvec![text("|| "), group(body)]);
                force |= f;
                comprehension = true;
                toks = &[];
            }

            // Bracketed subexpressions, lists, tuples, maps, binaries.
            [t, ..] if t.kind.bracket_closer().is_some() => {
                let (f, doc, rest) = bracket_doc(toks)?;
                parts.push(doc);
                force |= f;
                toks = rest;
            }

            // Unary catch expression.
            [c, rest @ ..] if c.kind == T::Catch => {
                parts.push(text("catch"));
                toks = rest;
            }

            // Inline comments force the group to break and stay adjacent.
            [c, rest @ ..] if matches!(c.kind, T::Comment(_)) => {
                force = true;
                let comment = text(c.text());
                if let Some(last) = parts.pop() {
                    parts.push(docvec![last, text(" "), comment]);
                } else {
                    parts.push(comment);
                }
                toks = rest;
            }

            // Arrows and `::` appear inside fun types and typed exprs; they
            // attach to the preceding part like binary operators.
            [t, rest @ ..] if matches!(t.kind, T::Arrow | T::TypeSep) => {
                attach_op(&mut parts, &t.kind.text());
                toks = rest;
            }

            // Macro references and atomics, with fusing and call detection.
            [t, ..] if t.kind == T::Question || t.kind.is_atomic() => {
                let (fused, callable, rest) = fuse_atomic(toks, false)?;
                if callable && matches!(rest.first().map(|t| &t.kind), Some(T::LeftParen)) {
                    let (f, args, rest2) = bracket_doc(rest)?;
                    parts.push(docvec![text(fused), args]);
                    force |= f;
                    toks = rest2;
                } else {
                    parts.push(text(fused));
                    toks = rest;
                }
            }

            // Generic operators join with a breakable space; a leading `-`
            // or `+` in operator position is a sign and fuses with its
            // operand.
            [o, rest @ ..] if matches!(o.kind, T::Op(_)) => {
                let op = o.kind.text();
                if is_operator_position(prev) {
                    if matches!(op.as_str(), "-" | "+")
                        && rest.first().is_some_and(|t| t.kind.is_atomic())
                    {
                        let (fused, _, rest2) = fuse_atomic(rest, false)?;
                        parts.push(text(eco_format!("{op}{fused}")));
                        toks = rest2;
                    } else {
                        parts.push(text(op));
                        toks = rest;
                    }
                } else {
                    attach_op(&mut parts, &op);
                    toks = rest;
                }
            }

            [t, ..] => {
                return Err(FormatError::UnknownToken {
                    token: t.text().to_string(),
                    line: t.line,
                });
            }
        }

        let used = cur.len() - toks.len();
        if used > 0 {
            prev = Some(&cur[used - 1].kind);
        }
    }

    if !chain.is_empty() {
        let (_, operand) = finish_parts(false, parts);
        chain.push(operand);
        parts = chain;
    }

    if comprehension {
        let (force, doc) = finish_parts(force, parts);
        return Ok((force, vec![group(doc)]));
    }

    Ok((force, parts))
}

/// Builds the expressions of a guard sequence, keeping each one's `,` or
/// `;` separator attached.
fn guard_docs(tokens: &[Token]) -> Result<(bool, Vec<Document>), FormatError> {
    let mut docs: Vec<Document> = Vec::new();
    let mut force = false;
    let mut toks = tokens;

    while !toks.is_empty() {
        let (expr_toks, tag, rest) = scan::end_of_expr(toks)?;
        let (f, doc) = expr_doc(expr_toks)?;
        force |= f;
        let doc = match tag {
            Tag::Comma => docvec![doc, text(",")],
            Tag::Semicolon => docvec![doc, text(";")],
            _ => doc,
        };
        docs.push(doc);
        toks = rest;
    }

    Ok((force, docs))
}

/// Renders `LHS =` as its own group with the operator attached to the last
/// part.
fn equation_lhs(mut parts: Vec<Document>, op: &EcoString) -> Document {
    if let Some(last) = parts.pop() {
        parts.push(docvec![last, text(eco_format!(" {op}"))]);
    } else {
        parts.push(text(op.clone()));
    }
    group(join(parts, &break_(" ")))
}

/// Attaches an operator to the last accumulated part with a plain space.
fn attach_op(parts: &mut Vec<Document>, op: &EcoString) {
    if let Some(last) = parts.pop() {
        parts.push(docvec![last, text(eco_format!(" {op}"))]);
    } else {
        parts.push(text(op.clone()));
    }
}

/// Builds the `#`-led record/map piece after the previous part (if any).
fn hash_doc<'a>(
    hash: &Token,
    rest: &'a [Token],
) -> Result<(bool, Document, &'a [Token]), FormatError> {
    use TokenKind as T;
    match rest {
        // #name{...}
        [n, b, ..] if matches!(n.kind, T::Atom(_)) && b.kind == T::LeftBrace => {
            let (f, fields, rest2) = bracket_doc(&rest[1..])?;
            Ok((f, docvec![text(eco_format!("#{}", n.text())), fields], rest2))
        }
        // #name.key
        [n, d, k, rest2 @ ..]
            if matches!(n.kind, T::Atom(_))
                && matches!(&d.kind, T::Op(op) if op == ".")
                && matches!(k.kind, T::Atom(_)) =>
        {
            Ok((
                false,
                text(eco_format!("#{}.{}", n.text(), k.text())),
                rest2,
            ))
        }
        // #{...}
        [b, ..] if b.kind == T::LeftBrace => {
            let (f, fields, rest2) = bracket_doc(rest)?;
            Ok((f, docvec![text("#"), fields], rest2))
        }
        _ => Err(FormatError::UnknownToken {
            token: hash.text().to_string(),
            line: hash.line,
        }),
    }
}

/// Fuses a leading atomic reference into one text atom.
///
/// Handles optional `?` macro prefixes, `:`-chains (`m:f`, `error:R:S`),
/// arity suffixes (`foo/2`), and binary type specifiers (`X/binary`,
/// `X:4/little-unit:8`). Returns the fused text, whether a call may follow
/// (the reference started with an atom, variable, or macro), and the rest.
///
/// `in_fun_ref` loosens the arity rule for `fun` references, where the
/// arity may be a variable (`fun F/Arity`).
fn fuse_atomic(
    tokens: &[Token],
    in_fun_ref: bool,
) -> Result<(EcoString, bool, &[Token]), FormatError> {
    use TokenKind as T;

    let mut out = EcoString::new();
    let mut toks = tokens;
    let callable;
    let mut last_was_atom;

    match toks {
        [q, n, rest @ ..]
            if q.kind == T::Question && matches!(n.kind, T::Atom(_) | T::Variable(_)) =>
        {
            out.push('?');
            out.push_str(&n.text());
            callable = true;
            last_was_atom = matches!(n.kind, T::Atom(_));
            toks = rest;
        }
        [t, rest @ ..] if t.kind.is_atomic() => {
            out.push_str(&t.text());
            callable = matches!(t.kind, T::Atom(_) | T::Variable(_));
            last_was_atom = matches!(t.kind, T::Atom(_));
            toks = rest;
        }
        [t, ..] => {
            return Err(FormatError::UnknownToken {
                token: t.text().to_string(),
                line: t.line,
            });
        }
        [] => return Err(FormatError::UnexpectedEndOfInput),
    }

    // `:`-chains: qualified names, catch patterns, binary segment sizes.
    loop {
        match toks {
            [c, q, n, rest @ ..]
                if c.kind == T::Colon
                    && q.kind == T::Question
                    && matches!(n.kind, T::Atom(_) | T::Variable(_)) =>
            {
                out.push_str(":?");
                out.push_str(&n.text());
                last_was_atom = matches!(n.kind, T::Atom(_));
                toks = rest;
            }
            [c, n, rest @ ..] if c.kind == T::Colon && n.kind.is_atomic() => {
                out.push(':');
                out.push_str(&n.text());
                last_was_atom = matches!(n.kind, T::Atom(_));
                toks = rest;
            }
            _ => break,
        }
    }

    // Arity (`foo/2`) and binary type specifiers (`X/binary-unit:8`). A
    // slash before anything else is division and stays unfused.
    let arity_fuse = |n: &Token| {
        matches!(n.kind, T::Atom(_))
            || (last_was_atom && matches!(n.kind, T::Integer(_)))
            || (in_fun_ref && matches!(n.kind, T::Integer(_) | T::Variable(_)))
    };
    if let [s, n, rest @ ..] = toks {
        if s.kind == T::Slash && arity_fuse(n) {
            out.push('/');
            out.push_str(&n.text());
            toks = rest;
            loop {
                match toks {
                    [m, a, rest2 @ ..]
                        if matches!(&m.kind, T::Op(op) if op == "-")
                            && matches!(a.kind, T::Atom(_)) =>
                    {
                        out.push('-');
                        out.push_str(&a.text());
                        toks = rest2;
                    }
                    [c, i, rest2 @ ..]
                        if c.kind == T::Colon && matches!(i.kind, T::Integer(_)) =>
                    {
                        out.push(':');
                        out.push_str(&i.text());
                        toks = rest2;
                    }
                    _ => break,
                }
            }
        }
    }

    Ok((out, callable, toks))
}

/// One element of a bracket group, with its separator and any trailing
/// comment kept alongside so `a, % note` renders in source order.
struct BracketItem {
    doc: Document,
    tag: Tag,
    trailing_comment: Option<EcoString>,
}

/// Builds a bracket group from tokens starting at an open bracket.
///
/// Returns the group, its force-break flag, and the rest of the stream
/// after the matching close.
pub(crate) fn bracket_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    bracket_doc_suffix(tokens, "")
}

/// [`bracket_doc`] with a suffix rendered inside the group after the close
/// bracket, so the fit decision accounts for it (attributes append `.`).
pub(crate) fn bracket_doc_suffix<'a>(
    tokens: &'a [Token],
    suffix: &str,
) -> Result<(bool, Document, &'a [Token]), FormatError> {
    let Some(open) = tokens.first() else {
        return Err(FormatError::UnexpectedEndOfInput);
    };
    let Some(closer) = open.kind.bracket_closer() else {
        return Err(FormatError::UnknownToken {
            token: open.text().to_string(),
            line: open.line,
        });
    };

    let (head, rest) = scan::until(&tokens[1..], &closer)?;
    let inner = &head[..head.len() - 1];

    let open_text = open.kind.text();
    let close_text = eco_format!("{}{suffix}", closer.text());
    let (force, doc) = items_group(inner, &open_text, &close_text)?;
    Ok((force, doc, rest))
}

/// Builds a bracket group from an already-cut inner slice and explicit
/// open/close texts (the top-level builder synthesises parentheses around
/// bare attribute content this way).
pub(crate) fn items_group(
    inner: &[Token],
    open_text: &EcoString,
    close_text: &EcoString,
) -> Result<(bool, Document), FormatError> {
    if inner.is_empty() {
        return Ok((false, text(eco_format!("{open_text}{close_text}"))));
    }

    let (force, items) = bracket_items(inner)?;

    let mut pieces: Vec<Document> = Vec::new();
    let last = items.len() - 1;
    for (i, item) in items.into_iter().enumerate() {
        pieces.push(item.doc);
        if item.tag != Tag::None {
            pieces.push(text(item.tag.text()));
        }
        if let Some(comment) = item.trailing_comment {
            pieces.push(text(eco_format!(" {comment}")));
        }
        if i < last {
            pieces.push(break_(" "));
        }
    }

    let body = docvec![
        text(open_text.clone()),
        nest(INDENT, docvec![break_(""), Document::Vec(pieces)]),
        break_(""),
        text(close_text.clone()),
    ];
    let body = if force { force_break(body) } else { body };
    Ok((force, group(body)))
}

/// Splits bracket content into items, attaching same-line comments to the
/// item that produced them.
fn bracket_items(inner: &[Token]) -> Result<(bool, Vec<BracketItem>), FormatError> {
    let mut items: Vec<BracketItem> = Vec::new();
    let mut force = false;
    let mut toks = inner;
    let mut prev_line = 0u32;

    while !toks.is_empty() {
        let (expr_toks, tag, rest) = scan::end_of_expr(toks)?;
        if let [only] = expr_toks {
            if let TokenKind::Comment(comment) = &only.kind {
                force = true;
                if only.line == prev_line && !items.is_empty() {
                    if let Some(last) = items.last_mut() {
                        last.trailing_comment = Some(comment.clone());
                    }
                } else {
                    items.push(BracketItem {
                        doc: text(comment.clone()),
                        tag: Tag::None,
                        trailing_comment: None,
                    });
                }
                prev_line = only.line;
                toks = rest;
                continue;
            }
        }

        let (f, doc) = expr_doc(expr_toks)?;
        force |= f;
        prev_line = expr_toks.last().map_or(0, |t| t.line);
        items.push(BracketItem {
            doc,
            tag,
            trailing_comment: None,
        });
        toks = rest;
    }

    Ok((force, items))
}
