// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The clause and block builder.
//!
//! **DDD Context:** Formatting — Builder
//!
//! A clause is `head -> body-exprs`, separated from its siblings by `;`
//! and terminated by `.` (functions), or by the enclosing block (`case`,
//! `if`, `receive`, `try`, `fun`, `begin`). A clause whose body is a
//! single expression may stay flat; a multi-expression body force-breaks
//! the clause, and any multi-clause construct force-breaks the whole
//! block.
//!
//! Comments between the head and the body, or between clauses, become
//! additional leading lines; comments remaining after the last clause are
//! appended as their own lines and upgrade the group to force-break.

use ecow::eco_format;

use crate::docvec;
use crate::error::FormatError;
use crate::layout::{
    break_, force_break, group, join, nest, newline, text, Document, INDENT,
};
use crate::source_analysis::{Token, TokenKind};

use super::expr;
use super::scan::{self, OfSplit, Tag};

/// Builds a block expression starting at a block keyword, returning the
/// document, its force-break flag, and the rest of the stream after the
/// block's `end`.
pub(crate) fn block_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Case) => case_doc(tokens),
        Some(TokenKind::If) => if_doc(tokens),
        Some(TokenKind::Receive) => receive_doc(tokens),
        Some(TokenKind::Try) => try_doc(tokens),
        Some(TokenKind::Begin) => begin_doc(tokens),
        Some(TokenKind::Fun) => fun_block_doc(tokens),
        Some(other) => Err(FormatError::UnknownToken {
            token: other.text().to_string(),
            line: tokens[0].line,
        }),
        None => Err(FormatError::UnexpectedEndOfInput),
    }
}

fn case_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let OfSplit::Found { head, rest } = scan::until_of(&tokens[1..])? else {
        return Err(FormatError::UnexpectedEndOfInput);
    };
    let arg = &head[..head.len() - 1];
    let (fa, arg_doc) = expr::expr_doc(arg)?;

    let (body, rest2) = scan::until(rest, &TokenKind::End)?;
    let (fc, clauses, n) = clauses_doc(&body[..body.len() - 1])?;

    let force = fa || fc || n > 1;
    let inner = docvec![
        text("case "),
        arg_doc,
        text(" of"),
        nest(INDENT, docvec![break_(" "), clauses]),
        break_(" "),
        text("end"),
    ];
    Ok((force, group_force(inner, force), rest2))
}

fn if_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let (body, rest) = scan::until(&tokens[1..], &TokenKind::End)?;
    let (fc, clauses, n) = clauses_doc(&body[..body.len() - 1])?;

    let force = fc || n > 1;
    let inner = docvec![
        text("if"),
        nest(INDENT, docvec![break_(" "), clauses]),
        break_(" "),
        text("end"),
    ];
    Ok((force, group_force(inner, force), rest))
}

fn receive_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let (body, rest) = scan::until(&tokens[1..], &TokenKind::End)?;
    let inner = &body[..body.len() - 1];

    let after_idx = scan::find_top_level(inner, &TokenKind::After);
    let (recv, after_part) = match after_idx {
        Some(i) => (&inner[..i], Some(&inner[i + 1..])),
        None => (inner, None),
    };

    let mut force = false;
    let mut pieces: Vec<Document> = vec![text("receive")];
    if !recv.is_empty() {
        let (fc, clauses, n) = clauses_doc(recv)?;
        force |= fc || n > 1;
        pieces.push(nest(INDENT, docvec![break_(" "), clauses]));
    }
    if let Some(part) = after_part {
        let (fa, after_clauses, _) = clauses_doc(part)?;
        force |= fa;
        pieces.push(break_(" "));
        pieces.push(text("after"));
        pieces.push(nest(INDENT, docvec![break_(" "), after_clauses]));
    }
    pieces.push(break_(" "));
    pieces.push(text("end"));

    Ok((force, group_force(Document::Vec(pieces), force), rest))
}

fn try_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let (body, rest) = scan::until(&tokens[1..], &TokenKind::End)?;
    let inner = &body[..body.len() - 1];

    let of_idx = scan::find_top_level(inner, &TokenKind::Of);
    let catch_idx = scan::find_top_level(inner, &TokenKind::Catch);
    let after_idx = scan::find_top_level(inner, &TokenKind::After);

    let len = inner.len();
    let body_end = [of_idx, catch_idx, after_idx]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(len);
    let next_after = |i: usize| {
        [of_idx, catch_idx, after_idx]
            .into_iter()
            .flatten()
            .filter(|&j| j > i)
            .min()
            .unwrap_or(len)
    };

    let mut force = false;
    let (fb, body_join, nbody) = exprs_doc(&inner[..body_end])?;
    force |= fb || nbody > 1;

    let mut pieces: Vec<Document> = vec![
        text("try"),
        nest(INDENT, docvec![break_(" "), body_join]),
    ];
    if let Some(i) = of_idx {
        let (fc, clauses, n) = clauses_doc(&inner[i + 1..next_after(i)])?;
        force |= fc || n > 1;
        pieces.push(break_(" "));
        pieces.push(text("of"));
        pieces.push(nest(INDENT, docvec![break_(" "), clauses]));
    }
    if let Some(i) = catch_idx {
        let (fc, handlers, n) = clauses_doc(&inner[i + 1..next_after(i)])?;
        force |= fc || n > 1;
        pieces.push(break_(" "));
        pieces.push(text("catch"));
        pieces.push(nest(INDENT, docvec![break_(" "), handlers]));
    }
    if let Some(i) = after_idx {
        let (fa, after_join, _) = exprs_doc(&inner[i + 1..])?;
        force |= fa;
        pieces.push(break_(" "));
        pieces.push(text("after"));
        pieces.push(nest(INDENT, docvec![break_(" "), after_join]));
    }
    pieces.push(break_(" "));
    pieces.push(text("end"));

    Ok((force, group_force(Document::Vec(pieces), force), rest))
}

fn begin_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let (body, rest) = scan::until(&tokens[1..], &TokenKind::End)?;
    let (fb, body_join, n) = exprs_doc(&body[..body.len() - 1])?;

    let force = fb || n > 1;
    let inner = docvec![
        text("begin"),
        nest(INDENT, docvec![break_(" "), body_join]),
        break_(" "),
        text("end"),
    ];
    Ok((force, group_force(inner, force), rest))
}

/// The block form of `fun`: `fun Clauses end`, clauses anonymous or named.
pub(crate) fn fun_block_doc(tokens: &[Token]) -> Result<(bool, Document, &[Token]), FormatError> {
    let (body, rest) = scan::until(&tokens[1..], &TokenKind::End)?;
    let (fc, clauses, n) = clauses_doc(&body[..body.len() - 1])?;

    let force = fc || n > 1;
    let inner = docvec![
        text("fun"),
        nest(INDENT, clauses),
        break_(" "),
        text("end"),
    ];
    Ok((force, group_force(inner, force), rest))
}

/// Builds a run of clauses (everything up to the caller's boundary),
/// returning the joined document, its force-break flag, and the clause
/// count. Function clauses carry their own `;`/`.` suffixes.
pub(crate) fn clauses_doc(tokens: &[Token]) -> Result<(bool, Document, usize), FormatError> {
    let mut clause_docs: Vec<Document> = Vec::new();
    let mut count = 0usize;
    let mut force = false;
    let mut toks = tokens;

    loop {
        // Comments between clauses (and trailing after the last one).
        let mut leading: Vec<Document> = Vec::new();
        while let Some(tok) = toks.first() {
            if let TokenKind::Comment(c) = &tok.kind {
                leading.push(text(c.clone()));
                force = true;
                toks = &toks[1..];
            } else {
                break;
            }
        }
        if toks.is_empty() {
            clause_docs.extend(leading);
            break;
        }

        let Some(arrow) = scan::find_top_level(toks, &TokenKind::Arrow) else {
            return Err(FormatError::UnexpectedEndOfInput);
        };
        let (fh, head) = head_doc(&toks[..arrow])?;

        let (fb, body_pieces, end_tag, real, rest) = body_docs(&toks[arrow + 1..])?;
        let clause_force = fh || fb || real > 1;
        force |= clause_force;

        let suffix = match end_tag {
            Tag::Semicolon => ";",
            Tag::Dot => ".",
            _ => "",
        };

        let inner = docvec![
            head,
            text(" ->"),
            nest(
                INDENT,
                docvec![break_(" "), join(body_pieces, &break_(" ")), text(suffix)]
            ),
        ];
        let mut clause = group_force(inner, clause_force);
        if !leading.is_empty() {
            leading.push(clause);
            clause = join(leading, &newline());
        }
        clause_docs.push(clause);
        count += 1;
        toks = rest;
    }

    let doc = join(clause_docs, &break_(" "));
    Ok((force || count > 1, doc, count))
}

/// Builds a clause head: patterns (or guard sequences for `if`), with any
/// `when` guard handled by the expression builder.
fn head_doc(tokens: &[Token]) -> Result<(bool, Document), FormatError> {
    let mut docs: Vec<Document> = Vec::new();
    let mut force = false;
    let mut toks = tokens;

    while !toks.is_empty() {
        let (expr_toks, tag, rest) = scan::end_of_expr(toks)?;
        let (f, doc) = expr::expr_doc(expr_toks)?;
        force |= f;
        let doc = match tag {
            Tag::Comma => docvec![doc, text(",")],
            Tag::Semicolon => docvec![doc, text(";")],
            _ => doc,
        };
        docs.push(doc);
        toks = rest;
    }

    Ok((force, join(docs, &text(" "))))
}

/// Builds a clause body: comma-separated expressions up to a top-level
/// `;`, `.`, or the end of the slice. Each piece carries its own comma;
/// same-line comments attach to the piece that produced them.
fn body_docs(
    tokens: &[Token],
) -> Result<(bool, Vec<Document>, Tag, usize, &[Token]), FormatError> {
    let mut docs: Vec<Document> = Vec::new();
    let mut force = false;
    let mut real = 0usize;
    let mut prev_line = 0u32;
    let mut toks = tokens;

    while !toks.is_empty() {
        let (expr_toks, tag, rest) = scan::end_of_expr(toks)?;

        if let [only] = expr_toks {
            if let TokenKind::Comment(c) = &only.kind {
                force = true;
                if only.line == prev_line && !docs.is_empty() {
                    if let Some(last) = docs.pop() {
                        docs.push(docvec![last, text(eco_format!(" {c}"))]);
                    }
                } else {
                    docs.push(text(c.clone()));
                }
                prev_line = only.line;
                toks = rest;
                continue;
            }
        }

        let (f, doc) = expr::expr_doc(expr_toks)?;
        force |= f;
        real += 1;
        prev_line = expr_toks.last().map_or(prev_line, |t| t.line);
        let doc = if tag == Tag::Comma {
            docvec![doc, text(",")]
        } else {
            doc
        };
        docs.push(doc);
        toks = rest;

        if matches!(tag, Tag::Semicolon | Tag::Dot) {
            return Ok((force, docs, tag, real, toks));
        }
    }

    Ok((force, docs, Tag::None, real, toks))
}

/// A sequence of comma-separated expressions (a `begin`/`try`/`after`
/// body), joined with breakable spaces.
fn exprs_doc(tokens: &[Token]) -> Result<(bool, Document, usize), FormatError> {
    let (force, docs, _, real, rest) = body_docs(tokens)?;
    if let Some(extra) = rest.first() {
        return Err(FormatError::MalformedTokenStream { line: extra.line });
    }
    Ok((force, join(docs, &break_(" ")), real))
}

fn group_force(doc: Document, force: bool) -> Document {
    group(if force { force_break(doc) } else { doc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pretty;
    use crate::source_analysis::lex;

    fn block(source: &str, width: isize) -> String {
        let tokens = lex(source).expect("lexing failed");
        let (_, doc, rest) = block_doc(&tokens).expect("building failed");
        assert!(rest.is_empty(), "block did not consume all tokens");
        pretty(&doc, width)
    }

    #[test]
    fn single_clause_case_stays_flat() {
        assert_eq!(block("case X of ok -> done end", 100), "case X of ok -> done end\n");
    }

    #[test]
    fn multi_clause_case_breaks() {
        assert_eq!(
            block("case X of a -> 1; b -> 2 end", 100),
            "case X of\n    a -> 1;\n    b -> 2\nend\n"
        );
    }

    #[test]
    fn case_clause_with_guard() {
        assert_eq!(
            block("case X of N when N > 0 -> pos; _ -> neg end", 100),
            "case X of\n    N when N > 0 -> pos;\n    _ -> neg\nend\n"
        );
    }

    #[test]
    fn multi_expression_clause_body_breaks() {
        assert_eq!(
            block("case X of a -> f(), g() end", 100),
            "case X of\n    a ->\n        f(),\n        g()\nend\n"
        );
    }

    #[test]
    fn if_block() {
        assert_eq!(
            block("if X > 0 -> pos; true -> neg end", 100),
            "if\n    X > 0 -> pos;\n    true -> neg\nend\n"
        );
    }

    #[test]
    fn receive_with_after() {
        assert_eq!(
            block("receive {msg, M} -> M after 1000 -> timeout end", 20),
            "receive\n    {msg, M} -> M\nafter\n    1000 -> timeout\nend\n"
        );
    }

    #[test]
    fn short_try_catch_stays_flat() {
        assert_eq!(
            block("try f() catch error:badarg -> oops end", 100),
            "try f() catch error:badarg -> oops end\n"
        );
    }

    #[test]
    fn narrow_try_catch_breaks() {
        assert_eq!(
            block("try f() catch error:badarg -> oops end", 30),
            "try\n    f()\ncatch\n    error:badarg -> oops\nend\n"
        );
    }

    #[test]
    fn try_of_catch_after() {
        assert_eq!(
            block("try f() of ok -> 1; other -> 2 catch _:_ -> 3 after cleanup() end", 100),
            "try\n    f()\nof\n    ok -> 1;\n    other -> 2\ncatch\n    _:_ -> 3\nafter\n    cleanup()\nend\n"
        );
    }

    #[test]
    fn begin_block() {
        assert_eq!(block("begin f(), g() end", 100), "begin\n    f(),\n    g()\nend\n");
    }

    #[test]
    fn fun_block_single_clause() {
        assert_eq!(block("fun(X) -> X end", 100), "fun(X) -> X end\n");
    }

    #[test]
    fn fun_block_multi_clause() {
        assert_eq!(
            block("fun(a) -> 1; (b) -> 2 end", 100),
            "fun(a) -> 1;\n    (b) -> 2\nend\n"
        );
    }

    #[test]
    fn trailing_comment_forces_break() {
        let out = block("case X of a -> 1 % why\nend", 100);
        assert!(out.contains("% why"), "comment must survive: {out:?}");
        assert!(out.contains('\n'), "comment must force a break");
    }
}
