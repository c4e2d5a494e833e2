// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Bracket- and keyword-aware token scanning.
//!
//! **DDD Context:** Formatting — Builder
//!
//! Every scan in this module respects nesting: open brackets push their
//! matching close onto a stack, `end`-terminated keywords push themselves,
//! and `end` or a matching close pops. A scan never crosses an unbalanced
//! boundary, and a stack underflow means the token stream is malformed.
//!
//! `fun` is the awkward one: its arity and type forms (`fun foo/1`,
//! `fun M:F/A`, `fun()`, `fun((...) -> ...)`) have no `end`, so the scanner
//! looks ahead before deciding whether a `fun` opens a block.

use crate::error::FormatError;
use crate::source_analysis::{Token, TokenKind};

/// A slice split: the consumed head and the remaining tail.
pub(crate) type Split<'a> = (&'a [Token], &'a [Token]);

/// The terminator that ended an expression scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// The scan ran out of tokens without a terminator.
    None,
}

impl Tag {
    /// The separator text this tag contributes, if any.
    pub(crate) fn text(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::None => "",
        }
    }
}

/// One entry of the implicit nesting stack.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Nesting {
    /// An open bracket awaiting the given closer.
    Bracket(TokenKind),
    /// An `end`-terminated keyword.
    Keyword,
    /// A `try` that has not yet seen its `catch`/`after`.
    Try,
}

/// Tracks bracket/keyword nesting during a scan.
#[derive(Debug, Default)]
struct Stack {
    entries: Vec<Nesting>,
}

impl Stack {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Feeds one token (with its lookahead) to the stack.
    ///
    /// Callers must check their own top-level terminators *before* calling
    /// this, so that e.g. `until(')')` matches a top-level `)` instead of
    /// reporting underflow.
    fn step(&mut self, token: &Token, lookahead: &[Token]) -> Result<(), FormatError> {
        let kind = &token.kind;
        if let Some(closer) = kind.bracket_closer() {
            self.entries.push(Nesting::Bracket(closer));
        } else if *kind == TokenKind::Try {
            self.entries.push(Nesting::Try);
        } else if kind.is_block_keyword() {
            self.entries.push(Nesting::Keyword);
        } else if *kind == TokenKind::Fun && fun_is_block(lookahead) {
            self.entries.push(Nesting::Keyword);
        } else if *kind == TokenKind::End {
            match self.entries.pop() {
                Some(Nesting::Keyword | Nesting::Try) => {}
                _ => return Err(FormatError::MalformedTokenStream { line: token.line }),
            }
        } else if kind.is_close_bracket() {
            match self.entries.pop() {
                Some(Nesting::Bracket(closer)) if closer == *kind => {}
                _ => return Err(FormatError::MalformedTokenStream { line: token.line }),
            }
        } else if matches!(kind, TokenKind::Catch | TokenKind::After)
            && self.entries.last() == Some(&Nesting::Try)
        {
            // The try's handler section begins; only its `end` pops now.
            self.entries.pop();
            self.entries.push(Nesting::Keyword);
        }
        Ok(())
    }
}

/// Returns `true` when a `fun` token followed by `rest` opens a block
/// (`fun ... end`) rather than an arity or type form.
pub(crate) fn fun_is_block(rest: &[Token]) -> bool {
    use TokenKind as T;

    let is_name = |t: &Token| matches!(t.kind, T::Atom(_) | T::Variable(_));
    let closes_type_position = |t: &Token| {
        matches!(
            t.kind,
            T::Comma
                | T::Dot
                | T::Pipe
                | T::RightParen
                | T::RightBrace
                | T::RightBracket
                | T::BinaryClose
        )
    };

    match rest {
        // `fun()` at the end of the stream, or before `,` `.` `|` or a
        // closing bracket: the zero-arity fun type.
        [a, b] if a.kind == T::LeftParen && b.kind == T::RightParen => false,
        [a, b, c, ..]
            if a.kind == T::LeftParen && b.kind == T::RightParen && closes_type_position(c) =>
        {
            false
        }
        // `fun((...) -> ...)`: the bracketed fun type.
        [a, b, ..] if a.kind == T::LeftParen && b.kind == T::LeftParen => false,
        // `fun ?Macro:F/A` and `fun ?Macro/A`
        [q, m, c, f, s, ..]
            if q.kind == T::Question
                && is_name(m)
                && c.kind == T::Colon
                && is_name(f)
                && s.kind == T::Slash =>
        {
            false
        }
        [q, m, s, ..] if q.kind == T::Question && is_name(m) && s.kind == T::Slash => false,
        // `fun M:F/A` (module as atom or variable)
        [m, c, f, s, ..]
            if is_name(m) && c.kind == T::Colon && is_name(f) && s.kind == T::Slash =>
        {
            false
        }
        // `fun f/1` and `fun F/1`
        [a, s, _, ..] if is_name(a) && s.kind == T::Slash => false,
        _ => true,
    }
}

/// Slices tokens up to and including a top-level occurrence of `end_token`.
pub(crate) fn until<'a>(
    tokens: &'a [Token],
    end_token: &TokenKind,
) -> Result<Split<'a>, FormatError> {
    let mut stack = Stack::default();
    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() && token.kind == *end_token {
            return Ok(tokens.split_at(i + 1));
        }
        stack.step(token, &tokens[i + 1..])?;
    }
    Err(FormatError::UnexpectedEndOfInput)
}

/// The result of scanning for a block's `of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OfSplit<'a> {
    /// A top-level `of` was found; `head` includes it.
    Found {
        /// Tokens up to and including the `of`.
        head: &'a [Token],
        /// Tokens after the `of`.
        rest: &'a [Token],
    },
    /// A top-level `catch`, `after`, or `end` appeared first — the
    /// construct has no `of` section.
    Absent,
}

/// Like [`until`] with `of`, but aware that an `of` belonging to a nested
/// `case`/`try` (or sitting inside a handler) is not ours, and that a
/// `try` may have no `of` at all.
pub(crate) fn until_of(tokens: &[Token]) -> Result<OfSplit<'_>, FormatError> {
    let mut stack = Stack::default();
    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() {
            match token.kind {
                TokenKind::Of => {
                    let (head, rest) = tokens.split_at(i + 1);
                    return Ok(OfSplit::Found { head, rest });
                }
                TokenKind::Catch | TokenKind::After | TokenKind::End => {
                    return Ok(OfSplit::Absent);
                }
                _ => {}
            }
        }
        stack.step(token, &tokens[i + 1..])?;
    }
    Err(FormatError::UnexpectedEndOfInput)
}

/// Returns the index of the first top-level occurrence of `target`.
pub(crate) fn find_top_level(tokens: &[Token], target: &TokenKind) -> Option<usize> {
    let mut stack = Stack::default();
    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() && token.kind == *target {
            return Some(i);
        }
        if stack.step(token, &tokens[i + 1..]).is_err() {
            return None;
        }
    }
    None
}

/// Finds the first top-level token from `set`, splitting around it.
pub(crate) fn until_any<'a>(
    tokens: &'a [Token],
    set: &[TokenKind],
) -> Option<(&'a [Token], &'a Token, &'a [Token])> {
    let mut stack = Stack::default();
    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() && set.contains(&token.kind) {
            return Some((&tokens[..i], token, &tokens[i + 1..]));
        }
        if stack.step(token, &tokens[i + 1..]).is_err() {
            return None;
        }
    }
    None
}

/// Drops an outer matched bracket pair without touching inner ones.
///
/// Requires `tokens` to start with `open`; returns the tokens between the
/// pair and the tokens after the matching close.
pub(crate) fn remove_matching<'a>(
    tokens: &'a [Token],
    open: &TokenKind,
    close: &TokenKind,
) -> Option<Split<'a>> {
    let first = tokens.first()?;
    if first.kind != *open {
        return None;
    }
    let (head, rest) = until(&tokens[1..], close).ok()?;
    Some((&head[..head.len() - 1], rest))
}

/// Guard tracking inside [`end_of_expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Outside,
    /// After a top-level `when`: `,`/`;` join guard sequences.
    InGuard,
    /// A `::` appeared inside the guard — this is a typed attribute, which
    /// runs to the next `;` or `.`.
    TypedAttr,
}

/// Slices one expression off the front of `tokens`.
///
/// Terminators are `,`, `;`, and `.` at top level, with the `when`-guard
/// exception described in the module docs. The terminator itself is not
/// part of the returned expression; its [`Tag`] is. A comment leading the
/// stream is returned alone so the caller can decide adjacency against the
/// expression that produced it.
pub(crate) fn end_of_expr(tokens: &[Token]) -> Result<(&[Token], Tag, &[Token]), FormatError> {
    if matches!(tokens.first().map(|t| &t.kind), Some(TokenKind::Comment(_))) {
        return Ok((&tokens[..1], Tag::None, &tokens[1..]));
    }

    let mut stack = Stack::default();
    let mut guard = GuardState::Outside;

    for (i, token) in tokens.iter().enumerate() {
        if stack.is_empty() {
            match &token.kind {
                TokenKind::When => guard = GuardState::InGuard,
                TokenKind::TypeSep if guard == GuardState::InGuard => {
                    guard = GuardState::TypedAttr;
                }
                TokenKind::Arrow if guard == GuardState::InGuard => guard = GuardState::Outside,
                TokenKind::Comma if guard == GuardState::Outside => {
                    return Ok((&tokens[..i], Tag::Comma, &tokens[i + 1..]));
                }
                TokenKind::Semicolon if guard != GuardState::InGuard => {
                    return Ok((&tokens[..i], Tag::Semicolon, &tokens[i + 1..]));
                }
                TokenKind::Dot => {
                    return Ok((&tokens[..i], Tag::Dot, &tokens[i + 1..]));
                }
                _ => {}
            }
        }
        stack.step(token, &tokens[i + 1..])?;
    }

    Ok((tokens, Tag::None, &[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::lex;

    fn tokens(source: &str) -> Vec<Token> {
        lex(source).expect("lexing failed")
    }

    fn texts(slice: &[Token]) -> Vec<String> {
        slice.iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn until_respects_nested_brackets() {
        let toks = tokens("foo(a, {b, c}), rest");
        let (head, rest) = until(&toks, &TokenKind::Comma).unwrap();
        assert_eq!(
            texts(head),
            vec!["foo", "(", "a", ",", "{", "b", ",", "c", "}", ")", ","]
        );
        assert_eq!(texts(rest), vec!["rest"]);
    }

    #[test]
    fn until_respects_keyword_blocks() {
        let toks = tokens("case X of a -> 1 end.");
        let (head, rest) = until(&toks, &TokenKind::Dot).unwrap();
        assert_eq!(head.len(), toks.len());
        assert!(rest.is_empty());
    }

    #[test]
    fn until_dot_skips_dots_inside_blocks() {
        // The record-access dot is not a terminator (it is glued between
        // atoms), but an `end` inside must not confuse the keyword stack.
        let toks = tokens("foo() -> begin ok end. bar.");
        let (head, rest) = until(&toks, &TokenKind::Dot).unwrap();
        assert_eq!(*texts(head).last().unwrap(), ".");
        assert_eq!(texts(rest), vec!["bar", "."]);
    }

    #[test]
    fn until_unbalanced_is_an_error() {
        let toks = tokens("foo(a, b");
        assert!(matches!(
            until(&toks, &TokenKind::Dot),
            Err(FormatError::UnexpectedEndOfInput)
        ));
    }

    #[test]
    fn until_underflow_is_malformed() {
        let toks = tokens("foo) .");
        assert!(matches!(
            until(&toks, &TokenKind::Dot),
            Err(FormatError::MalformedTokenStream { .. })
        ));
    }

    #[test]
    fn fun_arity_forms_are_not_blocks() {
        assert!(!fun_is_block(&tokens("foo/1")));
        assert!(!fun_is_block(&tokens("F/1")));
        assert!(!fun_is_block(&tokens("m:f/1 end")));
        assert!(!fun_is_block(&tokens("M:F/A end")));
        assert!(!fun_is_block(&tokens("?M:f/1 end")));
        assert!(!fun_is_block(&tokens("?M/1 end")));
    }

    #[test]
    fn fun_type_forms_are_not_blocks() {
        assert!(!fun_is_block(&tokens("()")));
        assert!(!fun_is_block(&tokens("(), x")));
        assert!(!fun_is_block(&tokens("())")));
        assert!(!fun_is_block(&tokens("((integer()) -> boolean())")));
    }

    #[test]
    fn fun_block_forms_are_blocks() {
        assert!(fun_is_block(&tokens("(X) -> X end")));
        assert!(fun_is_block(&tokens("() -> ok end")));
        assert!(fun_is_block(&tokens("Name(X) -> X end")));
    }

    #[test]
    fn until_of_finds_case_of() {
        let toks = tokens("X + 1 of a -> 1 end");
        let OfSplit::Found { head, rest } = until_of(&toks).unwrap() else {
            panic!("expected of");
        };
        assert_eq!(texts(head), vec!["X", "+", "1", "of"]);
        assert_eq!(texts(rest), vec!["a", "->", "1", "end"]);
    }

    #[test]
    fn until_of_skips_nested_case() {
        let toks = tokens("case Y of b -> 2 end of a -> 1 end");
        let OfSplit::Found { head, .. } = until_of(&toks).unwrap() else {
            panic!("expected of");
        };
        assert_eq!(head.len(), 8);
    }

    #[test]
    fn until_of_skips_of_inside_nested_try_handler() {
        // The nested try's `catch` must not hide the outer `of`.
        let toks = tokens("try f() catch _ -> g() end of a -> 1 end");
        let OfSplit::Found { head, .. } = until_of(&toks).unwrap() else {
            panic!("expected of");
        };
        assert_eq!(*texts(head).last().unwrap(), "of");
        assert_eq!(head.len(), 12);
    }

    #[test]
    fn until_of_reports_absent_for_try_without_of() {
        let toks = tokens("f() catch _ -> err end");
        assert_eq!(until_of(&toks).unwrap(), OfSplit::Absent);
    }

    #[test]
    fn remove_matching_strips_outer_pair_only() {
        let toks = tokens("(f(a) -> b) .");
        let (inner, tail) =
            remove_matching(&toks, &TokenKind::LeftParen, &TokenKind::RightParen).unwrap();
        assert_eq!(texts(inner), vec!["f", "(", "a", ")", "->", "b"]);
        assert_eq!(texts(tail), vec!["."]);
    }

    #[test]
    fn end_of_expr_splits_at_comma() {
        let toks = tokens("A = 1, B = 2.");
        let (expr, tag, rest) = end_of_expr(&toks).unwrap();
        assert_eq!(texts(expr), vec!["A", "=", "1"]);
        assert_eq!(tag, Tag::Comma);
        assert_eq!(rest.len(), 4);
    }

    #[test]
    fn end_of_expr_keeps_block_commas_inside() {
        let toks = tokens("case X of a -> 1, 2 end, Y.");
        let (expr, tag, _) = end_of_expr(&toks).unwrap();
        assert_eq!(*texts(expr).last().unwrap(), "end");
        assert_eq!(tag, Tag::Comma);
    }

    #[test]
    fn end_of_expr_guard_swallows_separators_until_arrow() {
        // Inside a `when` guard, `,` and `;` join guard sequences.
        let toks = tokens("when X > 1, X < 9; X == 0 -> ok, rest");
        let (expr, tag, rest) = end_of_expr(&toks).unwrap();
        assert_eq!(*texts(expr).last().unwrap(), "ok");
        assert_eq!(tag, Tag::Comma);
        assert_eq!(texts(rest), vec!["rest"]);
    }

    #[test]
    fn end_of_expr_typed_attribute_ends_at_semicolon() {
        let toks = tokens("when X :: atom(), Y :: term(); more");
        let (expr, tag, rest) = end_of_expr(&toks).unwrap();
        assert_eq!(*texts(expr).last().unwrap(), ")");
        assert_eq!(tag, Tag::Semicolon);
        assert_eq!(texts(rest), vec!["more"]);
    }

    #[test]
    fn end_of_expr_returns_leading_comment_alone() {
        let toks = tokens("% note\nok.");
        let (expr, tag, rest) = end_of_expr(&toks).unwrap();
        assert_eq!(texts(expr), vec!["% note"]);
        assert_eq!(tag, Tag::None);
        assert_eq!(texts(rest), vec!["ok", "."]);
    }
}
