// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the Erlang lexer.
//!
//! These tests use `proptest` to verify lexer invariants over generated
//! inputs:
//!
//! 1. **Lexer never panics** — arbitrary string input either lexes or
//!    returns a structured error
//! 2. **Lines are monotone** — token line numbers never decrease
//! 3. **Lexer is deterministic** — same input always produces same tokens
//! 4. **Valid fragments produce tokens** — known-valid inputs lex cleanly
//! 5. **Canonical spelling is stable** — re-lexing a token's canonical text
//!    reproduces the token
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::lexer::lex;
use super::token::TokenKind;

/// Known-valid fragments that must lex without errors.
const VALID_FRAGMENTS: &[&str] = &[
    "foo(X) -> ok.",
    "-module(test).",
    "-export([start_link/0, init/1]).",
    "case X of a -> 1; b -> 2 end",
    "[H | T]",
    "#{key => value}",
    "#state{count = 0}",
    "<<1:8, Rest/binary>>",
    "fun erlang:display/1",
    "X = Y andalso Z",
    "%% a comment",
    "'quoted atom'",
    "\"a string\\n\"",
    "$a",
    "16#deadBEEF",
    "3.14159",
    "[X || X <- lists:seq(1, 10)]",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_FRAGMENTS).prop_map(std::string::ToString::to_string)
}

proptest! {
    #[test]
    fn lexer_never_panics(input in ".*") {
        // Either Ok or a structured error; never a panic.
        let _ = lex(&input);
    }

    #[test]
    fn lexer_lines_are_monotone(input in ".*") {
        if let Ok(tokens) = lex(&input) {
            let mut last = 0u32;
            for token in &tokens {
                prop_assert!(token.line >= last);
                last = token.line;
            }
        }
    }

    #[test]
    fn lexer_is_deterministic(input in ".*") {
        let first = lex(&input);
        let second = lex(&input);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn valid_fragments_lex_cleanly(fragment in valid_fragment()) {
        let tokens = lex(&fragment);
        prop_assert!(tokens.is_ok(), "failed to lex {fragment:?}: {tokens:?}");
        prop_assert!(!tokens.unwrap().is_empty());
    }

    #[test]
    fn canonical_spelling_is_stable(fragment in valid_fragment()) {
        // Emitting every token's canonical text separated by spaces and
        // re-lexing must reproduce the same kinds.
        let tokens = lex(&fragment).unwrap();
        let rendered: Vec<String> = tokens.iter().map(|t| t.text().to_string()).collect();
        let rejoined = rendered.join(" ");
        let relexed = lex(&rejoined).unwrap();
        let kinds: Vec<&TokenKind> = tokens.iter().map(|t| &t.kind).collect();
        let rekinds: Vec<&TokenKind> = relexed.iter().map(|t| &t.kind).collect();
        prop_assert_eq!(kinds, rekinds);
    }
}
