// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end formatting tests: whole modules through the full
//! `tokens → document → sdoc → text` pipeline, plus the universal
//! invariants every formatted output must satisfy.

use flatiron_core::{check_equivalence, format_source, FormatOptions};

fn fmt(source: &str) -> String {
    format_source(source, &FormatOptions::default()).expect("formatting failed")
}

fn fmt_width(source: &str, line_length: usize) -> String {
    format_source(source, &FormatOptions { line_length }).expect("formatting failed")
}

/// A corpus of realistic fragments used for invariant checks.
const CORPUS: &[&str] = &[
    "-module(test).",
    "-module(test).\n\n-export([start_link/0, init/1]).",
    "foo(Arg1, Arg2) -> ok.",
    "foo(Arg1, Arg2) -> Arg3 = Arg1 + Arg2, Arg3.",
    "foo(Arg1, Arg1) -> error; foo(Arg1, Arg2) -> ok.",
    "f(X) -> case X of a -> 1; b -> 2 end.",
    "f(X) when is_integer(X), X > 0 -> X; f(_) -> 0.",
    "f() -> receive {msg, M} -> M after 1000 -> timeout end.",
    "f() -> try g() of ok -> 1 catch error:badarg -> 2 after cleanup() end.",
    "f(L) -> [X * 2 || X <- L, X > 0].",
    "f(B) -> <<A:4/little, Rest/binary>> = B, {A, Rest}.",
    "f(S) -> S#state{count = S#state.count + 1}.",
    "-spec foo(integer()) -> boolean().",
    "-spec foo(a) -> b; (c) -> d.",
    "-type t() :: atom() | integer() | {pair, t(), t()}.",
    "-record(state, {count = 0 :: integer(), name}).",
    "-define(MAX, 100).",
    "-ifdef(TEST).\n-define(W, 1).\n-else.\n-define(W, 2).\n-endif.",
    "%% module comment\n-module(m).",
    "f() -> ok. % trailing",
    "f() -> F = fun(X) -> X * 2 end, F(21).",
    "f() -> lists:foldl(fun erlang:'+'/2, 0, [1, 2, 3]).",
    "[{kernel, [{logger_level, info}]}].",
];

#[test]
fn formatting_is_idempotent() {
    for source in CORPUS {
        let once = fmt(source);
        let twice = fmt(&once);
        assert_eq!(once, twice, "not idempotent for {source:?}");
    }
}

#[test]
fn formatting_is_idempotent_at_narrow_widths() {
    for source in CORPUS {
        for width in [1, 10, 20, 40] {
            let once = fmt_width(source, width);
            let twice = fmt_width(&once, width);
            assert_eq!(once, twice, "not idempotent for {source:?} at {width}");
        }
    }
}

#[test]
fn output_ends_with_exactly_one_newline() {
    for source in CORPUS {
        let out = fmt(source);
        assert!(out.ends_with('\n'), "missing newline for {source:?}");
        assert!(!out.ends_with("\n\n"), "extra newline for {source:?}");
    }
}

#[test]
fn no_trailing_spaces_on_any_line() {
    for source in CORPUS {
        for width in [1, 20, 100] {
            let out = fmt_width(source, width);
            for line in out.lines() {
                assert!(
                    !line.ends_with(' ') && !line.ends_with('\t'),
                    "trailing whitespace in {out:?} (source {source:?})"
                );
            }
        }
    }
}

#[test]
fn never_three_consecutive_newlines() {
    for source in CORPUS {
        let out = fmt(source);
        assert!(!out.contains("\n\n\n"), "got {out:?} for {source:?}");
    }
}

#[test]
fn formatting_preserves_semantic_tokens() {
    for source in CORPUS {
        for width in [1, 20, 100] {
            let out = fmt_width(source, width);
            check_equivalence(source, &out)
                .unwrap_or_else(|e| panic!("equivalence broken for {source:?}: {e}"));
        }
    }
}

#[test]
fn indentation_is_a_multiple_of_four_without_alignment() {
    // Sources that use no column-anchored alignment (no multi-clause
    // specs, no `when` continuations) must indent in steps of four.
    let plain = "f(X) -> case X of a -> g(X, X, X); b -> 2 end.";
    let out = fmt_width(plain, 10);
    for line in out.lines() {
        let spaces = line.len() - line.trim_start().len();
        assert_eq!(spaces % 4, 0, "odd indent in {out:?}");
    }
}

#[test]
fn whole_module_formats_stably() {
    let source = r"%% @doc A tiny worker.
-module(worker).

-export([start_link/0, init/1, handle_call/3]).

-record(state, {count = 0 :: non_neg_integer()}).

-spec start_link() -> {ok, pid()} | {error, term()}.
start_link() -> gen_server:start_link({local, ?MODULE}, ?MODULE, [], []).

init([]) -> {ok, #state{}}.

handle_call(get, _From, State) ->
    {reply, State#state.count, State};
handle_call({add, N}, _From, State) when is_integer(N) ->
    New = State#state.count + N,
    {reply, New, State#state{count = New}}.
";
    let out = fmt(source);
    let again = fmt(&out);
    assert_eq!(out, again, "whole module must be idempotent");
    check_equivalence(source, &out).expect("module must stay equivalent");
    assert!(out.contains("-module(worker)."));
    assert!(out.contains("handle_call({add, N}, _From, State) when is_integer(N) ->"));
}

#[test]
fn oversize_atoms_are_emitted_verbatim() {
    let source = "f() -> this_is_a_very_long_atom_that_exceeds_any_reasonable_width.";
    let out = fmt_width(source, 10);
    assert!(
        out.contains("this_is_a_very_long_atom_that_exceeds_any_reasonable_width"),
        "got {out:?}"
    );
}

#[test]
fn comments_force_surrounding_groups_to_break() {
    let source = "f() -> g(a, % first\n  b).";
    let out = fmt(source);
    assert!(out.contains("% first"), "comment lost: {out:?}");
    assert!(
        out.lines().count() > 1,
        "inline comment must break the call: {out:?}"
    );
}
