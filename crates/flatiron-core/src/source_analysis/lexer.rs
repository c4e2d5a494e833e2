// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Erlang source code.
//!
//! **DDD Context:** Source Analysis
//!
//! This module converts source text into the flat token stream the layout
//! engine consumes. The lexer is hand-written for maximum control over
//! canonical literal spelling.
//!
//! Unlike a compiler front-end, the formatter keeps comments in the token
//! stream: a [`TokenKind::Comment`] token carries the raw comment text
//! (including its leading `%` run), and every token records the source line
//! it starts on so the builder can keep inline comments adjacent to the
//! expression that produced them.
//!
//! Lexical errors are fatal for the current file. A formatter that guesses
//! its way past a bad literal risks rewriting code, so the lexer returns a
//! structured [`LexError`] instead of recovering.

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::error::{LexError, LexErrorKind};
use super::{Span, Token, TokenKind};

/// Tokenizes Erlang source text.
///
/// # Errors
///
/// Returns a [`LexError`] on unterminated strings or quoted atoms, invalid
/// escape sequences, malformed numbers, and unexpected characters.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek_char() else {
                break;
            };
            let line = self.line;
            let kind = self.lex_token_kind(c)?;
            tokens.push(Token::new(kind, line));
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    fn text_from(&self, start: u32) -> &'src str {
        &self.source[self.span_from(start).as_range()]
    }

    fn error(&self, kind: LexErrorKind, start: u32) -> LexError {
        LexError::new(kind, self.span_from(start), self.line)
    }

    fn skip_whitespace(&mut self) {
        self.advance_while(char::is_whitespace);
    }

    fn lex_token_kind(&mut self, c: char) -> Result<TokenKind, LexError> {
        let start = self.current_position();
        match c {
            'a'..='z' => Ok(self.lex_atom_or_keyword()),
            'A'..='Z' | '_' => Ok(self.lex_variable()),
            '0'..='9' => self.lex_number(),
            '"' => self.lex_string(),
            '\'' => self.lex_quoted_atom(),
            '$' => self.lex_character(),
            '%' => Ok(self.lex_comment()),
            '(' => Ok(self.single(TokenKind::LeftParen)),
            ')' => Ok(self.single(TokenKind::RightParen)),
            '{' => Ok(self.single(TokenKind::LeftBrace)),
            '}' => Ok(self.single(TokenKind::RightBrace)),
            '[' => Ok(self.single(TokenKind::LeftBracket)),
            ']' => Ok(self.single(TokenKind::RightBracket)),
            ',' => Ok(self.single(TokenKind::Comma)),
            ';' => Ok(self.single(TokenKind::Semicolon)),
            '#' => Ok(self.single(TokenKind::Hash)),
            '?' => Ok(self.single(TokenKind::Question)),
            '!' => Ok(self.single(TokenKind::Op("!".into()))),
            '*' => Ok(self.single(TokenKind::Op("*".into()))),
            '=' => Ok(self.lex_equals()),
            '<' => Ok(self.lex_less_than()),
            '>' => Ok(self.lex_greater_than()),
            '/' => Ok(self.lex_slash()),
            ':' => Ok(self.lex_colon()),
            '|' => Ok(self.lex_pipe()),
            '-' => Ok(self.lex_minus()),
            '+' => Ok(self.lex_plus()),
            '.' => Ok(self.lex_dot()),
            _ => {
                self.advance();
                Err(self.error(LexErrorKind::UnexpectedCharacter(c), start))
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn lex_atom_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@');
        let text = self.text_from(start);
        match text {
            "case" => TokenKind::Case,
            "of" => TokenKind::Of,
            "if" => TokenKind::If,
            "receive" => TokenKind::Receive,
            "after" => TokenKind::After,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "end" => TokenKind::End,
            "fun" => TokenKind::Fun,
            "begin" => TokenKind::Begin,
            "when" => TokenKind::When,
            "andalso" => TokenKind::AndAlso,
            "orelse" => TokenKind::OrElse,
            "and" | "or" | "xor" | "band" | "bor" | "bxor" | "bsl" | "bsr" | "div" | "rem"
            | "not" | "bnot" | "cond" | "let" => TokenKind::Op(EcoString::from(text)),
            _ => TokenKind::Atom(EcoString::from(text)),
        }
    }

    fn lex_variable(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@');
        TokenKind::Variable(EcoString::from(self.text_from(start)))
    }

    /// Lexes an integer or float literal, keeping the original spelling.
    ///
    /// Covers decimal integers with `_` separators, `Base#digits` notation,
    /// and floats with optional scientific exponent.
    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.current_position();
        self.advance_while(|c| c.is_ascii_digit() || c == '_');

        // Base notation: 16#FF, 2#1010
        if self.peek_char() == Some('#') && self.peek_char_n(1).is_some_and(char::is_alphanumeric) {
            self.advance(); // #
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return Ok(TokenKind::Integer(EcoString::from(self.text_from(start))));
        }

        // A dot counts as a decimal point only when a digit follows.
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit() || c == '_');
            if matches!(self.peek_char(), Some('e' | 'E')) {
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error(LexErrorKind::InvalidNumber, start));
                }
                self.advance_while(|c| c.is_ascii_digit() || c == '_');
            }
            return Ok(TokenKind::Float(EcoString::from(self.text_from(start))));
        }

        Ok(TokenKind::Integer(EcoString::from(self.text_from(start))))
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        let start = self.current_position();
        self.advance(); // "
        let mut content = EcoString::new();
        loop {
            match self.advance() {
                None => return Err(self.error(LexErrorKind::UnterminatedString, start)),
                Some('"') => break,
                Some('\\') => content.push(self.read_escape(start)?),
                Some(c) => content.push(c),
            }
        }
        Ok(TokenKind::Str(content))
    }

    fn lex_quoted_atom(&mut self) -> Result<TokenKind, LexError> {
        let start = self.current_position();
        self.advance(); // '
        let mut name = EcoString::new();
        loop {
            match self.advance() {
                None => return Err(self.error(LexErrorKind::UnterminatedAtom, start)),
                Some('\'') => break,
                Some('\\') => name.push(self.read_escape(start)?),
                Some(c) => name.push(c),
            }
        }
        Ok(TokenKind::Atom(name))
    }

    /// Lexes a `$`-character literal into its canonical spelling.
    fn lex_character(&mut self) -> Result<TokenKind, LexError> {
        let start = self.current_position();
        self.advance(); // $
        match self.advance() {
            None => Err(self.error(LexErrorKind::InvalidCharacter, start)),
            Some('\\') => {
                let c = self.read_escape(start)?;
                Ok(TokenKind::Char(canonical_char(c)))
            }
            Some(c) => Ok(TokenKind::Char(canonical_char(c))),
        }
    }

    /// Decodes one escape sequence after a consumed backslash.
    fn read_escape(&mut self, start: u32) -> Result<char, LexError> {
        let Some(c) = self.advance() else {
            return Err(self.error(LexErrorKind::InvalidEscape(' '), start));
        };
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'b' => Ok('\x08'),
            'f' => Ok('\x0c'),
            'e' => Ok('\x1b'),
            'v' => Ok('\x0b'),
            's' => Ok(' '),
            'd' => Ok('\x7f'),
            '\\' => Ok('\\'),
            '\'' => Ok('\''),
            '"' => Ok('"'),
            // \x{2603} or \x41
            'x' => {
                let mut value: u32 = 0;
                if self.peek_char() == Some('{') {
                    self.advance();
                    while let Some(d) = self.peek_char() {
                        if d == '}' {
                            self.advance();
                            break;
                        }
                        let digit = d
                            .to_digit(16)
                            .ok_or_else(|| self.error(LexErrorKind::InvalidEscape('x'), start))?;
                        value = value * 16 + digit;
                        self.advance();
                    }
                } else {
                    for _ in 0..2 {
                        let d = self
                            .peek_char()
                            .and_then(|d| d.to_digit(16))
                            .ok_or_else(|| self.error(LexErrorKind::InvalidEscape('x'), start))?;
                        value = value * 16 + d;
                        self.advance();
                    }
                }
                char::from_u32(value)
                    .ok_or_else(|| self.error(LexErrorKind::InvalidEscape('x'), start))
            }
            // \NNN octal, up to three digits
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    let Some(d) = self.peek_char().and_then(|d| d.to_digit(8)) else {
                        break;
                    };
                    value = value * 8 + d;
                    self.advance();
                }
                char::from_u32(value)
                    .ok_or_else(|| self.error(LexErrorKind::InvalidEscape(c), start))
            }
            // \^X control character
            '^' => {
                let Some(ctl) = self.advance() else {
                    return Err(self.error(LexErrorKind::InvalidEscape('^'), start));
                };
                let value = (ctl.to_ascii_uppercase() as u32).wrapping_sub(64) & 0x7f;
                char::from_u32(value)
                    .ok_or_else(|| self.error(LexErrorKind::InvalidEscape('^'), start))
            }
            other => Err(self.error(LexErrorKind::InvalidEscape(other), start)),
        }
    }

    fn lex_comment(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c != '\n');
        TokenKind::Comment(EcoString::from(self.text_from(start).trim_end()))
    }

    fn lex_equals(&mut self) -> TokenKind {
        self.advance(); // =
        match (self.peek_char(), self.peek_char_n(1)) {
            (Some(':'), Some('=')) => {
                self.advance();
                self.advance();
                TokenKind::Op("=:=".into())
            }
            (Some('/'), Some('=')) => {
                self.advance();
                self.advance();
                TokenKind::Op("=/=".into())
            }
            (Some('='), _) => {
                self.advance();
                TokenKind::Op("==".into())
            }
            (Some('<'), _) => {
                self.advance();
                TokenKind::Op("=<".into())
            }
            (Some('>'), _) => {
                self.advance();
                TokenKind::Op("=>".into())
            }
            _ => TokenKind::Equals,
        }
    }

    fn lex_less_than(&mut self) -> TokenKind {
        self.advance(); // <
        match self.peek_char() {
            Some('<') => {
                self.advance();
                TokenKind::BinaryOpen
            }
            Some('-') => {
                self.advance();
                TokenKind::Op("<-".into())
            }
            Some('=') => {
                self.advance();
                TokenKind::Op("<=".into())
            }
            _ => TokenKind::Op("<".into()),
        }
    }

    fn lex_greater_than(&mut self) -> TokenKind {
        self.advance(); // >
        match self.peek_char() {
            Some('>') => {
                self.advance();
                TokenKind::BinaryClose
            }
            Some('=') => {
                self.advance();
                TokenKind::Op(">=".into())
            }
            _ => TokenKind::Op(">".into()),
        }
    }

    fn lex_slash(&mut self) -> TokenKind {
        self.advance(); // /
        if self.peek_char() == Some('=') {
            self.advance();
            TokenKind::Op("/=".into())
        } else {
            TokenKind::Slash
        }
    }

    fn lex_colon(&mut self) -> TokenKind {
        self.advance(); // :
        match self.peek_char() {
            Some(':') => {
                self.advance();
                TokenKind::TypeSep
            }
            Some('=') => {
                self.advance();
                TokenKind::Op(":=".into())
            }
            _ => TokenKind::Colon,
        }
    }

    fn lex_pipe(&mut self) -> TokenKind {
        self.advance(); // |
        if self.peek_char() == Some('|') {
            self.advance();
            TokenKind::DoublePipe
        } else {
            TokenKind::Pipe
        }
    }

    fn lex_minus(&mut self) -> TokenKind {
        self.advance(); // -
        match self.peek_char() {
            Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            Some('-') => {
                self.advance();
                TokenKind::Op("--".into())
            }
            _ => TokenKind::Op("-".into()),
        }
    }

    fn lex_plus(&mut self) -> TokenKind {
        self.advance(); // +
        if self.peek_char() == Some('+') {
            self.advance();
            TokenKind::Op("++".into())
        } else {
            TokenKind::Op("+".into())
        }
    }

    /// A `.` is the form terminator only when followed by whitespace, a
    /// comment, or end of input; otherwise it is the record-access dot
    /// (`X#state.count`). `..` and `...` are range/variadic type syntax.
    fn lex_dot(&mut self) -> TokenKind {
        self.advance(); // .
        if self.peek_char() == Some('.') {
            self.advance();
            if self.peek_char() == Some('.') {
                self.advance();
                TokenKind::Op("...".into())
            } else {
                TokenKind::Op("..".into())
            }
        } else {
            match self.peek_char() {
                None | Some('%') => TokenKind::Dot,
                Some(c) if c.is_whitespace() => TokenKind::Dot,
                _ => TokenKind::Op(".".into()),
            }
        }
    }
}

/// Canonical spelling for a character literal.
fn canonical_char(c: char) -> EcoString {
    match c {
        '\n' => "$\\n".into(),
        '\t' => "$\\t".into(),
        '\r' => "$\\r".into(),
        '\x08' => "$\\b".into(),
        '\x0c' => "$\\f".into(),
        '\x1b' => "$\\e".into(),
        '\x0b' => "$\\v".into(),
        ' ' => "$\\s".into(),
        '\x7f' => "$\\d".into(),
        '\\' => "$\\\\".into(),
        c => {
            let mut out = EcoString::from("$");
            out.push(c);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_simple_function() {
        assert_eq!(
            kinds("foo(X) -> ok."),
            vec![
                TokenKind::Atom("foo".into()),
                TokenKind::LeftParen,
                TokenKind::Variable("X".into()),
                TokenKind::RightParen,
                TokenKind::Arrow,
                TokenKind::Atom("ok".into()),
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn lex_attribute() {
        assert_eq!(
            kinds("-module(test)."),
            vec![
                TokenKind::Op("-".into()),
                TokenKind::Atom("module".into()),
                TokenKind::LeftParen,
                TokenKind::Atom("test".into()),
                TokenKind::RightParen,
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn lex_reserved_words() {
        assert_eq!(
            kinds("case X of _ -> ok end"),
            vec![
                TokenKind::Case,
                TokenKind::Variable("X".into()),
                TokenKind::Of,
                TokenKind::Variable("_".into()),
                TokenKind::Arrow,
                TokenKind::Atom("ok".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lex_multi_char_operators() {
        assert_eq!(
            kinds("=:= =/= == =< >= -> :: || << >> <- ++ -- => :="),
            vec![
                TokenKind::Op("=:=".into()),
                TokenKind::Op("=/=".into()),
                TokenKind::Op("==".into()),
                TokenKind::Op("=<".into()),
                TokenKind::Op(">=".into()),
                TokenKind::Arrow,
                TokenKind::TypeSep,
                TokenKind::DoublePipe,
                TokenKind::BinaryOpen,
                TokenKind::BinaryClose,
                TokenKind::Op("<-".into()),
                TokenKind::Op("++".into()),
                TokenKind::Op("--".into()),
                TokenKind::Op("=>".into()),
                TokenKind::Op(":=".into()),
            ]
        );
    }

    #[test]
    fn lex_numbers_keep_spelling() {
        assert_eq!(
            kinds("42 16#FF 1_000 3.14 2.5e10 1.0e-3"),
            vec![
                TokenKind::Integer("42".into()),
                TokenKind::Integer("16#FF".into()),
                TokenKind::Integer("1_000".into()),
                TokenKind::Float("3.14".into()),
                TokenKind::Float("2.5e10".into()),
                TokenKind::Float("1.0e-3".into()),
            ]
        );
    }

    #[test]
    fn integer_then_dot_terminator() {
        // `1.` followed by whitespace is an integer and a dot, not a float.
        assert_eq!(
            kinds("foo() -> 1."),
            vec![
                TokenKind::Atom("foo".into()),
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Arrow,
                TokenKind::Integer("1".into()),
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn lex_strings_decode_escapes() {
        assert_eq!(
            kinds(r#""hello" "a\nb" "q\"q""#),
            vec![
                TokenKind::Str("hello".into()),
                TokenKind::Str("a\nb".into()),
                TokenKind::Str("q\"q".into()),
            ]
        );
    }

    #[test]
    fn lex_quoted_atoms_decode() {
        assert_eq!(
            kinds("'hello world' 'end'"),
            vec![
                TokenKind::Atom("hello world".into()),
                TokenKind::Atom("end".into()),
            ]
        );
    }

    #[test]
    fn lex_characters_canonicalise() {
        assert_eq!(
            kinds("$a $\\n $  $\\s"),
            vec![
                TokenKind::Char("$a".into()),
                TokenKind::Char("$\\n".into()),
                TokenKind::Char("$\\s".into()),
                TokenKind::Char("$\\s".into()),
            ]
        );
    }

    #[test]
    fn lex_comments_keep_percent_run() {
        assert_eq!(
            kinds("%% module comment\nok % trailing"),
            vec![
                TokenKind::Comment("%% module comment".into()),
                TokenKind::Atom("ok".into()),
                TokenKind::Comment("% trailing".into()),
            ]
        );
    }

    #[test]
    fn lex_tracks_lines() {
        let tokens = lex("foo.\nbar.\n\nbaz.").expect("lexing failed");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 4, 4]);
    }

    #[test]
    fn lex_word_operators() {
        assert_eq!(
            kinds("X div 2 rem 3"),
            vec![
                TokenKind::Variable("X".into()),
                TokenKind::Op("div".into()),
                TokenKind::Integer("2".into()),
                TokenKind::Op("rem".into()),
                TokenKind::Integer("3".into()),
            ]
        );
    }

    #[test]
    fn record_access_dot_is_not_a_terminator() {
        assert_eq!(
            kinds("X#state.count."),
            vec![
                TokenKind::Variable("X".into()),
                TokenKind::Hash,
                TokenKind::Atom("state".into()),
                TokenKind::Op(".".into()),
                TokenKind::Atom("count".into()),
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("\"oops").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = lex("foo ~ bar").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('~'));
    }
}
