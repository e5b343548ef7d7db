//! Core Tico lexer: converts source text to a token stream.
//!
//! The lexer is driven entirely by the pattern [`REGISTRY`]:
//! - every kind's alternatives are joined into one alternation, and all kinds
//!   into one global alternation anchored at the cursor
//! - the first kind (in registration order) that matches wins, so keywords
//!   shadow identifiers without any lookup table
//! - comments and whitespace are consumed silently unless trivia is kept
//! - text nothing accepts becomes an [`TokenKind::Invalid`] token; the parser
//!   reports it as an unexpected token

use once_cell::sync::Lazy;
use regex::Regex;
use tico_types::{SourceFile, Span};

use crate::token::{Token, TokenKind, REGISTRY};

/// Compiled form of [`REGISTRY`].
struct Patterns {
    /// `\A(?:(?P<k0>...)|(?P<k1>...)|...)`
    global: Regex,
    /// Per kind: its capture-group index in `global` and its own anchored
    /// alternation, used to pull out sub-matches.
    kinds: Vec<(TokenKind, usize, Regex)>,
}

impl Patterns {
    fn compile() -> Self {
        let alternation = |alternatives: &[&str]| alternatives.join("|");

        let global_source = REGISTRY
            .iter()
            .enumerate()
            .map(|(i, (_, alternatives))| format!("(?P<k{i}>{})", alternation(alternatives)))
            .collect::<Vec<_>>()
            .join("|");
        let global = Regex::new(&format!(r"\A(?:{global_source})"))
            .expect("token registry patterns must compile");

        let kinds = REGISTRY
            .iter()
            .enumerate()
            .map(|(i, (kind, alternatives))| {
                let group = global
                    .capture_names()
                    .position(|name| name == Some(format!("k{i}").as_str()))
                    .expect("every kind has a named group");
                let own = Regex::new(&format!(r"\A(?:{})", alternation(alternatives)))
                    .expect("token registry patterns must compile");
                (*kind, group, own)
            })
            .collect();

        Self { global, kinds }
    }
}

static PATTERNS: Lazy<Patterns> = Lazy::new(Patterns::compile);

static WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\w+").expect("word pattern must compile"));

/// Tokenize `source`, dropping comments and whitespace. The result always
/// ends with an [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Vec<Token> {
    let file = SourceFile::new(source);
    Lexer::new(&file).lex()
}

/// The Tico lexer.
pub struct Lexer<'src> {
    file: &'src SourceFile,
    /// Current byte offset into the source.
    pos: usize,
    /// Emit comment and whitespace tokens instead of skipping them.
    keep_trivia: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(file: &'src SourceFile) -> Self {
        Self {
            file,
            pos: 0,
            keep_trivia: false,
        }
    }

    /// Keep comment and whitespace tokens in the output.
    pub fn keep_trivia(mut self, keep: bool) -> Self {
        self.keep_trivia = keep;
        self
    }

    /// Lex the whole source. The last token is always `Eof`.
    pub fn lex(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return tokens;
            }
        }
    }

    /// Produce the next emitted token.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.at_end() {
                return Token::new(TokenKind::Eof, "", self.span(self.pos, self.pos));
            }
            let token = self.scan();
            if !token.kind.is_trivia() || self.keep_trivia {
                return token;
            }
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.file.source.len()
    }

    fn span(&self, start: usize, end: usize) -> Span {
        self.file.span(start, end)
    }

    /// Match one token (trivia included) at the cursor and advance past it.
    fn scan(&mut self) -> Token {
        let rest = &self.file.source[self.pos..];
        let patterns = &*PATTERNS;

        if let Some(found) = patterns.global.captures(rest) {
            for (kind, group, own) in &patterns.kinds {
                let Some(matched) = found.get(*group) else {
                    continue;
                };
                if matched.end() == 0 {
                    break;
                }
                let captures = own
                    .captures(rest)
                    .map(|caps| {
                        caps.iter()
                            .skip(1)
                            .flatten()
                            .map(|m| m.as_str().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                return self.emit(*kind, matched.end()).with_captures(captures);
            }
        }

        // Recovery: a run of word characters, or exactly one character.
        let len = WORD_RUN
            .find(rest)
            .map(|m| m.end())
            .unwrap_or_else(|| rest.chars().next().map_or(1, char::len_utf8));
        self.emit(TokenKind::Invalid, len)
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        let text = &self.file.source[start..self.pos];
        Token::new(kind, text, self.span(start, self.pos))
    }
}
