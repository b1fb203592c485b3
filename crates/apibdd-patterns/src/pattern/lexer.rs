//! Pattern lexer converting pattern strings into semantic tokens.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::PatternError;

use super::Placeholder;
use super::placeholder::parse_placeholder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder(Placeholder),
    OpenBrace { index: usize },
    CloseBrace { index: usize },
}

pub(crate) type Cursor<'a> = Peekable<CharIndices<'a>>;

struct Lexer<'a> {
    chars: Cursor<'a>,
    literal: String,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            chars: pattern.char_indices().peekable(),
            literal: String::new(),
            tokens: Vec::new(),
        }
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.tokens
                .push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn push_token(&mut self, token: Token) {
        self.flush_literal();
        self.tokens.push(token);
    }

    fn next_is(&mut self, expected: char) -> bool {
        self.chars.peek().is_some_and(|&(_, ch)| ch == expected)
    }

    fn next_starts_placeholder(&mut self) -> bool {
        self.chars
            .peek()
            .is_some_and(|&(_, ch)| ch.is_ascii_alphabetic() || ch == '_')
    }

    fn run(mut self) -> Result<Vec<Token>, PatternError> {
        while let Some((index, ch)) = self.chars.next() {
            match ch {
                '\\' => {
                    let escaped = self.chars.next().map_or('\\', |(_, next)| next);
                    self.literal.push(escaped);
                }
                '{' if self.next_is('{') => {
                    self.chars.next();
                    self.literal.push('{');
                }
                '{' if self.next_starts_placeholder() => {
                    let placeholder = parse_placeholder(&mut self.chars, index)?;
                    self.push_token(Token::Placeholder(placeholder));
                }
                '{' => self.push_token(Token::OpenBrace { index }),
                '}' if self.next_is('}') => {
                    self.chars.next();
                    self.literal.push('}');
                }
                '}' => self.push_token(Token::CloseBrace { index }),
                other => self.literal.push(other),
            }
        }
        self.flush_literal();
        Ok(self.tokens)
    }
}

pub(crate) fn lex_pattern(pattern: &str) -> Result<Vec<Token>, PatternError> {
    Lexer::new(pattern).run()
}
