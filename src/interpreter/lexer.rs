//! Source text to token stream.
//!
//! The lexer is total: every character ends up in some token (or is
//! whitespace), and anything unrecognised becomes [`TokenKind::Unknown`] so
//! the parser can report it with a position.

use super::token::{Token, TokenKind, TokenPosition};

const SYMBOL_CHARS: &[char] = &['+', '-', '*', '/', '=', '<', '>', '!', '?', '_', '&', '%'];

/// Tokenize ALC Lisp source text.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.run();
    lexer.tokens
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || SYMBOL_CHARS.contains(&c)
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || SYMBOL_CHARS.contains(&c)
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn position(&self) -> TokenPosition {
        TokenPosition::new(self.line, self.col)
    }

    /// Consume one character, returning the position it occupied.
    fn advance(&mut self) -> TokenPosition {
        let at = self.position();
        if let Some(c) = self.current() {
            self.index += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        at
    }

    fn take_while(&mut self, text: &mut String, end: &mut TokenPosition, pred: fn(char) -> bool) {
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            text.push(c);
            *end = self.advance();
        }
    }

    fn push(&mut self, value: String, kind: TokenKind, start: TokenPosition, end: TokenPosition) {
        self.tokens.push(Token::new(value, kind, start, end));
    }

    fn run(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }

            if let Some(kind) = TokenKind::from_delimiter(c) {
                let at = self.advance();
                self.push(c.to_string(), kind, at, at);
                continue;
            }

            match c {
                '"' => self.lex_string(),
                ';' => self.lex_comment(),
                '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.lex_number(),
                c if c.is_ascii_digit() => self.lex_number(),
                c if is_word_start(c) => self.lex_word(),
                c => {
                    let at = self.advance();
                    self.push(c.to_string(), TokenKind::Unknown, at, at);
                }
            }
        }
    }

    fn lex_string(&mut self) {
        let start = self.advance();
        let mut text = String::from('"');
        let mut end = start;

        while let Some(c) = self.current() {
            text.push(c);
            end = self.advance();
            if c == '"' {
                self.push(text, TokenKind::StringLiteral, start, end);
                return;
            }
        }

        // Ran out of input before the closing quote.
        self.push(text, TokenKind::Unknown, start, end);
    }

    fn lex_comment(&mut self) {
        let start = self.position();
        let mut text = String::new();
        let mut end = start;
        self.take_while(&mut text, &mut end, |c| c != '\n');
        self.push(text, TokenKind::Comment, start, end);
    }

    fn lex_number(&mut self) {
        let start = self.position();
        let mut text = String::new();
        let mut end = start;
        if self.current() == Some('-') {
            text.push('-');
            end = self.advance();
        }
        self.take_while(&mut text, &mut end, |c| c.is_alphanumeric());
        self.push(text, TokenKind::NumberLiteral, start, end);
    }

    fn lex_word(&mut self) {
        let start = self.position();
        let mut text = String::new();
        let mut end = start;
        self.take_while(&mut text, &mut end, is_word_continue);
        self.push(text, TokenKind::Word, start, end);
    }
}
