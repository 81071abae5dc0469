use serde::{Deserialize, Serialize};

/// Line/column pair inside the source text. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPosition {
    /// Source line.
    pub line: usize,
    /// Source column.
    pub col: usize,
}

impl TokenPosition {
    /// Construct a position.
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for TokenPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Category of a lexical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LSquare,
    /// `]`
    RSquare,
    /// `'`
    SingleQuote,
    /// Double-quoted string, quotes included in the token text.
    StringLiteral,
    /// Identifier or operator word.
    Word,
    /// Integer literal.
    NumberLiteral,
    /// `;` comment running to the end of the line.
    Comment,
    /// Anything the lexer could not classify.
    Unknown,
}

impl TokenKind {
    /// Map a delimiter character to its kind.
    pub fn from_delimiter(c: char) -> Option<TokenKind> {
        match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LSquare),
            ']' => Some(TokenKind::RSquare),
            '\'' => Some(TokenKind::SingleQuote),
            _ => None,
        }
    }
}

/// A lexical unit produced by [`tokenize`](super::lexer::tokenize).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Literal text of the token.
    pub value: String,
    /// Token category.
    pub kind: TokenKind,
    /// Position of the first character.
    pub start: TokenPosition,
    /// Position of the last character.
    pub end: TokenPosition,
}

impl Token {
    /// Construct a token.
    pub fn new(
        value: impl Into<String>,
        kind: TokenKind,
        start: TokenPosition,
        end: TokenPosition,
    ) -> Self {
        Self {
            value: value.into(),
            kind,
            start,
            end,
        }
    }
}
