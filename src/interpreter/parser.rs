use super::ast::Node;
use super::token::{Token, TokenKind, TokenPosition};
use super::{InterpreterError, Result};

/// Default maximum nesting of brackets and function literals.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Parse a token stream into a program root.
///
/// The root is always a [`Node::Expression`] holding the top-level forms;
/// comments are skipped. An empty token stream yields an empty root.
pub fn parse(tokens: &[Token]) -> Result<Node> {
    parse_with_depth(tokens, DEFAULT_MAX_NESTING_DEPTH)
}

/// Like [`parse`], rejecting input nested deeper than `max_depth`.
pub fn parse_with_depth(tokens: &[Token], max_depth: usize) -> Result<Node> {
    let mut parser = Parser::new(tokens, max_depth);
    let mut forms = Vec::new();
    while parser.skip_comments() {
        forms.push(parser.parse_expr()?);
    }
    Ok(Node::Expression(forms))
}

struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    /// Open brackets and function literals around the current position.
    depth: usize,
    max_depth: usize,
}

type ParseResult<T> = std::result::Result<T, InterpreterError>;

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], max_depth: usize) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
            max_depth,
        }
    }

    fn descend(&mut self, at: TokenPosition) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(syntax_error(
                at,
                format!("nesting too deep (limit {})", self.max_depth),
            ));
        }
        Ok(())
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Skip comment tokens; returns whether anything is left to parse.
    fn skip_comments(&mut self) -> bool {
        while self
            .current()
            .is_some_and(|token| token.kind == TokenKind::Comment)
        {
            self.index += 1;
        }
        self.current().is_some()
    }

    fn end_position(&self) -> TokenPosition {
        self.tokens
            .last()
            .map(|token| token.end)
            .unwrap_or(TokenPosition::new(1, 1))
    }

    fn parse_expr(&mut self) -> ParseResult<Node> {
        self.skip_comments();
        let Some(token) = self.advance() else {
            return Err(syntax_error(self.end_position(), "unexpected end of input"));
        };

        match token.kind {
            TokenKind::LParen => {
                let items = self.parse_sequence(token, TokenKind::RParen, "expression")?;
                Ok(Node::Expression(items))
            }
            TokenKind::LSquare => {
                let items = self.parse_sequence(token, TokenKind::RSquare, "list")?;
                Ok(Node::List(items))
            }
            TokenKind::RParen | TokenKind::RSquare => Err(syntax_error(
                token.start,
                format!("unexpected '{}'", token.value),
            )),
            TokenKind::StringLiteral => Ok(Node::StringLiteral(token.clone())),
            TokenKind::NumberLiteral => Ok(Node::NumberLiteral(token.clone())),
            TokenKind::Word => match token.value.as_str() {
                "fn" => self.parse_function(token),
                "true" | "false" => Ok(Node::BooleanLiteral(token.clone())),
                _ => Ok(Node::Word(token.clone())),
            },
            TokenKind::SingleQuote => Err(syntax_error(
                token.start,
                "quoting is not supported",
            )),
            TokenKind::Unknown => Err(syntax_error(
                token.start,
                format!("invalid token '{}'", token.value),
            )),
            // skip_comments above guarantees we never land here
            TokenKind::Comment => self.parse_expr(),
        }
    }

    fn parse_sequence(
        &mut self,
        open: &Token,
        close: TokenKind,
        what: &str,
    ) -> ParseResult<Vec<Node>> {
        self.descend(open.start)?;
        let mut items = Vec::new();
        loop {
            if !self.skip_comments() {
                return Err(syntax_error(
                    open.start,
                    format!("unterminated {} opened here", what),
                ));
            }
            if self.current().is_some_and(|token| token.kind == close) {
                self.index += 1;
                self.depth -= 1;
                return Ok(items);
            }
            items.push(self.parse_expr()?);
        }
    }

    fn parse_function(&mut self, fn_word: &Token) -> ParseResult<Node> {
        self.descend(fn_word.start)?;
        if !self.skip_comments() {
            return Err(syntax_error(
                fn_word.start,
                "invalid function declaration: missing arguments",
            ));
        }

        let Node::List(arguments) = self.parse_expr()? else {
            return Err(syntax_error(
                fn_word.start,
                "invalid function declaration: arguments should be a list",
            ));
        };

        if arguments.iter().any(|node| !matches!(node, Node::Word(_))) {
            return Err(syntax_error(
                fn_word.start,
                "invalid function arguments: arguments should only be identifiers",
            ));
        }

        if !self.skip_comments() {
            return Err(syntax_error(
                fn_word.start,
                "invalid function declaration: missing body",
            ));
        }

        let body = self.parse_expr()?;
        self.depth -= 1;

        Ok(Node::FunctionLiteral {
            token: fn_word.clone(),
            arguments,
            body: Box::new(body),
        })
    }
}

fn syntax_error(position: TokenPosition, message: impl Into<String>) -> InterpreterError {
    InterpreterError::Syntax {
        position,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lexer::tokenize;

    fn parse_source(source: &str) -> Result<Node> {
        parse(&tokenize(source))
    }

    #[test]
    fn test_parses_nested_forms() {
        let root = parse_source("(def x [1 2 3]) ; trailing\n(print x)").unwrap();
        let Node::Expression(forms) = &root else {
            panic!("root must be an expression");
        };
        assert_eq!(forms.len(), 2);
        let Node::Expression(def) = &forms[0] else {
            panic!("expected def form");
        };
        assert!(matches!(&def[2], Node::List(items) if items.len() == 3));
    }

    #[test]
    fn test_parses_function_literal() {
        let root = parse_source("(def id (fn [x] x))").unwrap();
        let Node::Expression(forms) = &root else {
            panic!("root must be an expression");
        };
        let Node::Expression(def) = &forms[0] else {
            panic!("expected def form");
        };
        match &def[2] {
            Node::Expression(inner) => match &inner[0] {
                Node::FunctionLiteral {
                    arguments, body, ..
                } => {
                    assert_eq!(arguments.len(), 1);
                    assert!(matches!(body.as_ref(), Node::Word(w) if w.value == "x"));
                }
                other => panic!("expected function literal, got {:?}", other),
            },
            other => panic!("expected wrapper expression, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_expression_reports_opening_position() {
        let err = parse_source("(print ").unwrap_err();
        match err {
            InterpreterError::Syntax { position, message } => {
                assert_eq!(position, TokenPosition::new(1, 1));
                assert!(message.contains("unterminated expression"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_stray_closer_is_an_error() {
        assert!(parse_source("(print 1))").is_err());
        assert!(parse_source("]").is_err());
    }

    #[test]
    fn test_function_arguments_must_be_words() {
        assert!(parse_source("(fn [1] x)").is_err());
        assert!(parse_source("(fn x x)").is_err());
    }

    #[test]
    fn test_nesting_is_bounded() {
        let shallow = format!("{}{}", "[".repeat(8), "]".repeat(8));
        assert!(parse_with_depth(&tokenize(&shallow), 8).is_ok());

        let deep = format!("{}{}", "(".repeat(9), ")".repeat(9));
        match parse_with_depth(&tokenize(&deep), 8).unwrap_err() {
            InterpreterError::Syntax { position, message } => {
                assert_eq!(position, TokenPosition::new(1, 9));
                assert!(message.contains("nesting too deep"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        // siblings do not add up
        let wide = "[[1] [2] [3]] ".repeat(50);
        assert!(parse_with_depth(&tokenize(&wide), 2).is_ok());
    }

    #[test]
    fn test_chained_fn_words_hit_the_nesting_limit() {
        let source = "fn ".repeat(100_000);
        let err = parse(&tokenize(&source)).unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::Syntax { ref message, .. } if message.contains("nesting too deep")
        ));
    }

    #[test]
    fn test_empty_program_is_empty_root() {
        let root = parse_source("; nothing here").unwrap();
        assert!(root.is_empty());
    }
}
