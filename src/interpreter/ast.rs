use serde::{Deserialize, Serialize};

use super::token::{Token, TokenPosition};

/// Parsed ALC Lisp syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Node {
    /// Identifier or operator reference.
    Word(Token),
    /// Parenthesised form `( ... )`; also the program root.
    Expression(Vec<Node>),
    /// Bracketed list literal `[ ... ]`.
    List(Vec<Node>),
    /// String literal (token text still carries the quotes).
    StringLiteral(Token),
    /// Integer literal.
    NumberLiteral(Token),
    /// `true` / `false`.
    BooleanLiteral(Token),
    /// `fn [args] body`
    FunctionLiteral {
        /// The `fn` keyword token.
        token: Token,
        /// Parameter words.
        arguments: Vec<Node>,
        /// Function body.
        body: Box<Node>,
    },
}

impl Node {
    /// Short type name used in diagnostics.
    pub fn type_of(&self) -> &'static str {
        match self {
            Node::Word(_) => "word",
            Node::Expression(_) => "expression",
            Node::List(_) => "list",
            Node::StringLiteral(_) => "string",
            Node::NumberLiteral(_) => "number",
            Node::BooleanLiteral(_) => "boolean",
            Node::FunctionLiteral { .. } => "function",
        }
    }

    /// Position of the last character covered by this node, if it has any tokens.
    pub fn last_char(&self) -> Option<TokenPosition> {
        match self {
            Node::Word(token)
            | Node::StringLiteral(token)
            | Node::NumberLiteral(token)
            | Node::BooleanLiteral(token) => Some(token.end),
            Node::Expression(nodes) | Node::List(nodes) => {
                nodes.iter().rev().find_map(Node::last_char)
            }
            Node::FunctionLiteral { token, body, .. } => body.last_char().or(Some(token.end)),
        }
    }

    /// Total number of nodes in this tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + match self {
            Node::Expression(nodes) | Node::List(nodes) => {
                nodes.iter().map(Node::node_count).sum()
            }
            Node::FunctionLiteral {
                arguments, body, ..
            } => arguments.iter().map(Node::node_count).sum::<usize>() + body.node_count(),
            _ => 0,
        }
    }

    /// Whether this node has no children and no token of its own.
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Expression(nodes) | Node::List(nodes) if nodes.is_empty())
    }
}
