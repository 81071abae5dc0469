//! Reference ALC Lisp interpreter embedded behind the playground bridge.
//!
//! Source text goes through [`lexer::tokenize`], [`parser::parse`] and
//! [`eval::Evaluator`]. Print side-effects leave the interpreter only through
//! the [`PrintSink`] handed to a run; the interpreter never buffers them.

/// Abstract syntax tree definitions.
pub mod ast;
/// Native functions available to every program.
pub mod builtins;
/// Tree-walking evaluator.
pub mod eval;
/// Source text to tokens.
pub mod lexer;
/// Tokens to syntax tree.
pub mod parser;
/// Token types.
pub mod token;
/// Runtime values.
pub mod value;

pub use ast::Node;
pub use eval::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_EVAL_NESTING, Env, Evaluator};
pub use parser::DEFAULT_MAX_NESTING_DEPTH;
pub use token::{Token, TokenKind, TokenPosition};
pub use value::Object;

use thiserror::Error;

/// Convenience result alias for interpreter operations.
pub type Result<T> = std::result::Result<T, InterpreterError>;

/// Errors surfaced by the parser/evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpreterError {
    /// Parsing failed due to invalid syntax.
    #[error("syntax error at {position}: {message}")]
    Syntax {
        /// Where the problem was detected.
        position: TokenPosition,
        /// What went wrong.
        message: String,
    },

    /// Evaluation failed (type error, bad arity, division by zero, ...).
    #[error("evaluation error: {0}")]
    Eval(String),

    /// User functions nested deeper than the configured limit.
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    /// Evaluation nested deeper than the configured limit.
    #[error("maximum evaluation nesting of {0} exceeded")]
    NestingTooDeep(usize),
}

/// Bounds applied to one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Nested user-function calls allowed during evaluation.
    pub max_call_depth: usize,
    /// Bracket and function-literal nesting accepted by the parser.
    pub max_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Receiver of print events raised while a program runs.
///
/// Called synchronously from inside evaluation, once per `print`/`debug`
/// call, with that call's arguments in order.
pub trait PrintSink {
    /// Deliver one print event.
    fn print(&self, values: &[Object]);
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct Output {
    /// Value of the last top-level form.
    pub result: Object,
    /// Lexed tokens.
    pub tokens: Vec<Token>,
    /// Parsed program root.
    pub ast: Node,
}

/// Lex and parse without evaluating, using the default nesting limit.
pub fn parse_source(source: &str) -> Result<(Vec<Token>, Node)> {
    parse_source_with(source, Limits::default())
}

/// Lex and parse without evaluating.
pub fn parse_source_with(source: &str, limits: Limits) -> Result<(Vec<Token>, Node)> {
    let tokens = lexer::tokenize(source);
    let ast = parser::parse_with_depth(&tokens, limits.max_nesting_depth)?;
    Ok((tokens, ast))
}

/// Lex, parse and evaluate `source` against a fresh global environment.
pub fn parse_and_run(source: &str, sink: &dyn PrintSink, limits: Limits) -> Result<Output> {
    let (tokens, ast) = parse_source_with(source, limits)?;
    let result = Evaluator::new(builtins::standard_globals(), sink)
        .with_max_depth(limits.max_call_depth)
        .eval_program(&ast)?;
    Ok(Output {
        result,
        tokens,
        ast,
    })
}
