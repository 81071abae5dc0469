//! Tree-walking evaluator for ALC Lisp programs.
//!
//! Name lookup is dynamic: a word resolves in the innermost call frame that
//! binds it, falling back to the globals, and unbound words evaluate to
//! `null`. Every `print`/`debug` call is forwarded to the [`PrintSink`]
//! synchronously, before evaluation continues.

use std::collections::HashMap;
use std::sync::Arc;

use super::ast::Node;
use super::value::{Closure, Object};
use super::{InterpreterError, PrintSink, Result};

/// Variable bindings of a single frame.
pub type Env = HashMap<String, Object>;

/// Default maximum number of nested user-function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default maximum number of expressions and lists under evaluation at once.
///
/// Parsed trees are shallow, but recursion through user functions stacks
/// their bodies; this keeps the evaluator's native stack bounded.
pub const DEFAULT_MAX_EVAL_NESTING: usize = 320;

/// Context handed to native builtins.
pub struct CallContext<'a> {
    /// Name the builtin was invoked under.
    pub name: &'static str,
    sink: &'a dyn PrintSink,
}

impl<'a> CallContext<'a> {
    pub(crate) fn for_builtin(name: &'static str, sink: &'a dyn PrintSink) -> Self {
        Self { name, sink }
    }

    /// Emit one print event to the host.
    pub fn print(&self, values: &[Object]) {
        self.sink.print(values);
    }
}

/// Evaluator state for a single run.
pub struct Evaluator<'s> {
    frames: Vec<Env>,
    sink: &'s dyn PrintSink,
    max_depth: usize,
    nesting: usize,
    max_nesting: usize,
}

impl<'s> Evaluator<'s> {
    /// Create an evaluator with the given global bindings.
    pub fn new(globals: Env, sink: &'s dyn PrintSink) -> Self {
        Self {
            frames: vec![globals],
            sink,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
            nesting: 0,
            max_nesting: DEFAULT_MAX_EVAL_NESTING,
        }
    }

    /// Override the maximum call depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the maximum evaluation nesting.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Evaluate a program root: each top-level form in order, returning the last value.
    pub fn eval_program(&mut self, root: &Node) -> Result<Object> {
        let forms = match root {
            Node::Expression(forms) => forms.as_slice(),
            node => std::slice::from_ref(node),
        };

        let mut last = Object::Null;
        for form in forms {
            last = self.eval(form).map_err(|err| match (err, form.last_char()) {
                (InterpreterError::Eval(message), Some(at)) => {
                    InterpreterError::Eval(format!("{} (in expression ending at {})", message, at))
                }
                (err, _) => err,
            })?;
        }
        Ok(last)
    }

    fn eval_sequence(&mut self, forms: &[Node]) -> Result<Object> {
        let mut last = Object::Null;
        for form in forms {
            last = self.eval(form)?;
        }
        Ok(last)
    }

    /// Evaluate a single node.
    pub fn eval(&mut self, node: &Node) -> Result<Object> {
        match node {
            Node::Word(token) => Ok(self.lookup(&token.value)),
            Node::BooleanLiteral(token) => Ok(Object::Bool(token.value == "true")),
            Node::StringLiteral(token) => {
                let text = token.value.as_str();
                let inner = text
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .unwrap_or(text);
                Ok(Object::String(inner.to_string()))
            }
            Node::NumberLiteral(token) => token
                .value
                .parse::<i64>()
                .map(Object::Integer)
                .map_err(|_| {
                    eval_error(format!(
                        "invalid number literal '{}' at {}",
                        token.value, token.start
                    ))
                }),
            Node::List(items) => {
                self.enter()?;
                let values = self.eval_all(items);
                self.nesting -= 1;
                Ok(Object::List(values?))
            }
            Node::FunctionLiteral {
                arguments, body, ..
            } => {
                let parameters = arguments
                    .iter()
                    .map(|arg| match arg {
                        Node::Word(token) => Ok(token.value.clone()),
                        other => Err(eval_error(format!(
                            "function argument must be a word, got {}",
                            other.type_of()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Object::Function(Arc::new(Closure {
                    parameters,
                    body: (**body).clone(),
                })))
            }
            Node::Expression(nodes) => {
                self.enter()?;
                let result = self.call_expression(nodes);
                self.nesting -= 1;
                result
            }
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.nesting >= self.max_nesting {
            return Err(InterpreterError::NestingTooDeep(self.max_nesting));
        }
        self.nesting += 1;
        Ok(())
    }

    fn eval_all(&mut self, nodes: &[Node]) -> Result<Vec<Object>> {
        let mut values = Vec::with_capacity(nodes.len());
        for node in nodes {
            values.push(self.eval(node)?);
        }
        Ok(values)
    }

    fn lookup(&self, name: &str) -> Object {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
            .unwrap_or(Object::Null)
    }

    fn define(&mut self, name: String, value: Object) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, value);
        }
    }

    fn call_expression(&mut self, nodes: &[Node]) -> Result<Object> {
        let Some(head) = nodes.first() else {
            return Ok(Object::Null);
        };

        // `(fn [x] body)` is the literal itself, not a zero-argument call.
        if let [Node::FunctionLiteral { .. }] = nodes {
            return self.eval(head);
        }

        if let Node::Word(word) = head {
            match word.value.as_str() {
                "define" | "def" => return self.eval_define(nodes),
                "if" => return self.eval_if(nodes),
                "do" => return self.eval_sequence(&nodes[1..]),
                _ => {}
            }
        }

        let callee = self.eval(head)?;
        let args = self.eval_all(&nodes[1..])?;

        self.apply(&callee, args)
    }

    fn eval_define(&mut self, nodes: &[Node]) -> Result<Object> {
        if nodes.len() != 3 {
            return Err(eval_error(format!(
                "invalid amount of arguments to define, got: {} expected: 3",
                nodes.len()
            )));
        }

        let Node::Word(name) = &nodes[1] else {
            return Err(eval_error(format!(
                "invalid name for define: {} should be a word",
                nodes[1].type_of()
            )));
        };

        let value = self.eval(&nodes[2])?;
        self.define(name.value.clone(), value);
        Ok(Object::Null)
    }

    fn eval_if(&mut self, nodes: &[Node]) -> Result<Object> {
        if nodes.len() != 3 && nodes.len() != 4 {
            return Err(eval_error(format!(
                "invalid amount of arguments to 'if', got: {}",
                nodes.len()
            )));
        }

        if self.eval(&nodes[1])?.is_truthy() {
            self.eval(&nodes[2])
        } else if nodes.len() == 4 {
            self.eval(&nodes[3])
        } else {
            Ok(Object::Null)
        }
    }

    /// Apply a callable value to evaluated arguments.
    pub fn apply(&mut self, callee: &Object, args: Vec<Object>) -> Result<Object> {
        match callee {
            Object::Builtin(builtin) => {
                let mut ctx = CallContext::for_builtin(builtin.name, self.sink);
                (builtin.function)(&mut ctx, args)
            }
            Object::Function(closure) => {
                if args.len() != closure.parameters.len() {
                    return Err(eval_error(format!(
                        "invalid number of arguments passed into function, got {} expected {}",
                        args.len(),
                        closure.parameters.len()
                    )));
                }
                if self.frames.len() > self.max_depth {
                    return Err(InterpreterError::CallDepthExceeded(self.max_depth));
                }

                let frame: Env = closure.parameters.iter().cloned().zip(args).collect();
                self.frames.push(frame);
                let result = self.eval(&closure.body);
                self.frames.pop();
                result
            }
            Object::Null => Ok(Object::Null),
            other => Err(eval_error(format!(
                "cannot call value of type {}",
                other.type_of()
            ))),
        }
    }
}

pub(crate) fn eval_error(message: impl Into<String>) -> InterpreterError {
    InterpreterError::Eval(message.into())
}
