use std::fmt;
use std::sync::Arc;

use super::Result;
use super::ast::Node;
use super::eval::CallContext;

/// Native function signature used by builtins.
pub type BuiltinFn = fn(&mut CallContext<'_>, Vec<Object>) -> Result<Object>;

/// Runtime value produced by evaluation and handed to print observers.
///
/// The set of variants is closed: hosts only ever need to render a value,
/// never to interpret it.
#[derive(Clone)]
pub enum Object {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Heterogeneous list.
    List(Vec<Object>),
    /// User-defined function.
    Function(Arc<Closure>),
    /// Native function.
    Builtin(Builtin),
}

/// A user-defined function value.
#[derive(Debug)]
pub struct Closure {
    /// Parameter names in call order.
    pub parameters: Vec<String>,
    /// Body evaluated on call.
    pub body: Node,
}

/// A named native function.
#[derive(Clone, Copy)]
pub struct Builtin {
    /// Name the builtin is bound to.
    pub name: &'static str,
    /// Implementation.
    pub function: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl Object {
    /// Short type name used in diagnostics and JSON rendering.
    pub fn type_of(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Bool(_) => "boolean",
            Object::Integer(_) => "number",
            Object::String(_) => "string",
            Object::List(_) => "list",
            Object::Function(_) => "function",
            Object::Builtin(_) => "builtin",
        }
    }

    /// Truthiness used by `if`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Bool(flag) => *flag,
            Object::Integer(value) => *value != 0,
            Object::String(text) => !text.is_empty(),
            Object::List(items) => !items.is_empty(),
            Object::Null => false,
            Object::Function(_) | Object::Builtin(_) => true,
        }
    }

    /// Convenience accessor for string contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::List(a), Object::List(b)) => a == b,
            (Object::Function(a), Object::Function(b)) => Arc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "Null"),
            Object::Bool(flag) => write!(f, "Bool({})", flag),
            Object::Integer(value) => write!(f, "Integer({})", value),
            Object::String(text) => write!(f, "String({:?})", text),
            Object::List(items) => f.debug_tuple("List").field(items).finish(),
            Object::Function(closure) => {
                write!(f, "Function({})", closure.parameters.join(" "))
            }
            Object::Builtin(builtin) => write!(f, "Builtin({})", builtin.name),
        }
    }
}

/// Host-displayable text form of a value.
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "null"),
            Object::Bool(flag) => write!(f, "{}", flag),
            Object::Integer(value) => write!(f, "{}", value),
            Object::String(text) => write!(f, "{}", text),
            Object::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Object::Function(closure) => write!(f, "FUNCTION [{}]", closure.parameters.join(" ")),
            Object::Builtin(builtin) => write!(f, "BUILTIN {}", builtin.name),
        }
    }
}
