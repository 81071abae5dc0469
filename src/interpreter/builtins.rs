//! Native functions bound in every fresh global environment.

use super::eval::{CallContext, Env, eval_error};
use super::value::{Builtin, BuiltinFn, Object};
use super::{InterpreterError, Result};

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("+", add),
    ("-", subtract),
    ("*", multiply),
    ("/", divide),
    ("==", equals),
    ("!=", not_equals),
    ("<", lesser_than),
    (">", greater_than),
    ("str", concat),
    ("len", len),
    ("list", list),
    ("head", head),
    ("tail", tail),
    ("nth", nth),
    ("print", print),
    ("debug", debug),
];

/// Global environment with every builtin bound.
pub fn standard_globals() -> Env {
    BUILTINS
        .iter()
        .map(|(name, function)| {
            (
                name.to_string(),
                Object::Builtin(Builtin {
                    name: *name,
                    function: *function,
                }),
            )
        })
        .collect()
}

/// Names of all builtins, in registration order.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

fn args_len_error(name: &str, got: usize, expected: usize) -> InterpreterError {
    eval_error(format!(
        "invalid number of arguments for function '{}': got: {} expected: {}",
        name, got, expected
    ))
}

fn type_error(name: &str, expected: &str, got: &Object) -> InterpreterError {
    eval_error(format!(
        "invalid argument type for function '{}': expected {}, got {}",
        name,
        expected,
        got.type_of()
    ))
}

fn integers(name: &str, args: &[Object]) -> Result<Vec<i64>> {
    args.iter()
        .map(|arg| match arg {
            Object::Integer(value) => Ok(*value),
            other => Err(type_error(name, "number", other)),
        })
        .collect()
}

fn overflow(name: &str) -> InterpreterError {
    eval_error(format!("integer overflow in '{}'", name))
}

fn add(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let mut total: i64 = 0;
    for value in integers(ctx.name, &args)? {
        total = total.checked_add(value).ok_or_else(|| overflow(ctx.name))?;
    }
    Ok(Object::Integer(total))
}

fn subtract(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let values = integers(ctx.name, &args)?;
    let Some((first, rest)) = values.split_first() else {
        return Err(args_len_error(ctx.name, 0, 1));
    };
    if rest.is_empty() {
        return first
            .checked_neg()
            .map(Object::Integer)
            .ok_or_else(|| overflow(ctx.name));
    }
    let mut total = *first;
    for value in rest {
        total = total.checked_sub(*value).ok_or_else(|| overflow(ctx.name))?;
    }
    Ok(Object::Integer(total))
}

fn multiply(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let mut total: i64 = 1;
    for value in integers(ctx.name, &args)? {
        total = total.checked_mul(value).ok_or_else(|| overflow(ctx.name))?;
    }
    Ok(Object::Integer(total))
}

fn divide(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let values = integers(ctx.name, &args)?;
    let Some((first, rest)) = values.split_first() else {
        return Err(args_len_error(ctx.name, 0, 2));
    };
    let mut total = *first;
    for value in rest {
        if *value == 0 {
            return Err(eval_error("division by zero"));
        }
        total = total.checked_div(*value).ok_or_else(|| overflow(ctx.name))?;
    }
    Ok(Object::Integer(total))
}

/// Check `holds` on every adjacent pair of arguments.
fn chain(
    name: &str,
    args: &[Object],
    holds: impl Fn(&Object, &Object) -> bool,
) -> Result<Object> {
    if args.is_empty() {
        return Err(args_len_error(name, 0, 2));
    }
    Ok(Object::Bool(
        args.windows(2).all(|pair| holds(&pair[0], &pair[1])),
    ))
}

fn equals(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    chain(ctx.name, &args, |a, b| a == b)
}

fn not_equals(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let Object::Bool(all_equal) = chain(ctx.name, &args, |a, b| a == b)? else {
        return Ok(Object::Bool(false));
    };
    Ok(Object::Bool(args.len() > 1 && !all_equal))
}

fn lesser_than(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    chain(ctx.name, &args, |a, b| {
        matches!((a, b), (Object::Integer(l), Object::Integer(r)) if l < r)
    })
}

fn greater_than(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    chain(ctx.name, &args, |a, b| {
        matches!((a, b), (Object::Integer(l), Object::Integer(r)) if l > r)
    })
}

/// Concatenate the text form of every argument.
fn concat(_ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    Ok(Object::String(
        args.iter().map(|arg| arg.to_string()).collect(),
    ))
}

fn len(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let [value] = args.as_slice() else {
        return Err(args_len_error(ctx.name, args.len(), 1));
    };
    match value {
        Object::String(text) => Ok(Object::Integer(text.chars().count() as i64)),
        Object::List(items) => Ok(Object::Integer(items.len() as i64)),
        other => Err(type_error(ctx.name, "string or list", other)),
    }
}

fn list(_ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    Ok(Object::List(args))
}

fn single_list<'a>(name: &str, args: &'a [Object]) -> Result<&'a [Object]> {
    let [value] = args else {
        return Err(args_len_error(name, args.len(), 1));
    };
    match value {
        Object::List(items) => Ok(items.as_slice()),
        other => Err(type_error(name, "list", other)),
    }
}

fn head(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let items = single_list(ctx.name, &args)?;
    Ok(items.first().cloned().unwrap_or(Object::Null))
}

fn tail(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let items = single_list(ctx.name, &args)?;
    Ok(Object::List(items.iter().skip(1).cloned().collect()))
}

fn nth(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let [index, items] = args.as_slice() else {
        return Err(args_len_error(ctx.name, args.len(), 2));
    };
    let Object::Integer(index) = index else {
        return Err(type_error(ctx.name, "number", index));
    };
    let Object::List(items) = items else {
        return Err(type_error(ctx.name, "list", items));
    };
    Ok(usize::try_from(*index)
        .ok()
        .and_then(|idx| items.get(idx))
        .cloned()
        .unwrap_or(Object::Null))
}

/// Emit the arguments as one print event.
fn print(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    ctx.print(&args);
    Ok(Object::Null)
}

/// Emit the debug rendering of the arguments as one print event.
fn debug(ctx: &mut CallContext<'_>, args: Vec<Object>) -> Result<Object> {
    let rendered: Vec<Object> = args
        .iter()
        .map(|arg| Object::String(format!("{:?}", arg)))
        .collect();
    ctx.print(&rendered);
    Ok(Object::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::PrintSink;

    struct Discard;

    impl PrintSink for Discard {
        fn print(&self, _values: &[Object]) {}
    }

    fn call(name: &'static str, args: Vec<Object>) -> Result<Object> {
        let globals = standard_globals();
        let Some(Object::Builtin(builtin)) = globals.get(name) else {
            panic!("builtin {} missing", name);
        };
        let sink = Discard;
        let mut ctx = CallContext::for_builtin(name, &sink);
        (builtin.function)(&mut ctx, args)
    }

    fn ints(values: &[i64]) -> Vec<Object> {
        values.iter().copied().map(Object::Integer).collect()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(call("+", ints(&[1, 2, 3])).unwrap(), Object::Integer(6));
        assert_eq!(call("+", vec![]).unwrap(), Object::Integer(0));
        assert_eq!(call("-", ints(&[5])).unwrap(), Object::Integer(-5));
        assert_eq!(call("-", ints(&[10, 3, 2])).unwrap(), Object::Integer(5));
        assert_eq!(call("*", ints(&[2, 3, 4])).unwrap(), Object::Integer(24));
        assert_eq!(call("/", ints(&[20, 2, 5])).unwrap(), Object::Integer(2));
    }

    #[test]
    fn test_arithmetic_errors() {
        assert!(call("/", ints(&[1, 0])).is_err());
        assert!(call("+", vec![Object::String("x".into())]).is_err());
        assert!(call("*", ints(&[i64::MAX, 2])).is_err());
        assert!(call("-", vec![]).is_err());
    }

    #[test]
    fn test_comparisons_chain() {
        assert_eq!(call("<", ints(&[1, 2, 3])).unwrap(), Object::Bool(true));
        assert_eq!(call("<", ints(&[1, 3, 2])).unwrap(), Object::Bool(false));
        assert_eq!(call(">", ints(&[3, 2])).unwrap(), Object::Bool(true));
        assert_eq!(call("==", ints(&[4, 4, 4])).unwrap(), Object::Bool(true));
        assert_eq!(call("!=", ints(&[4, 5])).unwrap(), Object::Bool(true));
        assert_eq!(call("!=", ints(&[4])).unwrap(), Object::Bool(false));
    }

    #[test]
    fn test_list_functions() {
        let items = Object::List(ints(&[7, 8, 9]));
        assert_eq!(call("head", vec![items.clone()]).unwrap(), Object::Integer(7));
        assert_eq!(
            call("tail", vec![items.clone()]).unwrap(),
            Object::List(ints(&[8, 9]))
        );
        assert_eq!(
            call("nth", vec![Object::Integer(2), items.clone()]).unwrap(),
            Object::Integer(9)
        );
        assert_eq!(
            call("nth", vec![Object::Integer(5), items.clone()]).unwrap(),
            Object::Null
        );
        assert_eq!(call("len", vec![items]).unwrap(), Object::Integer(3));
        assert_eq!(
            call("head", vec![Object::List(Vec::new())]).unwrap(),
            Object::Null
        );
    }

    #[test]
    fn test_str_concatenates_rendered_values() {
        let value = call(
            "str",
            vec![Object::String("n=".into()), Object::Integer(3)],
        )
        .unwrap();
        assert_eq!(value, Object::String("n=3".into()));
    }

    #[test]
    fn test_every_name_is_bound() {
        let globals = standard_globals();
        for name in builtin_names() {
            assert!(globals.contains_key(name), "{} not bound", name);
        }
    }
}
