//! The enumerated host API available to behavior scripts.
//!
//! Scripts may only import and call the functions listed here. Each is a
//! pure function over JSON values; none touches the host document, the
//! network, or the clock.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use super::expr::{as_number, display, num_value, EvalError, HostFn};

static TABLE: Lazy<BTreeMap<&'static str, HostFn>> = Lazy::new(|| {
    let mut t: BTreeMap<&'static str, HostFn> = BTreeMap::new();
    t.insert("ref", host_ref);
    t.insert("range", host_range);
    t.insert("len", host_len);
    t.insert("upper", host_upper);
    t.insert("lower", host_lower);
    t.insert("join", host_join);
    t.insert("min", host_min);
    t.insert("max", host_max);
    t.insert("concat", host_concat);
    t
});

/// The host API table, keyed by importable name.
pub fn table() -> &'static BTreeMap<&'static str, HostFn> {
    &TABLE
}

/// Whether `name` is an importable host API function.
pub fn is_host_fn(name: &str) -> bool {
    TABLE.contains_key(name)
}

fn arity(args: &[Value], expected: usize, name: &str) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::new(format!(
            "`{name}` expects {expected} argument(s), got {}",
            args.len()
        )))
    }
}

/// Reactive-looking wrapper kept for source compatibility: bindings here are
/// recomputed per render pass, so `ref(x)` is just `x`.
fn host_ref(args: &[Value]) -> Result<Value, EvalError> {
    arity(args, 1, "ref")?;
    Ok(args[0].clone())
}

/// Longest sequence a script may materialize at once. Keeps a bad payload
/// from turning one call into a multi-gigabyte allocation.
pub const MAX_SEQUENCE_LEN: i64 = 10_000;

fn host_range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, end) = match args {
        [end] => (0i64, as_number(end)? as i64),
        [start, end] => (as_number(start)? as i64, as_number(end)? as i64),
        _ => return Err(EvalError::new("`range` expects 1 or 2 arguments")),
    };
    if end.saturating_sub(start) > MAX_SEQUENCE_LEN {
        return Err(EvalError::new(format!(
            "`range` is limited to {MAX_SEQUENCE_LEN} elements"
        )));
    }
    Ok(Value::Array((start..end).map(Value::from).collect()))
}

fn host_len(args: &[Value]) -> Result<Value, EvalError> {
    arity(args, 1, "len")?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(EvalError::new(format!(
                "`len` expects a string, array, or object, got {other}"
            )))
        }
    };
    Ok(Value::from(n))
}

fn host_upper(args: &[Value]) -> Result<Value, EvalError> {
    arity(args, 1, "upper")?;
    Ok(Value::String(display(&args[0]).to_uppercase()))
}

fn host_lower(args: &[Value]) -> Result<Value, EvalError> {
    arity(args, 1, "lower")?;
    Ok(Value::String(display(&args[0]).to_lowercase()))
}

fn host_join(args: &[Value]) -> Result<Value, EvalError> {
    arity(args, 2, "join")?;
    let Value::Array(items) = &args[0] else {
        return Err(EvalError::new("`join` expects an array"));
    };
    let sep = display(&args[1]);
    let parts: Vec<String> = items.iter().map(display).collect();
    Ok(Value::String(parts.join(&sep)))
}

fn host_min(args: &[Value]) -> Result<Value, EvalError> {
    fold_numeric(args, "min", f64::min)
}

fn host_max(args: &[Value]) -> Result<Value, EvalError> {
    fold_numeric(args, "max", f64::max)
}

fn fold_numeric(args: &[Value], name: &str, pick: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    // Accept either a single array or variadic numbers.
    let items: Vec<&Value> = match args {
        [Value::Array(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    };
    let mut iter = items.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| EvalError::new(format!("`{name}` expects at least one value")))?;
    let mut acc = as_number(first)?;
    for item in iter {
        acc = pick(acc, as_number(item)?);
    }
    num_value(acc)
}

fn host_concat(args: &[Value]) -> Result<Value, EvalError> {
    if args.iter().all(|a| matches!(a, Value::Array(_))) && !args.is_empty() {
        let mut out = Vec::new();
        for arg in args {
            if let Value::Array(items) = arg {
                out.extend(items.iter().cloned());
            }
        }
        return Ok(Value::Array(out));
    }
    Ok(Value::String(args.iter().map(display).collect()))
}
