//! Expression language shared by behavior scripts and templates.
//!
//! A small, total expression grammar over JSON values: literals, arrays,
//! objects, identifiers, member/index access, calls into the enumerated host
//! API, arithmetic, comparison, and boolean logic. There are no loops,
//! closures, or user-defined functions, so evaluation always terminates.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

// =============================================================================
// Errors
// =============================================================================

/// Evaluation or parse failure inside the expression language.
///
/// Converted to `CompileError` by the script sandbox (scripts run at compile
/// time) and to `RenderError` by the template renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Ident(String),
    Num(f64),
    Str(String),
    Sym(&'static str),
}

/// Tokenize source text. `//` comments run to end of line.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Tok>, EvalError> {
    let mut toks = Vec::new();
    let bytes: Vec<char> = src.chars().collect();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '/' if bytes.get(i + 1) == Some(&'/') => {
                while i < bytes.len() && bytes[i] != '\n' {
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                i += 1;
                let mut s = String::new();
                loop {
                    match bytes.get(i) {
                        None => return Err(EvalError::new("unterminated string literal")),
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = bytes
                                .get(i + 1)
                                .ok_or_else(|| EvalError::new("unterminated string escape"))?;
                            s.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => *other,
                            });
                            i += 2;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                toks.push(Tok::Str(s));
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                    i += 1;
                }
                let text: String = bytes[start..i].iter().collect();
                let num = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::new(format!("invalid number `{text}`")))?;
                toks.push(Tok::Num(num));
            }
            _ if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_alphanumeric() || bytes[i] == '_' || bytes[i] == '$')
                {
                    i += 1;
                }
                toks.push(Tok::Ident(bytes[start..i].iter().collect()));
            }
            _ => {
                let two: Option<&'static str> = match (c, bytes.get(i + 1)) {
                    ('=', Some('=')) => Some("=="),
                    ('!', Some('=')) => Some("!="),
                    ('<', Some('=')) => Some("<="),
                    ('>', Some('=')) => Some(">="),
                    ('&', Some('&')) => Some("&&"),
                    ('|', Some('|')) => Some("||"),
                    _ => None,
                };
                if let Some(sym) = two {
                    toks.push(Tok::Sym(sym));
                    i += 2;
                    continue;
                }
                let one: &'static str = match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '%' => "%",
                    '<' => "<",
                    '>' => ">",
                    '!' => "!",
                    '(' => "(",
                    ')' => ")",
                    '[' => "[",
                    ']' => "]",
                    '{' => "{",
                    '}' => "}",
                    ',' => ",",
                    ':' => ":",
                    ';' => ";",
                    '.' => ".",
                    '=' => "=",
                    _ => return Err(EvalError::new(format!("unexpected character `{c}`"))),
                };
                toks.push(Tok::Sym(one));
                i += 1;
            }
        }
    }

    Ok(toks)
}

// =============================================================================
// AST
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Call into the enumerated host API by name.
    Call(String, Vec<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parse a single expression from source text.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let toks = tokenize(src)?;
    let mut parser = Parser { toks, pos: 0 };
    let expr = parser.expression()?;
    if parser.pos != parser.toks.len() {
        return Err(EvalError::new(format!("unexpected trailing input in `{}`", src.trim())));
    }
    Ok(expr)
}

pub(crate) struct Parser {
    pub(crate) toks: Vec<Tok>,
    pub(crate) pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn eat_sym(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Sym(s)) if *s == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_sym(&mut self, sym: &str) -> Result<(), EvalError> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(EvalError::new(format!("expected `{sym}`")))
        }
    }

    pub(crate) fn expression(&mut self) -> Result<Expr, EvalError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.and_expr()?;
        while self.eat_sym("||") {
            let right = self.and_expr()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.cmp_expr()?;
        while self.eat_sym("&&") {
            let right = self.cmp_expr()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn cmp_expr(&mut self) -> Result<Expr, EvalError> {
        let left = self.add_expr()?;
        for (sym, op) in [
            ("==", BinOp::Eq),
            ("!=", BinOp::Ne),
            ("<=", BinOp::Le),
            (">=", BinOp::Ge),
            ("<", BinOp::Lt),
            (">", BinOp::Gt),
        ] {
            if self.eat_sym(sym) {
                let right = self.add_expr()?;
                return Ok(Expr::Binary(op, Box::new(left), Box::new(right)));
            }
        }
        Ok(left)
    }

    fn add_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.mul_expr()?;
        loop {
            if self.eat_sym("+") {
                let right = self.mul_expr()?;
                left = Expr::Binary(BinOp::Add, Box::new(left), Box::new(right));
            } else if self.eat_sym("-") {
                let right = self.mul_expr()?;
                left = Expr::Binary(BinOp::Sub, Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn mul_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary_expr()?;
        loop {
            if self.eat_sym("*") {
                let right = self.unary_expr()?;
                left = Expr::Binary(BinOp::Mul, Box::new(left), Box::new(right));
            } else if self.eat_sym("/") {
                let right = self.unary_expr()?;
                left = Expr::Binary(BinOp::Div, Box::new(left), Box::new(right));
            } else if self.eat_sym("%") {
                let right = self.unary_expr()?;
                left = Expr::Binary(BinOp::Rem, Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, EvalError> {
        if self.eat_sym("!") {
            return Ok(Expr::Not(Box::new(self.unary_expr()?)));
        }
        if self.eat_sym("-") {
            return Ok(Expr::Neg(Box::new(self.unary_expr()?)));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary_expr()?;
        loop {
            if self.eat_sym(".") {
                let Some(Tok::Ident(name)) = self.peek().cloned() else {
                    return Err(EvalError::new("expected property name after `.`"));
                };
                self.pos += 1;
                expr = Expr::Member(Box::new(expr), name);
            } else if self.eat_sym("[") {
                let index = self.expression()?;
                self.expect_sym("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if matches!(self.peek(), Some(Tok::Sym("("))) {
                // Calls are only valid on bare identifiers (host API names).
                let Expr::Ident(name) = expr else {
                    return Err(EvalError::new("only host API functions are callable"));
                };
                self.pos += 1;
                let mut args = Vec::new();
                if !self.eat_sym(")") {
                    loop {
                        args.push(self.expression()?);
                        if self.eat_sym(")") {
                            break;
                        }
                        self.expect_sym(",")?;
                    }
                }
                expr = Expr::Call(name, args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary_expr(&mut self) -> Result<Expr, EvalError> {
        match self.peek().cloned() {
            Some(Tok::Num(n)) => {
                self.pos += 1;
                Ok(Expr::Num(n))
            }
            Some(Tok::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Tok::Ident(name)) => {
                self.pos += 1;
                match name.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    _ => Ok(Expr::Ident(name)),
                }
            }
            Some(Tok::Sym("(")) => {
                self.pos += 1;
                let expr = self.expression()?;
                self.expect_sym(")")?;
                Ok(expr)
            }
            Some(Tok::Sym("[")) => {
                self.pos += 1;
                let mut items = Vec::new();
                if !self.eat_sym("]") {
                    loop {
                        items.push(self.expression()?);
                        if self.eat_sym("]") {
                            break;
                        }
                        self.expect_sym(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            Some(Tok::Sym("{")) => {
                self.pos += 1;
                let mut entries = Vec::new();
                if !self.eat_sym("}") {
                    loop {
                        let key = match self.peek().cloned() {
                            Some(Tok::Ident(k)) => k,
                            Some(Tok::Str(k)) => k,
                            _ => return Err(EvalError::new("expected object key")),
                        };
                        self.pos += 1;
                        self.expect_sym(":")?;
                        entries.push((key, self.expression()?));
                        if self.eat_sym("}") {
                            break;
                        }
                        self.expect_sym(",")?;
                    }
                }
                Ok(Expr::Object(entries))
            }
            other => Err(EvalError::new(format!("unexpected token {other:?}"))),
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Host API function: pure, total over its inputs.
pub type HostFn = fn(&[Value]) -> Result<Value, EvalError>;

/// Evaluation scope: named bindings plus the enumerated host functions.
///
/// There is deliberately no parent/ambient scope — this is the sandbox
/// boundary.
pub struct Scope<'a> {
    pub vars: &'a serde_json::Map<String, Value>,
    pub host: &'a BTreeMap<&'static str, HostFn>,
}

pub fn eval(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Num(n) => num_value(*n),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => scope
            .vars
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::new(format!("unknown binding `{name}`"))),
        Expr::Array(items) => {
            let values: Result<Vec<Value>, EvalError> =
                items.iter().map(|item| eval(item, scope)).collect();
            Ok(Value::Array(values?))
        }
        Expr::Object(entries) => {
            let mut map = serde_json::Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), eval(value, scope)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, scope)?))),
        Expr::Neg(inner) => {
            let value = eval(inner, scope)?;
            num_value(-as_number(&value)?)
        }
        Expr::Binary(op, left, right) => eval_binary(*op, left, right, scope),
        Expr::Call(name, args) => {
            let func = scope
                .host
                .get(name.as_str())
                .ok_or_else(|| EvalError::new(format!("unknown host function `{name}`")))?;
            let values: Result<Vec<Value>, EvalError> =
                args.iter().map(|arg| eval(arg, scope)).collect();
            func(&values?)
        }
        Expr::Member(target, name) => {
            let value = eval(target, scope)?;
            match value {
                Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
                _ => Err(EvalError::new(format!("no property `{name}` on non-object"))),
            }
        }
        Expr::Index(target, index) => {
            let value = eval(target, scope)?;
            let index = eval(index, scope)?;
            match (&value, &index) {
                (Value::Array(items), _) => {
                    let idx = as_number(&index)? as usize;
                    Ok(items.get(idx).cloned().unwrap_or(Value::Null))
                }
                (Value::Object(map), Value::String(key)) => {
                    Ok(map.get(key).cloned().unwrap_or(Value::Null))
                }
                _ => Err(EvalError::new("value is not indexable")),
            }
        }
    }
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    // Short-circuit logic evaluates the right side lazily.
    match op {
        BinOp::And => {
            let lhs = eval(left, scope)?;
            return if truthy(&lhs) { eval(right, scope) } else { Ok(lhs) };
        }
        BinOp::Or => {
            let lhs = eval(left, scope)?;
            return if truthy(&lhs) { Ok(lhs) } else { eval(right, scope) };
        }
        _ => {}
    }

    let lhs = eval(left, scope)?;
    let rhs = eval(right, scope)?;

    match op {
        BinOp::Add => {
            if lhs.is_string() || rhs.is_string() {
                Ok(Value::String(format!("{}{}", display(&lhs), display(&rhs))))
            } else {
                num_value(as_number(&lhs)? + as_number(&rhs)?)
            }
        }
        BinOp::Sub => num_value(as_number(&lhs)? - as_number(&rhs)?),
        BinOp::Mul => num_value(as_number(&lhs)? * as_number(&rhs)?),
        BinOp::Div => {
            let divisor = as_number(&rhs)?;
            if divisor == 0.0 {
                return Err(EvalError::new("division by zero"));
            }
            num_value(as_number(&lhs)? / divisor)
        }
        BinOp::Rem => {
            let divisor = as_number(&rhs)?;
            if divisor == 0.0 {
                return Err(EvalError::new("division by zero"));
            }
            num_value(as_number(&lhs)? % divisor)
        }
        BinOp::Eq => Ok(Value::Bool(loose_eq(&lhs, &rhs))),
        BinOp::Ne => Ok(Value::Bool(!loose_eq(&lhs, &rhs))),
        BinOp::Lt => compare(&lhs, &rhs).map(|ord| Value::Bool(ord == std::cmp::Ordering::Less)),
        BinOp::Le => compare(&lhs, &rhs).map(|ord| Value::Bool(ord != std::cmp::Ordering::Greater)),
        BinOp::Gt => compare(&lhs, &rhs).map(|ord| Value::Bool(ord == std::cmp::Ordering::Greater)),
        BinOp::Ge => compare(&lhs, &rhs).map(|ord| Value::Bool(ord != std::cmp::Ordering::Less)),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

// =============================================================================
// Value helpers
// =============================================================================

/// Truthiness: null, false, 0, and the empty string are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value for interpolation: strings bare, everything else as JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            // Integral floats print without a trailing ".0".
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

pub(crate) fn as_number(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| EvalError::new("number out of range")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(EvalError::new(format!(
            "expected a number, got {}",
            type_name(other)
        ))),
    }
}

pub(crate) fn num_value(n: f64) -> Result<Value, EvalError> {
    if !n.is_finite() {
        return Err(EvalError::new("arithmetic produced a non-finite number"));
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Ok(Value::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| EvalError::new("arithmetic produced a non-finite number"))
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => as_number(a)?
            .partial_cmp(&as_number(b)?)
            .ok_or_else(|| EvalError::new("values are not comparable")),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Tests
// =============================================================================
