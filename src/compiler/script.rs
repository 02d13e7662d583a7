//! Behavior-script sandbox.
//!
//! A behavior script is a sequence of `import` statements followed by `let`
//! and `const` bindings over the shared expression grammar. There are no
//! loops, no function declarations, and no ambient globals, so every script
//! terminates structurally. Imports are validated against the enumerated
//! host API at compile time; anything else is a compile error.

use serde_json::Value;

use crate::error::CompileError;

use super::expr::{eval, Expr, Parser, Scope, Tok};
use super::host_api;

/// A compiled behavior script: an ordered list of named binding expressions.
///
/// Bindings are re-evaluated against the ambient scope (slide frontmatter or
/// component props) on every render pass; later bindings see earlier ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledScript {
    pub bindings: Vec<(String, Expr)>,
}

impl CompiledScript {
    /// Evaluate all bindings over `base`, returning the extended scope.
    ///
    /// `base` entries are visible to every binding; a binding that reuses a
    /// base name shadows it for later bindings and in the result.
    pub fn evaluate(
        &self,
        base: &serde_json::Map<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, CompileError> {
        let mut vars = base.clone();
        for (name, expr) in &self.bindings {
            let value = eval(
                expr,
                &Scope {
                    vars: &vars,
                    host: host_api::table(),
                },
            )
            .map_err(|e| CompileError::new(format!("in binding `{name}`: {e}")))?;
            vars.insert(name.clone(), value);
        }
        Ok(vars)
    }
}

/// Compile a behavior script source.
pub fn compile_script(src: &str) -> Result<CompiledScript, CompileError> {
    let toks = super::expr::tokenize(src).map_err(|e| CompileError::new(e.message))?;
    let mut parser = Parser { toks, pos: 0 };
    let mut bindings = Vec::new();
    let mut past_imports = false;

    while parser.pos < parser.toks.len() {
        match keyword(&parser) {
            Some("import") => {
                if past_imports {
                    return Err(CompileError::new("imports must come before bindings"));
                }
                parse_import(&mut parser)?;
            }
            Some("let") | Some("const") => {
                past_imports = true;
                parser.pos += 1;
                let (name, expr) = parse_binding(&mut parser)?;
                bindings.push((name, expr));
            }
            _ => {
                return Err(CompileError::new(
                    "expected `import`, `let`, or `const` statement",
                ))
            }
        }
        eat_semi(&mut parser);
    }

    Ok(CompiledScript { bindings })
}

fn keyword(parser: &Parser) -> Option<&str> {
    match parser.toks.get(parser.pos) {
        Some(Tok::Ident(word)) => Some(word.as_str()),
        _ => None,
    }
}

fn eat_semi(parser: &mut Parser) {
    while matches!(parser.toks.get(parser.pos), Some(Tok::Sym(";"))) {
        parser.pos += 1;
    }
}

/// Parse `import { a, b } from '<module>'`, validating every imported name
/// against the host API table. The module specifier is not resolved; only
/// the names matter.
fn parse_import(parser: &mut Parser) -> Result<(), CompileError> {
    parser.pos += 1;
    parser
        .expect_sym("{")
        .map_err(|e| CompileError::new(e.message))?;

    loop {
        let Some(Tok::Ident(name)) = parser.toks.get(parser.pos).cloned() else {
            return Err(CompileError::new("expected imported name"));
        };
        parser.pos += 1;

        if !host_api::is_host_fn(&name) {
            return Err(CompileError::new(format!(
                "`{name}` is not an importable host function"
            )));
        }

        match parser.toks.get(parser.pos) {
            Some(Tok::Sym(",")) => parser.pos += 1,
            Some(Tok::Sym("}")) => {
                parser.pos += 1;
                break;
            }
            _ => return Err(CompileError::new("expected `,` or `}` in import list")),
        }
    }

    match (
        parser.toks.get(parser.pos),
        parser.toks.get(parser.pos + 1),
    ) {
        (Some(Tok::Ident(from)), Some(Tok::Str(_))) if from == "from" => {
            parser.pos += 2;
            Ok(())
        }
        _ => Err(CompileError::new("expected `from '<module>'` after import list")),
    }
}

fn parse_binding(parser: &mut Parser) -> Result<(String, Expr), CompileError> {
    let Some(Tok::Ident(name)) = parser.toks.get(parser.pos).cloned() else {
        return Err(CompileError::new("expected binding name"));
    };
    if host_api::is_host_fn(&name) {
        return Err(CompileError::new(format!(
            "`{name}` shadows a host function"
        )));
    }
    parser.pos += 1;
    parser
        .expect_sym("=")
        .map_err(|_| CompileError::new(format!("expected `=` after `{name}`")))?;
    let expr = parser
        .expression()
        .map_err(|e| CompileError::new(format!("in binding `{name}`: {}", e.message)))?;
    Ok((name, expr))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(src: &str) -> serde_json::Map<String, Value> {
        compile_script(src)
            .unwrap()
            .evaluate(&serde_json::Map::new())
            .unwrap()
    }

    #[test]
    fn test_let_and_const_bindings() {
        let vars = run("let x = 2\nconst y = x * 3;");
        assert_eq!(vars.get("x"), Some(&json!(2)));
        assert_eq!(vars.get("y"), Some(&json!(6)));
    }

    #[test]
    fn test_valid_import_and_call() {
        let vars = run("import { range, len } from 'deck/api'\nlet items = range(3)\nlet n = len(items)");
        assert_eq!(vars.get("items"), Some(&json!([0, 1, 2])));
        assert_eq!(vars.get("n"), Some(&json!(3)));
    }

    #[test]
    fn test_unknown_import_is_compile_error() {
        let err = compile_script("import { fetch } from 'net'").unwrap_err();
        assert!(err.message.contains("fetch"));
    }

    #[test]
    fn test_host_fns_callable_without_import() {
        let vars = run("let s = upper('hi')");
        assert_eq!(vars.get("s"), Some(&json!("HI")));
    }

    #[test]
    fn test_import_after_binding_rejected() {
        assert!(compile_script("let x = 1\nimport { len } from 'api'").is_err());
    }

    #[test]
    fn test_loops_and_functions_rejected() {
        assert!(compile_script("for (;;) {}").is_err());
        assert!(compile_script("function f() {}").is_err());
        assert!(compile_script("while (true) {}").is_err());
    }

    #[test]
    fn test_base_scope_visible_and_shadowable() {
        let script = compile_script("let title = upper(name)").unwrap();
        let mut base = serde_json::Map::new();
        base.insert("name".into(), json!("intro"));
        let vars = script.evaluate(&base).unwrap();
        assert_eq!(vars.get("title"), Some(&json!("INTRO")));
        assert_eq!(vars.get("name"), Some(&json!("intro")));
    }

    #[test]
    fn test_binding_error_names_the_binding() {
        let script = compile_script("let x = missing + 1").unwrap();
        let err = script.evaluate(&serde_json::Map::new()).unwrap_err();
        assert!(err.message.contains("`x`"));
        assert!(err.message.contains("unknown binding"));
    }

    #[test]
    fn test_ref_unwraps_to_value() {
        let vars = run("import { ref } from 'deck/api'\nlet count = ref(0)\nlet next = count + 1");
        assert_eq!(vars.get("count"), Some(&json!(0)));
        assert_eq!(vars.get("next"), Some(&json!(1)));
    }

    #[test]
    fn test_shadowing_host_fn_rejected() {
        assert!(compile_script("let len = 3").is_err());
    }
}
