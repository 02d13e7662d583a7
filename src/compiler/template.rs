//! Template parsing and rendering.
//!
//! Templates are an HTML-like tree with three dynamic constructs:
//!
//! - `{{ expr }}` interpolation inside text,
//! - `:attr="expr"` bound attributes,
//! - `v-if="expr"` and `v-for="item in expr"` directives.
//!
//! Tag names are validated at compile time: a tag is either a known HTML
//! element or the exact name of a supplied component; anything else is a
//! compile error, not a silent passthrough.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::{CompileError, RenderError};
use crate::types::VNode;

use super::expr::{display, eval, parse_expr, truthy, EvalError, Expr, Scope};
use super::host_api::{self, MAX_SEQUENCE_LEN};

/// HTML elements templates may use.
const KNOWN_HTML_TAGS: &[&str] = &[
    "a", "article", "aside", "b", "blockquote", "br", "button", "canvas", "code", "div", "em",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i",
    "img", "input", "label", "li", "main", "meta", "nav", "ol", "p", "pre", "section", "small",
    "span", "strong", "sub", "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
    "video",
];

/// Elements that never take children and need no closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta"];

// =============================================================================
// AST
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    pub roots: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Element(ElementNode),
    Text(Vec<TextPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    /// True when `tag` names a supplied component rather than an HTML element.
    pub component: bool,
    pub static_attrs: Vec<(String, String)>,
    pub bound_attrs: Vec<(String, Expr)>,
    pub condition: Option<Expr>,
    pub repeat: Option<Repeat>,
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    pub var: String,
    pub expr: Expr,
    /// Source text of the iterated expression, kept for error reporting.
    pub src: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Literal(String),
    Interp(Expr),
}

// =============================================================================
// Parsing
// =============================================================================

/// Compile template source against the set of supplied component names.
pub fn compile_template(
    src: &str,
    components: &BTreeSet<String>,
) -> Result<CompiledTemplate, CompileError> {
    let mut parser = TplParser {
        chars: src.chars().collect(),
        pos: 0,
        components,
    };
    let roots = parser.parse_children(None)?;
    Ok(CompiledTemplate { roots })
}

struct TplParser<'a> {
    chars: Vec<char>,
    pos: usize,
    components: &'a BTreeSet<String>,
}

impl TplParser<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i) == Some(c))
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(0), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(0), Some(c) if c.is_alphanumeric() || c == '-' || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_children(&mut self, parent: Option<&str>) -> Result<Vec<TemplateNode>, CompileError> {
        let mut nodes = Vec::new();

        loop {
            if self.pos >= self.chars.len() {
                return match parent {
                    Some(tag) => Err(CompileError::new(format!("unclosed <{tag}>"))),
                    None => Ok(nodes),
                };
            }

            if self.starts_with("<!--") {
                self.skip_comment()?;
                continue;
            }

            if self.starts_with("</") {
                let Some(tag) = parent else {
                    return Err(CompileError::new("stray closing tag"));
                };
                self.pos += 2;
                let name = self.read_name();
                self.skip_ws();
                if self.peek(0) != Some('>') {
                    return Err(CompileError::new(format!("malformed closing tag </{name}")));
                }
                self.pos += 1;
                if name != tag {
                    return Err(CompileError::new(format!(
                        "mismatched closing tag: expected </{tag}>, found </{name}>"
                    )));
                }
                return Ok(nodes);
            }

            if self.peek(0) == Some('<') && matches!(self.peek(1), Some(c) if c.is_alphabetic()) {
                nodes.push(TemplateNode::Element(self.parse_element()?));
                continue;
            }

            if let Some(text) = self.parse_text()? {
                nodes.push(TemplateNode::Text(text));
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), CompileError> {
        self.pos += 4;
        while self.pos < self.chars.len() {
            if self.starts_with("-->") {
                self.pos += 3;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(CompileError::new("unterminated comment"))
    }

    fn parse_element(&mut self) -> Result<ElementNode, CompileError> {
        self.pos += 1;
        let tag = self.read_name();

        let component = self.components.contains(&tag);
        if !component && !KNOWN_HTML_TAGS.contains(&tag.as_str()) {
            return Err(CompileError::new(format!("unknown tag <{tag}>")));
        }

        let mut node = ElementNode {
            tag: tag.clone(),
            component,
            static_attrs: Vec::new(),
            bound_attrs: Vec::new(),
            condition: None,
            repeat: None,
            children: Vec::new(),
        };

        let self_closed = self.parse_attrs(&mut node)?;
        let void = VOID_ELEMENTS.contains(&tag.as_str());

        if !self_closed && !void {
            node.children = self.parse_children(Some(&tag))?;
        }

        if component && node.children.iter().any(|c| !is_blank(c)) {
            return Err(CompileError::new(format!(
                "component <{tag}> cannot have children"
            )));
        }

        Ok(node)
    }

    /// Parse attributes up to and including the tag end. Returns true for a
    /// self-closing tag.
    fn parse_attrs(&mut self, node: &mut ElementNode) -> Result<bool, CompileError> {
        loop {
            self.skip_ws();
            match self.peek(0) {
                Some('>') => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some('/') if self.peek(1) == Some('>') => {
                    self.pos += 2;
                    return Ok(true);
                }
                Some(c) if c.is_alphabetic() || c == ':' || c == '_' => {
                    let name = self.read_attr_name();
                    let value = if self.peek(0) == Some('=') {
                        self.pos += 1;
                        Some(self.read_quoted(&node.tag)?)
                    } else {
                        None
                    };
                    self.classify_attr(node, name, value)?;
                }
                _ => {
                    return Err(CompileError::new(format!(
                        "malformed attributes on <{}>",
                        node.tag
                    )))
                }
            }
        }
    }

    fn read_attr_name(&mut self) -> String {
        let start = self.pos;
        while matches!(
            self.peek(0),
            Some(c) if c.is_alphanumeric() || c == '-' || c == '_' || c == ':'
        ) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_quoted(&mut self, tag: &str) -> Result<String, CompileError> {
        let quote = match self.peek(0) {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                return Err(CompileError::new(format!(
                    "attribute values on <{tag}> must be quoted"
                )))
            }
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c == quote {
                let value: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(value);
            }
            self.pos += 1;
        }
        Err(CompileError::new(format!(
            "unterminated attribute value on <{tag}>"
        )))
    }

    fn classify_attr(
        &self,
        node: &mut ElementNode,
        name: String,
        value: Option<String>,
    ) -> Result<(), CompileError> {
        match name.as_str() {
            "v-if" => {
                let src = required(&name, value)?;
                node.condition = Some(compile_expr(&src, &node.tag)?);
            }
            "v-for" => {
                let src = required(&name, value)?;
                let Some((var, iter_src)) = src.split_once(" in ") else {
                    return Err(CompileError::new(format!(
                        "v-for on <{}> must have the form `item in expr`",
                        node.tag
                    )));
                };
                let var = var.trim().to_string();
                if var.is_empty() || !var.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    return Err(CompileError::new(format!(
                        "invalid v-for variable `{var}` on <{}>",
                        node.tag
                    )));
                }
                node.repeat = Some(Repeat {
                    var,
                    expr: compile_expr(iter_src, &node.tag)?,
                    src: iter_src.trim().to_string(),
                });
            }
            _ if name.starts_with(':') => {
                let target = name[1..].to_string();
                let src = required(&name, value)?;
                node.bound_attrs.push((target, compile_expr(&src, &node.tag)?));
            }
            _ => {
                node.static_attrs.push((name, value.unwrap_or_default()));
            }
        }
        Ok(())
    }

    /// Parse a text run up to the next tag, splitting out interpolations.
    /// Whitespace-only runs are dropped.
    fn parse_text(&mut self) -> Result<Option<Vec<TextPart>>, CompileError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        while self.pos < self.chars.len() {
            // A `<` only ends the text run when it opens a tag, a closing
            // tag, or a comment; a bare `<` is literal text.
            if self.peek(0) == Some('<')
                && matches!(self.peek(1), Some(c) if c.is_alphabetic() || c == '/' || c == '!')
            {
                break;
            }
            if self.starts_with("{{") {
                self.pos += 2;
                let start = self.pos;
                while self.pos < self.chars.len() && !self.starts_with("}}") {
                    self.pos += 1;
                }
                if self.pos >= self.chars.len() {
                    return Err(CompileError::new("unterminated interpolation"));
                }
                let src: String = self.chars[start..self.pos].iter().collect();
                self.pos += 2;
                if !literal.is_empty() {
                    parts.push(TextPart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TextPart::Interp(
                    parse_expr(&src).map_err(|e| CompileError::new(e.message))?,
                ));
                continue;
            }
            literal.push(self.chars[self.pos]);
            self.pos += 1;
        }

        if !literal.is_empty() {
            parts.push(TextPart::Literal(literal));
        }

        let blank = parts.iter().all(|p| match p {
            TextPart::Literal(s) => s.trim().is_empty(),
            TextPart::Interp(_) => false,
        });
        if blank {
            return Ok(None);
        }
        Ok(Some(parts))
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, CompileError> {
    value.ok_or_else(|| CompileError::new(format!("`{name}` requires a value")))
}

fn compile_expr(src: &str, tag: &str) -> Result<Expr, CompileError> {
    parse_expr(src).map_err(|e| CompileError::new(format!("in expression on <{tag}>: {e}")))
}

fn is_blank(node: &TemplateNode) -> bool {
    match node {
        TemplateNode::Text(parts) => parts.iter().all(|p| match p {
            TextPart::Literal(s) => s.trim().is_empty(),
            TextPart::Interp(_) => false,
        }),
        TemplateNode::Element(_) => false,
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl CompiledTemplate {
    /// Render against a scope, producing the virtual node tree.
    pub fn render(
        &self,
        scope: &serde_json::Map<String, Value>,
    ) -> Result<Vec<VNode>, RenderError> {
        render_nodes(&self.roots, scope)
    }
}

fn render_nodes(
    nodes: &[TemplateNode],
    scope: &serde_json::Map<String, Value>,
) -> Result<Vec<VNode>, RenderError> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            TemplateNode::Text(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TextPart::Literal(s) => text.push_str(s),
                        TextPart::Interp(expr) => {
                            text.push_str(&display(&eval_in(expr, scope)?));
                        }
                    }
                }
                out.push(VNode::Text(text));
            }
            TemplateNode::Element(el) => render_element(el, scope, &mut out)?,
        }
    }
    Ok(out)
}

fn render_element(
    el: &ElementNode,
    scope: &serde_json::Map<String, Value>,
    out: &mut Vec<VNode>,
) -> Result<(), RenderError> {
    match &el.repeat {
        None => {
            if let Some(cond) = &el.condition {
                if !truthy(&eval_in(cond, scope)?) {
                    return Ok(());
                }
            }
            out.push(render_instance(el, scope)?);
        }
        Some(repeat) => {
            let iterated = eval_in(&repeat.expr, scope)?;
            let items: Vec<Value> = match iterated {
                Value::Array(items) => items,
                // A bare number iterates 1..=n.
                Value::Number(n) => {
                    let n = n.as_i64().unwrap_or(0).max(0);
                    if n > MAX_SEQUENCE_LEN {
                        return Err(RenderError::Eval(format!(
                            "v-for over `{}` is limited to {MAX_SEQUENCE_LEN} repetitions",
                            repeat.src
                        )));
                    }
                    (1..=n).map(Value::from).collect()
                }
                _ => return Err(RenderError::NotIterable(repeat.src.clone())),
            };
            for item in items {
                let mut inner = scope.clone();
                inner.insert(repeat.var.clone(), item);
                if let Some(cond) = &el.condition {
                    if !truthy(&eval_in(cond, &inner)?) {
                        continue;
                    }
                }
                out.push(render_instance(el, &inner)?);
            }
        }
    }
    Ok(())
}

fn render_instance(
    el: &ElementNode,
    scope: &serde_json::Map<String, Value>,
) -> Result<VNode, RenderError> {
    if el.component {
        let mut props = serde_json::Map::new();
        for (name, value) in &el.static_attrs {
            props.insert(name.clone(), Value::String(value.clone()));
        }
        for (name, expr) in &el.bound_attrs {
            props.insert(name.clone(), eval_in(expr, scope)?);
        }
        return Ok(VNode::Component {
            name: el.tag.clone(),
            props,
        });
    }

    let mut classes = Vec::new();
    let mut attrs = BTreeMap::new();

    for (name, value) in &el.static_attrs {
        if name == "class" {
            classes.extend(value.split_whitespace().map(str::to_string));
        } else {
            attrs.insert(name.clone(), value.clone());
        }
    }
    for (name, expr) in &el.bound_attrs {
        let value = eval_in(expr, scope)?;
        if name == "class" {
            push_classes(&value, &mut classes);
        } else {
            attrs.insert(name.clone(), display(&value));
        }
    }

    Ok(VNode::Element {
        tag: el.tag.clone(),
        classes,
        attrs,
        children: render_nodes(&el.children, scope)?,
    })
}

/// A bound class accepts a string of tokens or an array of strings.
fn push_classes(value: &Value, classes: &mut Vec<String>) {
    match value {
        Value::String(s) => classes.extend(s.split_whitespace().map(str::to_string)),
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    classes.extend(s.split_whitespace().map(str::to_string));
                }
            }
        }
        _ => {}
    }
}

fn eval_in(expr: &Expr, scope: &serde_json::Map<String, Value>) -> Result<Value, RenderError> {
    eval(
        expr,
        &Scope {
            vars: scope,
            host: host_api::table(),
        },
    )
    .map_err(to_render_error)
}

fn to_render_error(e: EvalError) -> RenderError {
    if let Some(rest) = e.message.strip_prefix("unknown binding `") {
        if let Some(name) = rest.strip_suffix('`') {
            return RenderError::UnknownBinding(name.to_string());
        }
    }
    RenderError::Eval(e.message)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(src: &str) -> CompiledTemplate {
        compile_template(src, &BTreeSet::new()).unwrap()
    }

    fn scope(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_static_element_with_classes() {
        let t = compile(r#"<div class="deck-slide p-4"><p>hello</p></div>"#);
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { tag, classes, children, .. } => {
                assert_eq!(tag, "div");
                assert_eq!(classes, &["deck-slide", "p-4"]);
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_interpolation() {
        let t = compile("<p>Hello {{ name }}!</p>");
        let nodes = t.render(&scope(&[("name", json!("world"))])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => {
                assert_eq!(children[0], VNode::Text("Hello world!".into()));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_bound_attribute() {
        let t = compile(r#"<img :src="url"/>"#);
        let nodes = t.render(&scope(&[("url", json!("a.png"))])).unwrap();
        match &nodes[0] {
            VNode::Element { attrs, .. } => {
                assert_eq!(attrs.get("src").map(String::as_str), Some("a.png"));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_v_if_skips_falsy() {
        let t = compile(r#"<div><p v-if="show">yes</p></div>"#);
        let shown = t.render(&scope(&[("show", json!(true))])).unwrap();
        let hidden = t.render(&scope(&[("show", json!(false))])).unwrap();
        let count = |nodes: &[VNode]| match &nodes[0] {
            VNode::Element { children, .. } => children.len(),
            _ => panic!("expected element"),
        };
        assert_eq!(count(&shown), 1);
        assert_eq!(count(&hidden), 0);
    }

    #[test]
    fn test_v_for_over_array() {
        let t = compile(r#"<ul><li v-for="item in items">{{ item }}</li></ul>"#);
        let nodes = t
            .render(&scope(&[("items", json!(["a", "b", "c"]))]))
            .unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => {
                assert_eq!(children.len(), 3);
                match &children[2] {
                    VNode::Element { children, .. } => {
                        assert_eq!(children[0], VNode::Text("c".into()));
                    }
                    _ => panic!("expected li"),
                }
            }
            _ => panic!("expected ul"),
        }
    }

    #[test]
    fn test_v_for_over_number_counts_from_one() {
        let t = compile(r#"<div><span v-for="i in 3">{{ i }}</span></div>"#);
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => assert_eq!(children.len(), 3),
            _ => panic!("expected div"),
        }
    }

    #[test]
    fn test_v_for_over_huge_number_errors() {
        let t = compile(r#"<div><span v-for="i in 1000000000">{{ i }}</span></div>"#);
        match t.render(&scope(&[])).unwrap_err() {
            RenderError::Eval(message) => assert!(message.contains("limited")),
            other => panic!("expected Eval error, got {other:?}"),
        }
    }

    #[test]
    fn test_v_for_non_iterable_errors() {
        let t = compile(r#"<div><p v-for="x in flag">{{ x }}</p></div>"#);
        let err = t.render(&scope(&[("flag", json!("nope"))])).unwrap_err();
        assert_eq!(err, RenderError::NotIterable("flag".into()));
    }

    #[test]
    fn test_unknown_tag_is_compile_error() {
        let err = compile_template("<marquee>x</marquee>", &BTreeSet::new()).unwrap_err();
        assert!(err.message.contains("marquee"));
    }

    #[test]
    fn test_component_reference_with_props() {
        let mut known = BTreeSet::new();
        known.insert("Counter".to_string());
        let t = compile_template(r#"<Counter label="votes" :start="base + 1"/>"#, &known).unwrap();
        let nodes = t.render(&scope(&[("base", json!(4))])).unwrap();
        match &nodes[0] {
            VNode::Component { name, props } => {
                assert_eq!(name, "Counter");
                assert_eq!(props.get("label"), Some(&json!("votes")));
                assert_eq!(props.get("start"), Some(&json!(5)));
            }
            other => panic!("expected component, got {other:?}"),
        }
    }

    #[test]
    fn test_component_name_matching_is_exact() {
        let mut known = BTreeSet::new();
        known.insert("Counter".to_string());
        assert!(compile_template("<counter/>", &known).is_err());
    }

    #[test]
    fn test_component_children_rejected() {
        let mut known = BTreeSet::new();
        known.insert("Card".to_string());
        assert!(compile_template("<Card><p>x</p></Card>", &known).is_err());
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = compile_template("<div><p>x</div></p>", &BTreeSet::new()).unwrap_err();
        assert!(err.message.contains("mismatched"));
    }

    #[test]
    fn test_void_elements_need_no_close() {
        let t = compile("<div><br><hr><img src=\"x.png\"></div>");
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => assert_eq!(children.len(), 3),
            _ => panic!("expected div"),
        }
    }

    #[test]
    fn test_unknown_binding_in_interpolation() {
        let t = compile("<p>{{ missing }}</p>");
        let err = t.render(&scope(&[])).unwrap_err();
        assert_eq!(err, RenderError::UnknownBinding("missing".into()));
    }

    #[test]
    fn test_bound_class_array() {
        let t = compile(r#"<div :class="['a', cls]"></div>"#);
        let nodes = t.render(&scope(&[("cls", json!("b c"))])).unwrap();
        match &nodes[0] {
            VNode::Element { classes, .. } => assert_eq!(classes, &["a", "b", "c"]),
            _ => panic!("expected div"),
        }
    }

    #[test]
    fn test_bare_angle_bracket_is_text() {
        let t = compile("<p>1 < 2</p>");
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => {
                assert_eq!(children[0], VNode::Text("1 < 2".into()));
            }
            _ => panic!("expected p"),
        }
    }

    #[test]
    fn test_comments_ignored() {
        let t = compile("<div><!-- note --><p>x</p></div>");
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => assert_eq!(children.len(), 1),
            _ => panic!("expected div"),
        }
    }

    #[test]
    fn test_host_call_in_template() {
        let t = compile(r#"<div><span v-for="i in range(2)">{{ i }}</span></div>"#);
        let nodes = t.render(&scope(&[])).unwrap();
        match &nodes[0] {
            VNode::Element { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected div"),
        }
    }
}
