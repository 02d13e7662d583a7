//! Atomic utility CSS generation.
//!
//! After a render pass attaches its subtree, the stage collects every class
//! token in the mounted content and asks the generator for one stylesheet
//! covering them. Output is deterministic: one rule per recognized token, in
//! sorted token order; unrecognized tokens (component classes, decorative
//! names) produce nothing.
//!
//! ## Modules
//!
//! - [`rules`] - token-to-declarations mapping, including the computed palette

mod rules;

use std::collections::BTreeSet;
use std::fmt::Write as _;

use once_cell::sync::Lazy;

use crate::host::{Host, NodeId};

static GENERATOR: Lazy<AtomicStyles> = Lazy::new(AtomicStyles::new);

/// The process-wide generator instance.
pub fn generator() -> &'static AtomicStyles {
    &GENERATOR
}

/// Utility CSS generator. Stateless; the singleton exists so every render
/// pass shares one instance.
#[derive(Debug, Default)]
pub struct AtomicStyles {
    _priv: (),
}

impl AtomicStyles {
    fn new() -> Self {
        Self::default()
    }

    /// The rule for one token, or `None` when the token is not a utility.
    pub fn rule_for(&self, token: &str) -> Option<String> {
        let decls = rules::declarations(token)?;
        Some(format!(".{} {{ {} }}", escape_selector(token), decls))
    }

    /// One stylesheet covering `tokens`, in sorted token order. Identical
    /// token sets always produce byte-identical output.
    pub fn css_for(&self, tokens: &BTreeSet<String>) -> String {
        let mut css = String::new();
        for token in tokens {
            if let Some(rule) = self.rule_for(token) {
                let _ = writeln!(css, "{rule}");
            }
        }
        css
    }
}

/// Escape the characters that are valid in class tokens but not in bare CSS
/// selectors.
fn escape_selector(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '/' | ':' | '.' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Every class token on the subtree rooted at `root`, deduplicated.
pub fn collect_class_tokens(host: &Host, root: NodeId) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        for class in host.classes_of(id) {
            tokens.insert(class);
        }
        stack.extend(host.children_of(id));
    }
    tokens
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_output_is_sorted_and_deterministic() {
        let set = tokens(&["p-4", "flex", "items-center"]);
        let css = generator().css_for(&set);
        let again = generator().css_for(&set);
        assert_eq!(css, again);

        let flex_at = css.find(".flex").unwrap();
        let items_at = css.find(".items-center").unwrap();
        let pad_at = css.find(".p-4").unwrap();
        assert!(flex_at < items_at && items_at < pad_at);
    }

    #[test]
    fn test_unknown_tokens_produce_nothing() {
        let css = generator().css_for(&tokens(&["deck-slide", "preview-error"]));
        assert!(css.is_empty());
    }

    #[test]
    fn test_selector_escaping() {
        let rule = generator().rule_for("w-1/2").unwrap();
        assert!(rule.starts_with(".w-1\\/2 {"));
    }

    #[test]
    fn test_collect_walks_whole_subtree() {
        let host = Host::new();
        let root = host.create_element("div");
        host.set_classes(root, vec!["flex".into(), "p-4".into()]);
        let inner = host.create_element("p");
        host.set_classes(inner, vec!["text-xl".into(), "flex".into()]);
        host.append_child(root, inner);

        let found = collect_class_tokens(&host, root);
        assert_eq!(found, tokens(&["flex", "p-4", "text-xl"]));
    }

    #[test]
    fn test_stylesheet_has_one_rule_per_recognized_token() {
        let css = generator().css_for(&tokens(&["flex", "nope", "p-2"]));
        assert_eq!(css.lines().count(), 2);
    }
}
