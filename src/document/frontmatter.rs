//! Strict frontmatter parsing and merging.
//!
//! A block qualifies as frontmatter only if it parses as a single YAML
//! mapping with string keys and simple values: scalars, sequences of
//! scalars, or one-level mappings of scalars. Anything deeper or stranger is
//! treated as slide content by the splitter.

use serde_json::Value;
use serde_yaml::Value as Yaml;

use crate::types::Frontmatter;

// =============================================================================
// Strict parse
// =============================================================================

/// Attempt the strict mapping parse. Returns `None` when the block is not a
/// single simple mapping.
pub fn parse_strict_mapping(block: &str) -> Option<Frontmatter> {
    if block.trim().is_empty() {
        return None;
    }

    let parsed: Yaml = serde_yaml::from_str(block).ok()?;
    let Yaml::Mapping(mapping) = parsed else {
        return None;
    };

    let mut out = Frontmatter::new();
    for (key, value) in &mapping {
        let Yaml::String(key) = key else {
            return None;
        };
        out.insert(key.clone(), simple_value(value, 0)?);
    }
    Some(out)
}

/// Convert a YAML value to JSON, rejecting anything beyond "simple":
/// scalars at any level, containers only one level deep.
fn simple_value(value: &Yaml, depth: usize) -> Option<Value> {
    match value {
        Yaml::Null => Some(Value::Null),
        Yaml::Bool(b) => Some(Value::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::from(i))
            } else {
                n.as_f64().and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            }
        }
        Yaml::String(s) => Some(Value::String(s.clone())),
        Yaml::Sequence(items) if depth == 0 => {
            let converted: Option<Vec<Value>> =
                items.iter().map(|v| simple_value(v, depth + 1)).collect();
            converted.map(Value::Array)
        }
        Yaml::Mapping(map) if depth == 0 => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let Yaml::String(k) = k else { return None };
                out.insert(k.clone(), simple_value(v, depth + 1)?);
            }
            Some(Value::Object(out))
        }
        _ => None,
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Merge document-level defaults with a per-slide override block.
///
/// The override sets only the keys it names; unset keys keep the document
/// default.
pub fn merge_frontmatter(defaults: &Frontmatter, overrides: Option<&Frontmatter>) -> Frontmatter {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_mapping() {
        let fm = parse_strict_mapping("theme: dark\ncount: 3\nratio: 1.5").unwrap();
        assert_eq!(fm.get("theme"), Some(&json!("dark")));
        assert_eq!(fm.get("count"), Some(&json!(3)));
        assert_eq!(fm.get("ratio"), Some(&json!(1.5)));
    }

    #[test]
    fn test_parse_allows_flat_containers() {
        let fm = parse_strict_mapping("tags: [a, b]\nmeta:\n  author: x").unwrap();
        assert_eq!(fm.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(fm.get("meta"), Some(&json!({"author": "x"})));
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(parse_strict_mapping("Hello").is_none());
        assert!(parse_strict_mapping("- a\n- b").is_none());
        assert!(parse_strict_mapping("").is_none());
        assert!(parse_strict_mapping("   \n  ").is_none());
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        assert!(parse_strict_mapping("a:\n  b:\n    c: 1").is_none());
        assert!(parse_strict_mapping("a:\n  - [1, 2]").is_none());
    }

    #[test]
    fn test_parse_rejects_non_string_keys() {
        assert!(parse_strict_mapping("1: x").is_none());
    }

    #[test]
    fn test_merge_precedence() {
        let mut defaults = Frontmatter::new();
        defaults.insert("a".into(), json!(1));
        defaults.insert("b".into(), json!(2));

        let mut overrides = Frontmatter::new();
        overrides.insert("b".into(), json!(3));

        let merged = merge_frontmatter(&defaults, Some(&overrides));
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(3)));
    }

    #[test]
    fn test_merge_without_overrides() {
        let mut defaults = Frontmatter::new();
        defaults.insert("a".into(), json!(1));
        assert_eq!(merge_frontmatter(&defaults, None), defaults);
    }
}
