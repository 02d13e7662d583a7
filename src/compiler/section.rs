//! Component-source section extraction.
//!
//! A component source is a single file with up to three top-level sections:
//! `<template>` (required), `<script>` (optional), and `<style>` (optional).
//! Section tags must start at the beginning of a line; attributes on the
//! opening tag (`<script setup>`, `<style scoped>`) are accepted and ignored.

use crate::error::CompileError;

/// Raw section bodies of one component source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub template: String,
    pub script: Option<String>,
    pub style: Option<String>,
}

/// Split a component source into its sections.
///
/// A missing `<template>` section is fatal; duplicate sections are too.
pub fn extract_sections(src: &str) -> Result<Sections, CompileError> {
    let mut sections = Sections::default();
    let mut seen_template = false;

    let mut rest = src;
    while let Some((name, body, tail)) = next_section(rest)? {
        match name.as_str() {
            "template" => {
                if seen_template {
                    return Err(CompileError::new("duplicate <template> section"));
                }
                seen_template = true;
                sections.template = body;
            }
            "script" => {
                if sections.script.is_some() {
                    return Err(CompileError::new("duplicate <script> section"));
                }
                sections.script = Some(body);
            }
            "style" => {
                if sections.style.is_some() {
                    return Err(CompileError::new("duplicate <style> section"));
                }
                sections.style = Some(body);
            }
            other => {
                return Err(CompileError::new(format!(
                    "unexpected top-level section <{other}>"
                )))
            }
        }
        rest = tail;
    }

    if !seen_template {
        return Err(CompileError::new("component is missing a <template> section"));
    }
    Ok(sections)
}

/// Find the next top-level section in `src`. Returns the section name, its
/// body, and the remaining input after the closing tag.
fn next_section(src: &str) -> Result<Option<(String, String, &str)>, CompileError> {
    let trimmed = src.trim_start();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.starts_with('<') {
        return Err(CompileError::new(
            "expected a top-level <template>, <script>, or <style> section",
        ));
    }

    let after_open = &trimmed[1..];
    let name: String = after_open
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return Err(CompileError::new("malformed section tag"));
    }

    let open_end = after_open
        .find('>')
        .ok_or_else(|| CompileError::new(format!("unclosed <{name}> tag")))?;
    let body_start = &after_open[open_end + 1..];

    let close = format!("</{name}>");
    let close_at = body_start
        .find(&close)
        .ok_or_else(|| CompileError::new(format!("missing {close}")))?;

    let body = body_start[..close_at].to_string();
    let tail = &body_start[close_at + close.len()..];
    Ok(Some((name, body, tail)))
}

// =============================================================================
// Tests
// =============================================================================
