//! Component compiler.
//!
//! Turns one component source (template + optional behavior script +
//! optional style rules) into a renderable [`CompiledComponent`], or a
//! structured [`CompileError`]. Compilation is pure: no host access, no
//! partial output on failure.
//!
//! ## Modules
//!
//! - [`section`] - `<template>`/`<script>`/`<style>` extraction
//! - [`expr`] - shared expression grammar (parse + eval)
//! - [`script`] - behavior-script sandbox (`import` + `let`/`const`)
//! - [`template`] - HTML-like template parser and renderer
//! - [`host_api`] - the enumerated functions scripts may import

pub mod expr;
pub mod host_api;
pub mod script;
pub mod section;
pub mod template;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::error::{CompileError, RenderError};
use crate::types::{ComponentSource, VNode};

pub use script::CompiledScript;
pub use section::Sections;
pub use template::{compile_template, CompiledTemplate};

/// All supplied components, compiled, keyed by name.
pub type CompiledSet = BTreeMap<String, CompiledComponent>;

/// One compiled component: render-ready template, its behavior bindings, and
/// its verbatim style rules.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledComponent {
    pub name: String,
    pub template: CompiledTemplate,
    pub script: CompiledScript,
    /// Raw `<style>` body, injected alongside the mounted subtree.
    pub style: Option<String>,
}

impl CompiledComponent {
    /// Render this component against its props: script bindings are
    /// evaluated over the props, then the template renders in that scope.
    pub fn render(
        &self,
        props: &serde_json::Map<String, Value>,
    ) -> Result<Vec<VNode>, RenderError> {
        let scope = self
            .script
            .evaluate(props)
            .map_err(|e| RenderError::Eval(e.message))?;
        self.template.render(&scope)
    }
}

/// Compile a single component source against the full set of declared
/// component names (so components may reference each other).
pub fn compile_component(
    source: &ComponentSource,
    declared: &BTreeSet<String>,
) -> Result<CompiledComponent, CompileError> {
    let in_component =
        |e: CompileError| CompileError::new(format!("in component `{}`: {}", source.name, e));

    let sections = section::extract_sections(&source.raw).map_err(in_component)?;

    let script = match &sections.script {
        Some(src) => script::compile_script(src).map_err(in_component)?,
        None => CompiledScript::default(),
    };

    let template = compile_template(&sections.template, declared).map_err(in_component)?;

    debug!(component = %source.name, "compiled component");
    Ok(CompiledComponent {
        name: source.name.clone(),
        template,
        script,
        style: sections.style,
    })
}

/// Compile every supplied source. Stops at the first failure; a render pass
/// never proceeds with a partially compiled set.
pub fn compile_set(sources: &BTreeMap<String, String>) -> Result<CompiledSet, CompileError> {
    let declared: BTreeSet<String> = sources.keys().cloned().collect();
    let mut set = CompiledSet::new();
    for (name, raw) in sources {
        let source = ComponentSource::new(name.clone(), raw.clone());
        set.insert(name.clone(), compile_component(&source, &declared)?);
    }
    Ok(set)
}

// =============================================================================
// Tests
// =============================================================================
