//! Mount/session controller.
//!
//! A [`Stage`] owns at most one render session inside its container node.
//! Each inbound request runs the same cycle: dispose the previous session,
//! compile everything, materialize into a fresh subtree, attach, inject
//! styles, register observers, and apply the initial rescale. Any failure
//! after disposal leaves the container holding only an error panel, never a
//! partial mount.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;
use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use crate::compiler::{compile_component, compile_set, compile_template, CompiledSet};
use crate::document::split_document;
use crate::error::{RenderError, StageError};
use crate::host::{FrameId, Host, MutationKind, NodeId, ObserverId};
use crate::layout::natural_size;
use crate::styles::{collect_class_tokens, generator};
use crate::types::{ComponentSource, RenderRequest, VNode, DESIGN_HEIGHT, DESIGN_WIDTH};

use super::rescale::fit_to_container;

/// Component references may nest this deep before a render pass gives up.
const MAX_COMPONENT_DEPTH: usize = 32;

/// Where the stage is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No session mounted.
    Idle,
    /// A request is being compiled and materialized.
    Compiling,
    /// A session is attached and observed.
    Mounted,
    /// Teardown in progress. Re-entrant dispose calls return immediately.
    Disposing,
}

/// One mounted render session.
struct RenderSession {
    root: NodeId,
    style_nodes: Vec<NodeId>,
    observers: Vec<ObserverId>,
    pending_rescale: Option<FrameId>,
}

struct StageInner {
    container: NodeId,
    state: StageState,
    session: Option<RenderSession>,
    error_panel: Option<NodeId>,
    allow_upscale: bool,
    scale: Signal<f32>,
    ready: Signal<bool>,
    ready_fired: bool,
}

/// The mount manager. Clones share the same session.
#[derive(Clone)]
pub struct Stage {
    host: Host,
    inner: Rc<RefCell<StageInner>>,
}

impl Stage {
    /// Create a stage over `container`, which must be an element the
    /// embedder owns. The stage never releases the container itself.
    pub fn new(host: Host, container: NodeId) -> Self {
        Self {
            host,
            inner: Rc::new(RefCell::new(StageInner {
                container,
                state: StageState::Idle,
                session: None,
                error_panel: None,
                allow_upscale: false,
                scale: signal(1.0_f32),
                ready: signal(false),
                ready_fired: false,
            })),
        }
    }

    pub fn state(&self) -> StageState {
        self.inner.borrow().state
    }

    pub fn container(&self) -> NodeId {
        self.inner.borrow().container
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Current fit scale. Updated by every applied rescale.
    pub fn scale(&self) -> Signal<f32> {
        self.inner.borrow().scale.clone()
    }

    /// Becomes true once, after the first successful mount.
    pub fn ready(&self) -> Signal<bool> {
        self.inner.borrow().ready.clone()
    }

    // =========================================================================
    // Render cycle
    // =========================================================================

    /// Run one full render cycle for `request`.
    ///
    /// The previous session (or error panel) is always disposed first. On
    /// failure the container holds an error panel and the error is also
    /// returned.
    pub fn render(&self, request: &RenderRequest) -> Result<(), StageError> {
        self.dispose();
        self.set_state(StageState::Compiling);

        match self.try_render(request) {
            Ok(()) => {
                self.set_state(StageState::Mounted);
                self.fire_ready();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "render cycle failed");
                self.show_error(&err.to_string());
                self.set_state(StageState::Idle);
                Err(err)
            }
        }
    }

    /// Tear down the current session. Idempotent, and safe to call from any
    /// state; a re-entrant call during teardown is a no-op.
    pub fn dispose(&self) {
        let (session, panel) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == StageState::Disposing {
                return;
            }
            inner.state = StageState::Disposing;
            (inner.session.take(), inner.error_panel.take())
        };

        if let Some(session) = session {
            if let Some(frame) = session.pending_rescale {
                self.host.cancel_frame(frame);
            }
            for observer in session.observers {
                self.host.unobserve(observer);
            }
            self.host.release(session.root);
            for node in session.style_nodes {
                self.host.release(node);
            }
            debug!("session disposed");
        }
        if let Some(panel) = panel {
            self.host.release(panel);
        }

        self.set_state(StageState::Idle);
    }

    fn try_render(&self, request: &RenderRequest) -> Result<(), StageError> {
        let container = self.container();
        let set = compile_set(&request.components)?;
        let declared: BTreeSet<String> = set.keys().cloned().collect();

        let root = self.host.create_element("div");
        let mut allow_upscale = false;

        let built = if request.is_component_shaped() {
            self.host
                .set_classes(root, vec!["deck".into(), "deck-component".into()]);
            self.build_component_preview(root, request, &declared, &set)
        } else {
            self.host.set_classes(root, vec!["deck".into()]);
            self.build_slides(root, request, &declared, &set, &mut allow_upscale)
        };
        if let Err(err) = built {
            // No partial mount: the subtree was never attached.
            self.host.release(root);
            return Err(err);
        }

        self.host.append_child(container, root);

        let mut style_nodes = Vec::new();
        for component in set.values() {
            if let Some(css) = &component.style {
                let node = self.host.create_style(css.clone());
                self.host.append_child(container, node);
                style_nodes.push(node);
            }
        }
        let tokens = collect_class_tokens(&self.host, root);
        let utility_css = generator().css_for(&tokens);
        if !utility_css.is_empty() {
            let node = self.host.create_style(utility_css);
            self.host.append_child(container, node);
            style_nodes.push(node);
        }

        // Observe only after attach, so the mount itself triggers nothing.
        let observers = vec![
            {
                let host = self.host.clone();
                let inner = Rc::clone(&self.inner);
                self.host.observe_mutations(
                    root,
                    MutationKind::CHILD_LIST | MutationKind::CHARACTER_DATA,
                    move || schedule_rescale(&host, &inner),
                )
            },
            {
                let host = self.host.clone();
                let inner = Rc::clone(&self.inner);
                self.host
                    .observe_resize(container, move || schedule_rescale(&host, &inner))
            },
        ];

        {
            let mut inner = self.inner.borrow_mut();
            inner.allow_upscale = allow_upscale;
            inner.session = Some(RenderSession {
                root,
                style_nodes,
                observers,
                pending_rescale: None,
            });
        }

        // First fit is synchronous so the mount never flashes unscaled.
        apply_rescale(&self.host, &self.inner);
        Ok(())
    }

    fn build_slides(
        &self,
        root: NodeId,
        request: &RenderRequest,
        declared: &BTreeSet<String>,
        set: &CompiledSet,
        allow_upscale: &mut bool,
    ) -> Result<(), StageError> {
        let slides = split_document(&request.document);
        debug!(slides = slides.len(), "building slide tree");

        for slide in &slides {
            if slide.ordinal == 1 {
                *allow_upscale = slide
                    .frontmatter
                    .get("upscale")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
            }

            let template = compile_template(&slide.content, declared)?;
            let nodes = template.render(&slide.frontmatter)?;

            let slide_el = self.host.create_element("div");
            self.host.set_classes(slide_el, vec!["deck-slide".into()]);
            let width = dimension(&slide.frontmatter, "width", DESIGN_WIDTH);
            let height = dimension(&slide.frontmatter, "height", DESIGN_HEIGHT);
            self.host.set_attr(slide_el, "width", format!("{width}"));
            self.host.set_attr(slide_el, "height", format!("{height}"));
            self.host.append_child(root, slide_el);

            for node in &nodes {
                materialize(&self.host, slide_el, node, set, 0)?;
            }
        }
        Ok(())
    }

    fn build_component_preview(
        &self,
        root: NodeId,
        request: &RenderRequest,
        declared: &BTreeSet<String>,
        set: &CompiledSet,
    ) -> Result<(), StageError> {
        let source = ComponentSource::new("Preview", request.document.clone());
        let preview = compile_component(&source, declared)?;
        let nodes = preview.render(&serde_json::Map::new())?;
        for node in &nodes {
            materialize(&self.host, root, node, set, 0)?;
        }
        Ok(())
    }

    fn show_error(&self, message: &str) {
        let container = self.container();
        let panel = self.host.create_element("div");
        self.host.set_classes(panel, vec!["preview-error".into()]);
        let text = self.host.create_text(message.to_string());
        self.host.append_child(panel, text);
        self.host.append_child(container, panel);
        self.inner.borrow_mut().error_panel = Some(panel);
    }

    fn set_state(&self, state: StageState) {
        self.inner.borrow_mut().state = state;
    }

    fn fire_ready(&self) {
        let ready = {
            let mut inner = self.inner.borrow_mut();
            if inner.ready_fired {
                return;
            }
            inner.ready_fired = true;
            inner.ready.clone()
        };
        ready.set(true);
    }
}

// =============================================================================
// Materialization
// =============================================================================

/// Write one virtual node into the host under `parent`, expanding component
/// references against the compiled set. `depth` counts expansions, not tree
/// depth.
fn materialize(
    host: &Host,
    parent: NodeId,
    vnode: &VNode,
    set: &CompiledSet,
    depth: usize,
) -> Result<(), RenderError> {
    match vnode {
        VNode::Text(text) => {
            let node = host.create_text(text.clone());
            host.append_child(parent, node);
        }
        VNode::Element {
            tag,
            classes,
            attrs,
            children,
        } => {
            let node = host.create_element(tag.clone());
            // Attach before descending so an error mid-subtree leaves
            // everything reachable from the root for rollback.
            host.append_child(parent, node);
            if !classes.is_empty() {
                host.set_classes(node, classes.clone());
            }
            for (name, value) in attrs {
                host.set_attr(node, name.clone(), value.clone());
            }
            for child in children {
                materialize(host, node, child, set, depth)?;
            }
        }
        VNode::Component { name, props } => {
            if depth >= MAX_COMPONENT_DEPTH {
                return Err(RenderError::DepthExceeded);
            }
            let component = set
                .get(name)
                .ok_or_else(|| RenderError::UnknownComponent(name.clone()))?;
            let nodes = component.render(props)?;
            for node in &nodes {
                materialize(host, parent, node, set, depth + 1)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// Rescale loop
// =============================================================================

/// Coalesce rescale work onto the next frame: a new trigger cancels the
/// previously scheduled one.
fn schedule_rescale(host: &Host, inner: &Rc<RefCell<StageInner>>) {
    let stale = {
        let mut guard = inner.borrow_mut();
        match guard.session.as_mut() {
            Some(session) => session.pending_rescale.take(),
            None => return,
        }
    };
    if let Some(frame) = stale {
        host.cancel_frame(frame);
    }

    let frame = {
        let host2 = host.clone();
        let inner2 = Rc::clone(inner);
        host.request_frame(move || {
            if let Some(session) = inner2.borrow_mut().session.as_mut() {
                session.pending_rescale = None;
            }
            apply_rescale(&host2, &inner2);
        })
    };

    let mut guard = inner.borrow_mut();
    match guard.session.as_mut() {
        Some(session) => session.pending_rescale = Some(frame),
        // Session died between borrows; drop the orphan frame.
        None => {
            drop(guard);
            host.cancel_frame(frame);
        }
    }
}

/// Measure, fit, and write the transform. Writing a transform fires no
/// observers, so this loop converges instead of re-triggering itself.
fn apply_rescale(host: &Host, inner: &Rc<RefCell<StageInner>>) {
    let (container, root, allow_upscale, scale) = {
        let guard = inner.borrow();
        let Some(session) = &guard.session else {
            return;
        };
        (
            guard.container,
            session.root,
            guard.allow_upscale,
            guard.scale.clone(),
        )
    };

    let Some(container_size) = host.size_of(container) else {
        return;
    };
    let natural = natural_size(host, root);
    if let Some(transform) = fit_to_container(container_size, natural, allow_upscale) {
        host.set_transform(root, transform);
        scale.set(transform.scale);
    }
}

fn dimension(frontmatter: &crate::types::Frontmatter, key: &str, default: f64) -> f64 {
    frontmatter
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| *v > 0.0)
        .unwrap_or(default)
}

// =============================================================================
// Tests
// =============================================================================
