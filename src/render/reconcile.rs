//! The renderer: projects body nodes onto a [`Target`] and re-renders
//! invalidated computations on each frame.

use slotmap::SecondaryMap;
use tracing::{debug, trace, warn};

use super::target::Target;
use crate::body::build::{build_body, discard, rebuild};
use crate::body::modifier::merge_modifiers;
use crate::body::node::{
    Attributes, Body, Handlers, IntoBody, Kind, NodeId, NodeRef, Props, Style, DEFAULT_TAG,
};
use crate::reactive::runtime::{produced_node, with_runtime, ComputationId};
use crate::reactive::scheduler;

/// Errors raised while rendering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The body node declares a tag other than the target node's.
    #[error("unexpected element type mismatch: expected <{expected}>, found <{found}>")]
    KindMismatch { expected: String, found: String },
    /// The body node was discarded.
    #[error("body node is no longer alive")]
    UnknownNode,
}

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Computations rebuilt and re-rendered.
    pub rebuilt: usize,
    /// Computations skipped because they were disposed, never rendered, or
    /// their target node is no longer connected.
    pub skipped: usize,
}

/// What one body node asks of its target node, copied out of the arena.
struct RenderPlan {
    kind: Option<Kind>,
    text: Option<String>,
    style: Option<Style>,
    attributes: Option<Attributes>,
    handlers: Handlers,
    props: Props,
    children: Vec<(NodeId, Option<Kind>)>,
}

impl RenderPlan {
    /// Merge pending modifiers and snapshot the node. `None` if discarded.
    fn take(id: NodeId) -> Option<Self> {
        with_runtime(|rt| {
            let node = rt.nodes.get_mut(id)?;
            merge_modifiers(node);
            let node = &rt.nodes[id];
            let children = node
                .children
                .iter()
                .map(|c| (*c, rt.nodes.get(*c).and_then(|n| n.kind.clone())))
                .collect();
            Some(Self {
                kind: node.kind.clone(),
                text: node.text.clone(),
                style: node.style.clone(),
                attributes: node.attributes.clone(),
                handlers: node.handlers.clone(),
                props: node.props.clone(),
                children,
            })
        })
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        scheduler::end_flush();
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Owns a target tree and the binding from body nodes to target nodes.
pub struct Renderer<T: Target> {
    target: T,
    bindings: SecondaryMap<NodeId, T::Node>,
    roots: Vec<(T::Node, NodeId)>,
}

impl<T: Target> Renderer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            bindings: SecondaryMap::new(),
            roots: Vec::new(),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// The target node a body node was last rendered into.
    pub fn bound_target(&self, node: NodeRef) -> Option<&T::Node> {
        self.bindings.get(node.id())
    }

    /// Number of live body → target bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Render `body` into `host`.
    ///
    /// An already built node is rendered as is; anything else is built first.
    /// A different body previously rendered into `host` is discarded.
    pub fn render(&mut self, host: &T::Node, body: impl IntoBody) -> Result<NodeRef, RenderError> {
        let id = match body.into_body() {
            Body::Node(node) => node.id(),
            other => build_body(other, None),
        };

        if let Some(pos) = self.roots.iter().position(|(h, _)| h == host) {
            let (_, previous) = self.roots.remove(pos);
            if previous != id {
                self.discard(previous);
            }
        }
        self.roots.push((host.clone(), id));

        self.render_node(host, id)?;
        Ok(NodeRef::from_id(id))
    }

    /// Re-run every pending computation and re-render its node in place.
    ///
    /// The pending set is snapshotted first; writes made while flushing are
    /// left for the next flush. On error the unprocessed rest of the batch is
    /// queued again.
    pub fn flush(&mut self) -> Result<FlushReport, RenderError> {
        let batch = scheduler::begin_flush();
        let mut report = FlushReport::default();
        let mut remaining = batch.into_iter();
        let result = {
            let _guard = FlushGuard;
            loop {
                let Some(computation) = remaining.next() else {
                    break Ok(());
                };
                match self.flush_one(computation) {
                    Ok(true) => report.rebuilt += 1,
                    Ok(false) => report.skipped += 1,
                    Err(err) => break Err(err),
                }
            }
        };

        match result {
            Ok(()) => {
                if report != FlushReport::default() {
                    debug!(rebuilt = report.rebuilt, skipped = report.skipped, "flushed");
                }
                Ok(report)
            }
            Err(err) => {
                let rest: Vec<_> = remaining.collect();
                warn!(error = %err, requeued = rest.len(), "flush aborted");
                if !rest.is_empty() {
                    scheduler::queue(rest);
                }
                Err(err)
            }
        }
    }

    /// Flush only if a frame is armed. Returns `None` when there was nothing
    /// to do.
    pub fn run_frame(&mut self) -> Result<Option<FlushReport>, RenderError> {
        if !scheduler::frame_armed() {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    fn flush_one(&mut self, computation: ComputationId) -> Result<bool, RenderError> {
        let Some(old) = produced_node(computation) else {
            debug!(?computation, "skipping disposed computation");
            return Ok(false);
        };
        let Some(host) = self.bindings.get(old.id()).cloned() else {
            debug!(?computation, "skipping unrendered computation");
            return Ok(false);
        };
        if !self.target.is_connected(&host) {
            debug!(?computation, "skipping disconnected target");
            self.bindings.remove(old.id());
            return Ok(false);
        }
        let Some((new, removed)) = rebuild(computation) else {
            return Ok(false);
        };
        for id in removed {
            self.bindings.remove(id);
        }
        for root in &mut self.roots {
            if root.1 == old.id() {
                root.1 = new;
            }
        }
        self.render_node(&host, new)?;
        Ok(true)
    }

    fn discard(&mut self, root: NodeId) {
        for id in with_runtime(|rt| discard(rt, root, None)) {
            self.bindings.remove(id);
        }
    }

    fn render_node(&mut self, el: &T::Node, id: NodeId) -> Result<(), RenderError> {
        let plan = RenderPlan::take(id).ok_or(RenderError::UnknownNode)?;

        if let Some(kind) = &plan.kind {
            let found = self.target.tag_name(el);
            if !found.eq_ignore_ascii_case(kind.tag()) {
                return Err(RenderError::KindMismatch {
                    expected: kind.tag().to_owned(),
                    found,
                });
            }
        }
        self.bindings.insert(id, el.clone());

        if let Some(attributes) = &plan.attributes {
            for (name, value) in attributes {
                self.target.set_attribute(el, name, value);
            }
            for extra in self.target.attribute_names(el) {
                if !attributes.contains_key(&extra) {
                    self.target.remove_attribute(el, &extra);
                }
            }
        }

        // Without declared attributes the old inline style is dropped first;
        // with them it is only dropped if the attribute pass removed it.
        if let Some(style) = &plan.style {
            if plan.attributes.is_none() {
                self.target.clear_style(el);
            }
            self.target.assign_style(el, style);
        }

        if self.target.child_count(el) > 0 {
            self.target.clear_children(el);
        }

        if let Some(text) = &plan.text {
            self.target.set_text(el, text);
        }
        for (name, value) in &plan.props {
            self.target.set_property(el, name, value);
        }
        for (event, handler) in plan.handlers {
            self.target.attach_handler(el, &event, handler);
        }

        for (child, kind) in plan.children {
            let child_el = match &kind {
                Some(kind) => self.target.create_node(kind.tag(), kind.namespace()),
                None => self.target.create_node(DEFAULT_TAG, None),
            };
            trace!(node = ?child, "created target node");
            self.target.append_child(el, &child_el);
            self.render_node(&child_el, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::build::{build, build_here};
    use crate::body::modifier::Modifier;
    use crate::body::node::{BodyNode, Event};
    use crate::reactive::runtime::reset_runtime;
    use crate::reactive::scheduler::{pending_count, scheduler_state, SchedulerState};
    use crate::reactive::Signal;
    use crate::testing::snapshot::tree_to_string;
    use crate::testing::MemoryTarget;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> (Renderer<MemoryTarget>, <MemoryTarget as Target>::Node) {
        reset_runtime();
        let mut target = MemoryTarget::new();
        let host = target.add_host("app", "div");
        (Renderer::new(target), host)
    }

    #[test]
    fn renders_children_with_default_tag() {
        let (mut r, host) = setup();
        r.render(&host, || {
            build_here("hello");
            build_here(BodyNode::element("span").with_text("world"));
        })
        .unwrap();
        assert_eq!(
            tree_to_string(r.target(), &host),
            "<div id=\"app\">\n  <div>hello</div>\n  <span>world</span>\n</div>"
        );
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let (mut r, host) = setup();
        let err = r.render(&host, BodyNode::element("SPAN")).unwrap_err();
        assert_eq!(
            err,
            RenderError::KindMismatch {
                expected: "SPAN".into(),
                found: "div".into()
            }
        );
        // Case-insensitive match passes.
        r.render(&host, BodyNode::element("DIV")).unwrap();
    }

    #[test]
    fn attributes_are_an_exact_set() {
        let (mut r, host) = setup();
        r.target_mut().set_attribute(&host, "title", &Value::from("old"));
        r.render(&host, BodyNode::new().with_attributes([("id", "app"), ("lang", "en")]))
            .unwrap();
        assert_eq!(r.target().attribute_names(&host), vec!["id", "lang"]);
    }

    #[test]
    fn style_without_attributes_replaces_inline_style() {
        let (mut r, host) = setup();
        r.target_mut()
            .assign_style(&host, &[("margin".to_owned(), Value::from("0"))].into_iter().collect());
        r.render(&host, BodyNode::new().with_style([("color", "red")]))
            .unwrap();
        let style = r.target().style(&host);
        assert_eq!(style.keys().collect::<Vec<_>>(), vec!["color"]);
    }

    #[test]
    fn style_with_attributes_merges_into_inline_style() {
        let (mut r, host) = setup();
        r.target_mut()
            .assign_style(&host, &[("margin".to_owned(), Value::from("0"))].into_iter().collect());
        r.render(
            &host,
            BodyNode::new()
                .with_attributes([("id", "app"), ("style", "")])
                .with_style([("color", "red")]),
        )
        .unwrap();
        let style = r.target().style(&host);
        assert_eq!(style.len(), 1);
        assert_eq!(style["color"], Value::from("red"));

        // Attributes declared without "style": the attribute pass drops it.
        let (mut r, host) = setup();
        r.target_mut()
            .assign_style(&host, &[("margin".to_owned(), Value::from("0"))].into_iter().collect());
        r.render(&host, BodyNode::new().with_attributes([("id", "app")]))
            .unwrap();
        assert!(r.target().style(&host).is_empty());
    }

    #[test]
    fn absent_style_leaves_inline_style() {
        let (mut r, host) = setup();
        r.target_mut()
            .assign_style(&host, &[("margin".to_owned(), Value::from("0"))].into_iter().collect());
        r.render(&host, BodyNode::new().with_text("x")).unwrap();
        assert_eq!(r.target().style(&host).len(), 1);
    }

    #[test]
    fn modifiers_merge_in_order_at_render() {
        let (mut r, host) = setup();
        let node = build(BodyNode::new(), None)
            .set_style([("color", "red")])
            .set_style([("color", "blue"), ("margin", "0")]);
        r.render(&host, node).unwrap();
        let style = r.target().style(&host);
        assert_eq!(style["color"], Value::from("blue"));
        assert_eq!(style["margin"], Value::from("0"));
    }

    #[test]
    fn handlers_and_props_are_attached() {
        let (mut r, host) = setup();
        let clicks = Rc::new(Cell::new(0));
        let node = {
            let clicks = clicks.clone();
            build(
                BodyNode::new().with_prop("tabIndex", 0),
                None,
            )
            .modify(Modifier::handler("click", move |_| clicks.set(clicks.get() + 1)))
        };
        r.render(&host, node).unwrap();
        assert_eq!(r.target().property(&host, "tabIndex"), Some(Value::from(0)));
        r.target().dispatch(&host, &Event::new("click"));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn flush_rebuilds_only_invalidated_nodes() {
        let (mut r, host) = setup();
        let a = Signal::new(Value::from("a"));
        let b = Signal::new(Value::from("b"));
        let runs = Rc::new(Cell::new(0));
        {
            let (a, b, runs) = (a.clone(), b.clone(), runs.clone());
            r.render(&host, move || {
                let a = a.clone();
                let runs = runs.clone();
                build_here(move || {
                    runs.set(runs.get() + 1);
                    a.get().to_string()
                });
                let b = b.clone();
                build_here(move || b.get().to_string());
            })
            .unwrap();
        }
        assert_eq!(runs.get(), 1);

        a.set(Value::from("x"));
        a.set(Value::from("y"));
        assert_eq!(scheduler_state(), SchedulerState::Pending);
        let report = r.run_frame().unwrap().unwrap();
        assert_eq!(report, FlushReport { rebuilt: 1, skipped: 0 });
        assert_eq!(runs.get(), 2);
        assert_eq!(
            tree_to_string(r.target(), &host),
            "<div id=\"app\">\n  <div>y</div>\n  <div>b</div>\n</div>"
        );
        assert_eq!(r.run_frame().unwrap(), None);
    }

    #[test]
    fn flush_skips_disconnected_targets() {
        let (mut r, host) = setup();
        let label = Signal::new(Value::from("a"));
        let node = {
            let label = label.clone();
            r.render(&host, move || {
                let label = label.clone();
                build_here(move || label.get().to_string());
            })
            .unwrap()
        };
        let child = node.children()[0];
        let child_el = r.bound_target(child).cloned().unwrap();
        r.target_mut().clear_children(&host);
        assert!(!r.target().is_connected(&child_el));

        label.set(Value::from("b"));
        let report = r.flush().unwrap();
        assert_eq!(report, FlushReport { rebuilt: 0, skipped: 1 });
        assert_eq!(r.bound_target(child), None);
    }

    #[test]
    fn flush_error_requeues_the_rest() {
        let (mut r, host) = setup();
        let bad = Signal::new(false);
        let other = Signal::new(0);
        {
            let (bad, other) = (bad.clone(), other.clone());
            r.render(&host, move || {
                let bad = bad.clone();
                build_here(move || {
                    if bad.get() {
                        BodyNode::element("span")
                    } else {
                        BodyNode::new()
                    }
                });
                let other = other.clone();
                build_here(move || other.get().to_string());
            })
            .unwrap();
        }
        bad.set(true);
        other.set(1);
        let err = r.flush().unwrap_err();
        assert!(matches!(err, RenderError::KindMismatch { .. }));
        assert_eq!(pending_count(), 1);
        assert_eq!(scheduler_state(), SchedulerState::Pending);
    }

    #[test]
    fn writes_during_flush_go_to_next_frame() {
        let (mut r, host) = setup();
        let count = Signal::new(0);
        let echo = Signal::new(0);
        {
            let (count, echo) = (count.clone(), echo.clone());
            r.render(&host, move || {
                let (count, echo_w) = (count.clone(), echo.clone());
                build_here(move || {
                    let n = count.get();
                    echo_w.set(n);
                    n.to_string()
                });
                let echo = echo.clone();
                build_here(move || echo.get().to_string());
            })
            .unwrap();
        }
        count.set(5);
        let first = r.flush().unwrap();
        assert_eq!(first.rebuilt, 1);
        assert_eq!(pending_count(), 1);
        r.flush().unwrap();
        assert_eq!(
            tree_to_string(r.target(), &host),
            "<div id=\"app\">\n  <div>5</div>\n  <div>5</div>\n</div>"
        );
    }

    #[test]
    fn rendering_a_new_root_discards_the_old_one() {
        let (mut r, host) = setup();
        let first = r.render(&host, || {
            build_here("a");
        })
        .unwrap();
        r.render(&host, "b").unwrap();
        assert!(!first.is_live());
        assert_eq!(r.binding_count(), 1);
    }
}
