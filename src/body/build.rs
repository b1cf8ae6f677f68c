//! Tree building and in-place rebuilding of computation nodes.

use tracing::trace;

use super::node::{Body, BodyNode, IntoBody, NodeId, NodeRef};
use crate::reactive::runtime::{
    register_computation, tracked_call, with_runtime, ComputationId, ParentScope, Runtime,
};

/// Build `body` into a node and append it to `parent`, if given.
///
/// - text becomes a node with no kind and that text;
/// - a record is inserted as is;
/// - an already built node is moved under `parent`;
/// - a closure is registered as a computation and run with a fresh context
///   node as the ambient parent. Nodes built inside it attach to the context.
///   A closure returning [`Body::Empty`] yields the context itself; any other
///   result is built and used instead, and the context is discarded.
pub fn build(body: impl IntoBody, parent: Option<NodeRef>) -> NodeRef {
    NodeRef::from_id(build_body(body.into_body(), parent.map(NodeRef::id)))
}

/// Build `body` under the ambient parent (see
/// [`with_parent`](crate::reactive::with_parent)).
pub fn build_here(body: impl IntoBody) -> NodeRef {
    let parent = with_runtime(|rt| rt.parent);
    NodeRef::from_id(build_body(body.into_body(), parent))
}

pub(crate) fn build_body(body: Body, parent: Option<NodeId>) -> NodeId {
    let id = match body {
        Body::Empty => insert(BodyNode::new()),
        Body::Text(text) => insert(BodyNode::text(text)),
        Body::Record(node) => insert(node.detached()),
        Body::Node(node) => {
            with_runtime(|rt| detach(rt, node.id()));
            node.id()
        }
        Body::Func(f) => {
            let computation = register_computation(f);
            build_computation(computation)
        }
    };
    if let Some(parent) = parent {
        with_runtime(|rt| attach(rt, parent, id));
    }
    id
}

fn insert(node: BodyNode) -> NodeId {
    with_runtime(|rt| rt.nodes.insert(node))
}

/// Run a computation's closure and build what it returns.
///
/// Old subscriptions are dropped first so the run re-subscribes exactly the
/// cells it reads. A closure returning another closure has that closure run
/// under the same computation.
fn build_computation(computation: ComputationId) -> NodeId {
    let body_fn = with_runtime(|rt| {
        rt.clear_dependencies(computation);
        rt.computations.get(computation).map(|slot| slot.body.clone())
    });
    let Some(body_fn) = body_fn else {
        return insert(BodyNode::new());
    };

    let context = insert(BodyNode::new());
    let result = {
        let _parent = ParentScope::enter(Some(context));
        tracked_call(computation, || {
            let mut result = body_fn();
            while let Body::Func(inner) = result {
                result = inner();
            }
            result
        })
    };

    let id = match result {
        Body::Empty => context,
        Body::Node(node) if node.id() == context => context,
        other => {
            let id = build_body(other, None);
            with_runtime(|rt| discard(rt, context, None));
            id
        }
    };

    with_runtime(|rt| {
        if let Some(node) = rt.nodes.get_mut(id) {
            node.computation = Some(computation);
            node.internal_modifiers = node.modifiers.len();
        }
        if let Some(slot) = rt.computations.get_mut(computation) {
            slot.node = Some(id);
        }
    });
    trace!(?computation, node = ?id, "built computation");
    id
}

/// Re-run `computation` and splice its new node into the old node's place.
///
/// Modifiers the composing call site appended to the old node are carried
/// over after the new run's own modifiers. Returns the new node and every
/// node id removed with the old subtree. `None` when the computation is gone
/// or its node was already discarded.
pub(crate) fn rebuild(computation: ComputationId) -> Option<(NodeId, Vec<NodeId>)> {
    let (old, call_site, parent) = with_runtime(|rt| {
        let old = rt.computations.get(computation)?.node?;
        let node = rt.nodes.get(old)?;
        let call_site = node.modifiers[node.internal_modifiers.min(node.modifiers.len())..].to_vec();
        Some((old, call_site, node.parent))
    })?;

    let new = build_computation(computation);

    let removed = with_runtime(|rt| {
        if let Some(node) = rt.nodes.get_mut(new) {
            node.modifiers.extend(call_site);
            node.merged = false;
            node.parent = parent;
        }
        if let Some(slot) = parent
            .and_then(|p| rt.nodes.get_mut(p))
            .and_then(|p| p.children.iter_mut().find(|c| **c == old))
        {
            *slot = new;
        }
        if let Some(node) = rt.nodes.get_mut(old) {
            node.parent = None;
        }
        discard(rt, old, Some(computation))
    });
    Some((new, removed))
}

/// Remove a built node tree from the arena.
///
/// Returns how many nodes were removed. Use this for roots that are no
/// longer rendered.
pub fn discard_tree(node: NodeRef) -> usize {
    with_runtime(|rt| discard(rt, node.id(), None)).len()
}

// ---------------------------------------------------------------------------
// Arena helpers
// ---------------------------------------------------------------------------

fn attach(rt: &mut Runtime, parent: NodeId, child: NodeId) {
    if parent == child || !rt.nodes.contains_key(child) {
        return;
    }
    let Some(p) = rt.nodes.get_mut(parent) else {
        return;
    };
    p.children.push(child);
    if let Some(c) = rt.nodes.get_mut(child) {
        c.parent = Some(parent);
    }
}

fn detach(rt: &mut Runtime, child: NodeId) {
    let Some(parent) = rt.nodes.get_mut(child).and_then(|c| c.parent.take()) else {
        return;
    };
    if let Some(p) = rt.nodes.get_mut(parent) {
        p.children.retain(|c| *c != child);
    }
}

/// Remove `root` and its descendants, disposing every computation they
/// produced except `keep`.
pub(crate) fn discard(rt: &mut Runtime, root: NodeId, keep: Option<ComputationId>) -> Vec<NodeId> {
    detach(rt, root);
    let mut removed = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = rt.nodes.remove(id) else {
            continue;
        };
        stack.extend(node.children.iter().copied());
        if let Some(c) = node.computation.filter(|c| Some(*c) != keep) {
            rt.dispose_computation(c);
        }
        removed.push(id);
    }
    removed
}
