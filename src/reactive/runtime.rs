//! Thread-local reactive runtime and the tracked call context.
//!
//! The runtime owns two generation-checked arenas: registered computations and
//! built body nodes. Two ambient slots live next to them: the computation that
//! is currently running (so signal reads can subscribe it) and the body node
//! that is currently collecting children. Both slots are entered through scope
//! guards that restore the previous value on every exit path, unwinding
//! included.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

use super::scheduler::Scheduler;
use crate::body::node::{Body, BodyNode, NodeId, NodeRef};

new_key_type! {
    /// Handle of a registered computation. Copy, generation-checked.
    pub struct ComputationId;
}

/// Something a computation can be subscribed to.
pub(crate) trait Source {
    fn unsubscribe(&self, id: ComputationId);
}

pub(crate) type BodyFn = Rc<dyn Fn() -> Body>;

pub(crate) struct ComputationSlot {
    pub(crate) body: BodyFn,
    /// Sources read during the last run. Cleared before every re-run.
    pub(crate) dependencies: Vec<Weak<dyn Source>>,
    /// The node produced by the last run.
    pub(crate) node: Option<NodeId>,
}

pub(crate) struct Runtime {
    pub(crate) computations: SlotMap<ComputationId, ComputationSlot>,
    pub(crate) nodes: SlotMap<NodeId, BodyNode>,
    pub(crate) tracking: Option<ComputationId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) scheduler: Scheduler,
}

impl Runtime {
    fn new() -> Self {
        Self {
            computations: SlotMap::with_key(),
            nodes: SlotMap::with_key(),
            tracking: None,
            parent: None,
            scheduler: Scheduler::new(),
        }
    }

    /// Drop every subscription `id` holds.
    pub(crate) fn clear_dependencies(&mut self, id: ComputationId) {
        let Some(slot) = self.computations.get_mut(id) else {
            return;
        };
        for dep in slot.dependencies.drain(..) {
            if let Some(source) = dep.upgrade() {
                source.unsubscribe(id);
            }
        }
    }

    /// Unsubscribe and forget a computation. Queued ids of disposed
    /// computations are skipped at flush time.
    pub(crate) fn dispose_computation(&mut self, id: ComputationId) {
        self.clear_dependencies(id);
        self.computations.remove(id);
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

pub(crate) fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> R {
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

// ---------------------------------------------------------------------------
// Computations
// ---------------------------------------------------------------------------

pub(crate) fn register_computation(body: BodyFn) -> ComputationId {
    with_runtime(|rt| {
        rt.computations.insert(ComputationSlot {
            body,
            dependencies: Vec::new(),
            node: None,
        })
    })
}

pub(crate) fn add_dependency(id: ComputationId, source: Weak<dyn Source>) {
    with_runtime(|rt| {
        if let Some(slot) = rt.computations.get_mut(id) {
            slot.dependencies.push(source);
        }
    });
}

/// Whether `id` still refers to a live computation.
pub fn is_alive(id: ComputationId) -> bool {
    with_runtime(|rt| rt.computations.contains_key(id))
}

/// The body node produced by the last run of `id`.
pub fn produced_node(id: ComputationId) -> Option<NodeRef> {
    with_runtime(|rt| rt.computations.get(id).and_then(|slot| slot.node))
        .map(NodeRef::from_id)
}

/// Number of cells the computation read during its last run.
pub fn dependency_count(id: ComputationId) -> usize {
    with_runtime(|rt| {
        rt.computations
            .get(id)
            .map_or(0, |slot| slot.dependencies.len())
    })
}

/// Stop a computation from ever re-running.
pub fn dispose_computation(id: ComputationId) {
    with_runtime(|rt| rt.dispose_computation(id));
}

// ---------------------------------------------------------------------------
// Tracked call context
// ---------------------------------------------------------------------------

struct TrackingScope {
    prev: Option<ComputationId>,
}

impl TrackingScope {
    fn enter(next: Option<ComputationId>) -> Self {
        let prev = with_runtime(|rt| std::mem::replace(&mut rt.tracking, next));
        Self { prev }
    }
}

impl Drop for TrackingScope {
    fn drop(&mut self) {
        let prev = self.prev;
        let _ = RUNTIME.try_with(|rt| {
            if let Ok(mut rt) = rt.try_borrow_mut() {
                rt.tracking = prev;
            }
        });
    }
}

/// Run `f` with `computation` as the current computation.
///
/// Signal reads inside `f` subscribe `computation`. The previous current
/// computation is restored when `f` returns or unwinds.
pub fn tracked_call<R>(computation: ComputationId, f: impl FnOnce() -> R) -> R {
    let _scope = TrackingScope::enter(Some(computation));
    f()
}

/// Run `f` with no current computation.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _scope = TrackingScope::enter(None);
    f()
}

/// The computation currently running, if any.
pub fn current_computation() -> Option<ComputationId> {
    with_runtime(|rt| rt.tracking)
}

// ---------------------------------------------------------------------------
// Ambient parent
// ---------------------------------------------------------------------------

pub(crate) struct ParentScope {
    prev: Option<NodeId>,
}

impl ParentScope {
    pub(crate) fn enter(next: Option<NodeId>) -> Self {
        let prev = with_runtime(|rt| std::mem::replace(&mut rt.parent, next));
        Self { prev }
    }
}

impl Drop for ParentScope {
    fn drop(&mut self) {
        let prev = self.prev;
        let _ = RUNTIME.try_with(|rt| {
            if let Ok(mut rt) = rt.try_borrow_mut() {
                rt.parent = prev;
            }
        });
    }
}

/// Run `f` with `parent` collecting the nodes built inside it.
pub fn with_parent<R>(parent: NodeRef, f: impl FnOnce() -> R) -> R {
    let _scope = ParentScope::enter(Some(parent.id()));
    f()
}

/// The node currently collecting children, if any.
pub fn current_parent() -> Option<NodeRef> {
    with_runtime(|rt| rt.parent).map(NodeRef::from_id)
}

// ---------------------------------------------------------------------------
// Test helper: reset the thread-local runtime between tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn reset_runtime() {
    RUNTIME.with(|rt| {
        *rt.borrow_mut() = Runtime::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn setup() {
        reset_runtime();
    }

    fn dummy() -> ComputationId {
        register_computation(Rc::new(|| Body::Empty))
    }

    #[test]
    fn tracked_call_sets_and_restores() {
        setup();
        let id = dummy();
        assert_eq!(current_computation(), None);
        let seen = tracked_call(id, current_computation);
        assert_eq!(seen, Some(id));
        assert_eq!(current_computation(), None);
    }

    #[test]
    fn nested_calls_attribute_to_innermost() {
        setup();
        let outer = dummy();
        let inner = dummy();
        tracked_call(outer, || {
            assert_eq!(current_computation(), Some(outer));
            tracked_call(inner, || {
                assert_eq!(current_computation(), Some(inner));
            });
            assert_eq!(current_computation(), Some(outer));
        });
    }

    #[test]
    fn restored_after_panic() {
        setup();
        let outer = dummy();
        let inner = dummy();
        tracked_call(outer, || {
            let result = catch_unwind(AssertUnwindSafe(|| {
                tracked_call(inner, || panic!("boom"));
            }));
            assert!(result.is_err());
            assert_eq!(current_computation(), Some(outer));
        });
        assert_eq!(current_computation(), None);
    }

    #[test]
    fn untracked_clears_slot() {
        setup();
        let id = dummy();
        tracked_call(id, || {
            untracked(|| assert_eq!(current_computation(), None));
            assert_eq!(current_computation(), Some(id));
        });
    }

    #[test]
    fn dispose_forgets_computation() {
        setup();
        let id = dummy();
        assert!(is_alive(id));
        dispose_computation(id);
        assert!(!is_alive(id));
        assert!(produced_node(id).is_none());
    }
}
