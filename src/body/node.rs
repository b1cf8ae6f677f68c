//! Body node types: `NodeId`, `Kind`, `BodyNode`, `NodeRef`, `Body`.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use slotmap::new_key_type;

use super::modifier::{merge_modifiers, Modifier};
use crate::reactive::runtime::{with_runtime, ComputationId};
use crate::value::Value;

new_key_type! {
    /// Arena key of a built body node. Copy, generation-checked.
    pub struct NodeId;
}

/// The SVG namespace URI.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Tag used when a child declares no kind.
pub const DEFAULT_TAG: &str = "div";

pub type Style = IndexMap<String, Value>;
pub type Attributes = IndexMap<String, Value>;
pub type Props = IndexMap<String, Value>;
pub type Handlers = IndexMap<String, Handler>;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// What kind of target node a body node requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Html(String),
    Svg(String),
    Foreign { namespace: String, tag: String },
}

impl Kind {
    pub fn html(tag: impl Into<String>) -> Self {
        Kind::Html(tag.into())
    }

    pub fn svg(tag: impl Into<String>) -> Self {
        Kind::Svg(tag.into())
    }

    pub fn foreign(namespace: impl Into<String>, tag: impl Into<String>) -> Self {
        Kind::Foreign {
            namespace: namespace.into(),
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Kind::Html(tag) | Kind::Svg(tag) | Kind::Foreign { tag, .. } => tag,
        }
    }

    /// Namespace URI, `None` for plain HTML.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Kind::Html(_) => None,
            Kind::Svg(_) => Some(SVG_NAMESPACE),
            Kind::Foreign { namespace, .. } => Some(namespace),
        }
    }
}

// ---------------------------------------------------------------------------
// Events and handlers
// ---------------------------------------------------------------------------

/// An event delivered to a handler by the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Event name without the `on` prefix, e.g. `"click"`.
    pub name: String,
    /// Current value of the node that fired, for input-like nodes.
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A shared event handler.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

// ---------------------------------------------------------------------------
// BodyNode
// ---------------------------------------------------------------------------

/// One node of the declarative tree.
///
/// Public fields describe what the node renders. Children, the pending
/// modifier list and the tree links are managed by the builder.
#[derive(Debug, Clone, Default)]
pub struct BodyNode {
    /// Required target kind. `None` renders into whatever node it is given,
    /// or a `div` when created as a child.
    pub kind: Option<Kind>,
    pub text: Option<String>,
    pub style: Option<Style>,
    pub attributes: Option<Attributes>,
    pub handlers: Handlers,
    /// Escape hatch for target properties without a typed field.
    pub props: Props,
    pub(crate) children: Vec<NodeId>,
    pub(crate) modifiers: Vec<Modifier>,
    /// Modifiers appended while the producing computation ran; the rest were
    /// appended by the composing call site.
    pub(crate) internal_modifiers: usize,
    pub(crate) merged: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) computation: Option<ComputationId>,
}

impl BodyNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node with no kind and the given text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            kind: Some(Kind::html(tag)),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_style<K, V>(mut self, style: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.style = Some(collect_record(style));
        self
    }

    pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.attributes = Some(collect_record(attributes));
        self
    }

    pub fn with_handler(mut self, event: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.handlers.insert(event.into(), Handler::new(f));
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Shallow-assign a fragment onto this node right away.
    ///
    /// Unlike a modifier, a present `style` or `attributes` record replaces the
    /// node's record instead of being merged into it.
    pub fn assign(&mut self, fragment: Modifier) {
        if fragment.style.is_some() {
            self.style = fragment.style;
        }
        if fragment.attributes.is_some() {
            self.attributes = fragment.attributes;
        }
        if fragment.text.is_some() {
            self.text = fragment.text;
        }
        self.handlers.extend(fragment.handlers);
        self.props.extend(fragment.props);
    }

    /// Reset builder-managed state so a user-supplied record can enter the arena.
    pub(crate) fn detached(mut self) -> Self {
        self.children.clear();
        self.modifiers.clear();
        self.internal_modifiers = 0;
        self.merged = false;
        self.parent = None;
        self.computation = None;
        self
    }
}

pub(crate) fn collect_record<K, V>(items: impl IntoIterator<Item = (K, V)>) -> IndexMap<String, Value>
where
    K: Into<String>,
    V: Into<Value>,
{
    items
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Anything the tree builder accepts.
#[derive(Clone, Default)]
pub enum Body {
    /// An empty node, or, returned from a computation, "use what I built".
    #[default]
    Empty,
    Text(String),
    Record(BodyNode),
    /// An already built node; building it again moves it.
    Node(NodeRef),
    /// A computation.
    Func(Rc<dyn Fn() -> Body>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Body::Record(r) => f.debug_tuple("Record").field(r).finish(),
            Body::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Body::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Conversion into a [`Body`].
pub trait IntoBody {
    fn into_body(self) -> Body;
}

impl IntoBody for Body {
    fn into_body(self) -> Body {
        self
    }
}

impl IntoBody for () {
    fn into_body(self) -> Body {
        Body::Empty
    }
}

impl IntoBody for &str {
    fn into_body(self) -> Body {
        Body::Text(self.to_owned())
    }
}

impl IntoBody for String {
    fn into_body(self) -> Body {
        Body::Text(self)
    }
}

impl IntoBody for BodyNode {
    fn into_body(self) -> Body {
        Body::Record(self)
    }
}

impl IntoBody for NodeRef {
    fn into_body(self) -> Body {
        Body::Node(self)
    }
}

impl<B: IntoBody> IntoBody for Option<B> {
    fn into_body(self) -> Body {
        self.map_or(Body::Empty, IntoBody::into_body)
    }
}

impl<F, R> IntoBody for F
where
    F: Fn() -> R + 'static,
    R: IntoBody,
{
    fn into_body(self) -> Body {
        Body::Func(Rc::new(move || self().into_body()))
    }
}

// ---------------------------------------------------------------------------
// NodeRef
// ---------------------------------------------------------------------------

/// Handle to a built body node. Carries the modifier chain.
///
/// Every method is a no-op (or returns `None`) once the node was discarded by
/// a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(NodeId);

impl NodeRef {
    pub(crate) fn from_id(id: NodeId) -> Self {
        Self(id)
    }

    pub fn id(self) -> NodeId {
        self.0
    }

    fn update(self, f: impl FnOnce(&mut BodyNode)) -> Self {
        with_runtime(|rt| {
            if let Some(node) = rt.nodes.get_mut(self.0) {
                f(node);
            }
        });
        self
    }

    /// Read a snapshot of the node's current data.
    ///
    /// `f` runs on a copy taken outside the runtime, so it may read signals
    /// and other nodes.
    pub fn with<R>(self, f: impl FnOnce(&BodyNode) -> R) -> Option<R> {
        let node = with_runtime(|rt| rt.nodes.get(self.0).cloned())?;
        Some(f(&node))
    }

    fn read<R>(self, f: impl FnOnce(&BodyNode) -> R) -> Option<R> {
        with_runtime(|rt| rt.nodes.get(self.0).map(f))
    }

    // -- modifier chain -----------------------------------------------------

    /// Append a fragment to the pending modifiers. Empty fragments are ignored.
    pub fn modify(self, fragment: Modifier) -> Self {
        if fragment.is_empty() {
            return self;
        }
        self.update(|node| node.modifiers.push(fragment))
    }

    pub fn set_style<K, V>(self, style: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.modify(Modifier::style(style))
    }

    pub fn set_attributes<K, V>(self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.modify(Modifier::attributes(attributes))
    }

    pub fn set_handlers<K>(self, handlers: impl IntoIterator<Item = (K, Handler)>) -> Self
    where
        K: Into<String>,
    {
        self.modify(Modifier::handlers(handlers))
    }

    /// Append a single handler modifier.
    pub fn on(self, event: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.modify(Modifier::handler(event, f))
    }

    /// Fold pending modifiers into the node now. Rendering does this anyway;
    /// merging happens at most once per node.
    pub fn apply_modifiers(self) -> Self {
        self.update(merge_modifiers)
    }

    // -- direct assignment --------------------------------------------------

    /// Shallow-assign a fragment right away (see [`BodyNode::assign`]).
    pub fn assign(self, fragment: Modifier) -> Self {
        self.update(|node| node.assign(fragment))
    }

    pub fn set_kind(self, kind: Kind) -> Self {
        self.update(|node| node.kind = Some(kind))
    }

    // -- accessors ----------------------------------------------------------

    /// Whether the node is still in the arena.
    pub fn is_live(self) -> bool {
        with_runtime(|rt| rt.nodes.contains_key(self.0))
    }

    pub fn kind(self) -> Option<Kind> {
        self.read(|n| n.kind.clone()).flatten()
    }

    pub fn text(self) -> Option<String> {
        self.read(|n| n.text.clone()).flatten()
    }

    pub fn style(self) -> Option<Style> {
        self.read(|n| n.style.clone()).flatten()
    }

    pub fn attributes(self) -> Option<Attributes> {
        self.read(|n| n.attributes.clone()).flatten()
    }

    pub fn prop(self, name: &str) -> Option<Value> {
        self.read(|n| n.props.get(name).cloned()).flatten()
    }

    pub fn handler(self, event: &str) -> Option<Handler> {
        self.read(|n| n.handlers.get(event).cloned()).flatten()
    }

    pub fn children(self) -> Vec<NodeRef> {
        self.read(|n| n.children.iter().copied().map(NodeRef).collect())
            .unwrap_or_default()
    }

    pub fn parent(self) -> Option<NodeRef> {
        self.read(|n| n.parent).flatten().map(NodeRef)
    }

    /// The computation that produced this node, if any.
    pub fn computation(self) -> Option<ComputationId> {
        self.read(|n| n.computation).flatten()
    }

    /// Number of pending (appended) modifiers.
    pub fn modifier_count(self) -> usize {
        self.read(|n| n.modifiers.len()).unwrap_or(0)
    }
}
