//! In-memory target tree backed by a slotmap arena.

use std::collections::VecDeque;

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};

use crate::body::{Event, Handler, Props, Style};
use crate::render::Target;
use crate::value::Value;

new_key_type! {
    /// Identifier of a node in a [`MemoryTarget`].
    pub struct MemNodeId;
}

/// Data of one in-memory node.
#[derive(Debug, Clone, Default)]
struct MemNode {
    tag: String,
    namespace: Option<String>,
    /// Stringified, like DOM attributes. `style` lives in `style`.
    attributes: IndexMap<String, String>,
    style: Style,
    text: Option<String>,
    props: Props,
    handlers: IndexMap<String, Handler>,
    children: Vec<MemNodeId>,
    parent: Option<MemNodeId>,
    host: bool,
}

/// A headless [`Target`] for tests and examples.
///
/// Hosts are registered with [`add_host`](Self::add_host) and count as
/// connected; every other node is connected while a chain of parents leads
/// to a host. Clearing a node's children removes their subtrees from the
/// arena.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    nodes: SlotMap<MemNodeId, MemNode>,
    hosts: IndexMap<String, MemNodeId>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connected host node carrying `id` as its id attribute.
    pub fn add_host(&mut self, id: &str, tag: &str) -> MemNodeId {
        let mut node = MemNode {
            tag: tag.to_owned(),
            host: true,
            ..MemNode::default()
        };
        node.attributes.insert("id".to_owned(), id.to_owned());
        let key = self.nodes.insert(node);
        self.hosts.insert(id.to_owned(), key);
        key
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn namespace(&self, node: &MemNodeId) -> Option<String> {
        self.nodes.get(*node).and_then(|n| n.namespace.clone())
    }

    pub fn attribute(&self, node: &MemNodeId, name: &str) -> Option<String> {
        self.nodes
            .get(*node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    /// Ordered attribute pairs, without `style`.
    pub fn attributes(&self, node: &MemNodeId) -> Vec<(String, String)> {
        self.nodes
            .get(*node)
            .map(|n| {
                n.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn style(&self, node: &MemNodeId) -> Style {
        self.nodes
            .get(*node)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    pub fn text(&self, node: &MemNodeId) -> Option<String> {
        self.nodes.get(*node).and_then(|n| n.text.clone())
    }

    pub fn property(&self, node: &MemNodeId, name: &str) -> Option<Value> {
        self.nodes.get(*node).and_then(|n| n.props.get(name).cloned())
    }

    pub fn children(&self, node: &MemNodeId) -> Vec<MemNodeId> {
        self.nodes
            .get(*node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: &MemNodeId) -> Option<MemNodeId> {
        self.nodes.get(*node).and_then(|n| n.parent)
    }

    pub fn has_handler(&self, node: &MemNodeId, event: &str) -> bool {
        self.nodes
            .get(*node)
            .is_some_and(|n| n.handlers.contains_key(event))
    }

    /// Deliver an event to the handler installed on `node`.
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, node: &MemNodeId, event: &Event) -> bool {
        let handler = self
            .nodes
            .get(*node)
            .and_then(|n| n.handlers.get(&event.name).cloned());
        match handler {
            Some(handler) => {
                handler.call(event);
                true
            }
            None => false,
        }
    }

    /// Simulate typing: store `value` in the `value` property, then fire
    /// `input` with it.
    pub fn input(&mut self, node: &MemNodeId, value: &str) -> bool {
        self.fire_with_value(node, "input", value)
    }

    /// Like [`input`](Self::input), but fires `change` (a committed edit).
    pub fn change(&mut self, node: &MemNodeId, value: &str) -> bool {
        self.fire_with_value(node, "change", value)
    }

    fn fire_with_value(&mut self, node: &MemNodeId, event: &str, value: &str) -> bool {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.props.insert("value".to_owned(), Value::from(value));
        }
        self.dispatch(node, &Event::new(event).with_value(value))
    }

    /// Remove `node` and its descendants from the arena.
    fn remove_subtree(&mut self, node: MemNodeId) {
        let mut to_remove = VecDeque::new();
        to_remove.push_back(node);
        while let Some(current) = to_remove.pop_front() {
            if let Some(data) = self.nodes.remove(current) {
                to_remove.extend(data.children);
            }
        }
    }
}

/// Parse `a: b; c: d` into a style record.
fn parse_style(css: &str) -> Style {
    css.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_owned(), Value::from(value.trim())))
        })
        .collect()
}

impl Target for MemoryTarget {
    type Node = MemNodeId;

    fn create_node(&mut self, tag: &str, namespace: Option<&str>) -> MemNodeId {
        self.nodes.insert(MemNode {
            tag: tag.to_owned(),
            namespace: namespace.map(str::to_owned),
            ..MemNode::default()
        })
    }

    fn tag_name(&self, node: &MemNodeId) -> String {
        self.nodes
            .get(*node)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    fn attribute_names(&self, node: &MemNodeId) -> Vec<String> {
        let Some(n) = self.nodes.get(*node) else {
            return Vec::new();
        };
        let mut names: Vec<String> = n.attributes.keys().cloned().collect();
        if !n.style.is_empty() {
            names.push("style".to_owned());
        }
        names
    }

    fn set_attribute(&mut self, node: &MemNodeId, name: &str, value: &Value) {
        let Some(n) = self.nodes.get_mut(*node) else {
            return;
        };
        if name == "style" {
            n.style = parse_style(&value.to_string());
        } else {
            n.attributes.insert(name.to_owned(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: &MemNodeId, name: &str) {
        let Some(n) = self.nodes.get_mut(*node) else {
            return;
        };
        if name == "style" {
            n.style.clear();
        } else {
            n.attributes.shift_remove(name);
        }
    }

    fn clear_style(&mut self, node: &MemNodeId) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.style.clear();
        }
    }

    fn assign_style(&mut self, node: &MemNodeId, style: &Style) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.style
                .extend(style.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    fn child_count(&self, node: &MemNodeId) -> usize {
        self.nodes.get(*node).map_or(0, |n| n.children.len())
    }

    fn clear_children(&mut self, node: &MemNodeId) {
        let children = match self.nodes.get_mut(*node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn append_child(&mut self, parent: &MemNodeId, child: &MemNodeId) {
        if !self.nodes.contains_key(*parent) {
            return;
        }
        let old_parent = match self.nodes.get_mut(*child) {
            Some(c) => c.parent.replace(*parent),
            None => return,
        };
        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            old.children.retain(|c| c != child);
        }
        if let Some(p) = self.nodes.get_mut(*parent) {
            p.children.push(*child);
        }
    }

    fn set_text(&mut self, node: &MemNodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.text = Some(text.to_owned());
        }
    }

    fn set_property(&mut self, node: &MemNodeId, name: &str, value: &Value) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.props.insert(name.to_owned(), value.clone());
        }
    }

    fn attach_handler(&mut self, node: &MemNodeId, event: &str, handler: Handler) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.handlers.insert(event.to_owned(), handler);
        }
    }

    fn is_connected(&self, node: &MemNodeId) -> bool {
        let mut current = *node;
        loop {
            match self.nodes.get(current) {
                None => return false,
                Some(n) if n.host => return true,
                Some(n) => match n.parent {
                    Some(p) => current = p,
                    None => return false,
                },
            }
        }
    }

    fn find_host(&self, id: &str) -> Option<MemNodeId> {
        self.hosts
            .get(id)
            .copied()
            .filter(|key| self.nodes.contains_key(*key))
    }
}
