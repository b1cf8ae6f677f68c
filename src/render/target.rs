//! The live tree the renderer projects body nodes onto.

use std::fmt;

use crate::body::{Handler, Style};
use crate::value::Value;

/// A mutable tree of typed nodes with attributes, inline style and children.
///
/// Node handles are cheap to clone and compare by identity. The renderer
/// never holds a borrow of the target across calls into user code.
pub trait Target {
    type Node: Clone + PartialEq + fmt::Debug;

    /// Create a detached node. `namespace` is `None` for plain HTML.
    fn create_node(&mut self, tag: &str, namespace: Option<&str>) -> Self::Node;

    fn tag_name(&self, node: &Self::Node) -> String;

    /// Names of the attributes currently set, `style` included when the
    /// node has inline style.
    fn attribute_names(&self, node: &Self::Node) -> Vec<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &Value);

    /// Remove an attribute. Removing `style` clears the inline style.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn clear_style(&mut self, node: &Self::Node);

    /// Assign the given properties onto the inline style, keeping others.
    fn assign_style(&mut self, node: &Self::Node, style: &Style);

    fn child_count(&self, node: &Self::Node) -> usize;

    /// Drop every child of `node`.
    fn clear_children(&mut self, node: &Self::Node);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn set_property(&mut self, node: &Self::Node, name: &str, value: &Value);

    /// Install `handler` for `event`, replacing a previous one.
    fn attach_handler(&mut self, node: &Self::Node, event: &str, handler: Handler);

    /// Whether the node is still attached to a parent (or is a host).
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Look up a host node by its id.
    fn find_host(&self, id: &str) -> Option<Self::Node>;
}
