//! The declarative tree: body nodes, modifiers, and the builder.
//!
//! Nodes live in a generation-checked arena inside the reactive runtime and
//! are addressed through [`NodeRef`]. A node produced by a closure remembers
//! its computation so the renderer can rebuild it in place when the cells it
//! read change.

pub mod build;
pub mod modifier;
pub mod node;

pub use build::{build, build_here, discard_tree};
pub use modifier::Modifier;
pub use node::{
    Attributes, Body, BodyNode, Event, Handler, Handlers, IntoBody, Kind, NodeId, NodeRef, Props,
    Style, DEFAULT_TAG, SVG_NAMESPACE,
};
