//! # tiny-ui
//!
//! A fine-grained reactive UI engine: a dependency-tracked state cell, a
//! declarative tree builder, a frame-batched scheduler, and a renderer that
//! reconciles body nodes onto any mutable tree of typed nodes.
//!
//! Closures passed to the builder become computations. Every [`Signal`] a
//! computation reads subscribes it; a later write queues just those
//! computations, and the next frame rebuilds and re-renders only the nodes
//! they produced.
//!
//! ## Core Systems
//!
//! - **[`value`]**: dynamic values with JavaScript-like coercion
//! - **[`reactive`]**: signals, sequences, bindings, keyed records, the tracked call context,
//!   the scheduler
//! - **[`body`]**: body nodes, modifiers, tree building
//! - **[`render`]**: the `Target` trait and the reconciling `Renderer`
//! - **[`widgets`]**: HTML and SVG builders
//! - **[`units`]**: CSS length helpers
//! - **[`app`]**: host lookup and the tokio frame loop
//! - **[`testing`]**: in-memory target and snapshot printer

// Foundation
pub mod value;

// Reactivity and the tree
pub mod body;
pub mod reactive;

// Rendering
pub mod render;

// Builders
pub mod units;
pub mod widgets;

// Application
pub mod app;

// Headless testing support
pub mod testing;

pub use app::{App, AppConfig, AppError};
pub use body::{build, build_here, BodyNode, Event, IntoBody, Kind, Modifier, NodeRef};
pub use reactive::{
    create_signal, tracked_call, untracked, with_parent, Binding, Sequence, Signal, SignalRecord,
};
pub use render::{FlushReport, RenderError, Renderer, Target};
pub use value::Value;
