//! Rendering: the [`Target`] collaborator and the reconciling [`Renderer`].

pub mod reconcile;
pub mod target;

pub use reconcile::{FlushReport, RenderError, Renderer};
pub use target::Target;
