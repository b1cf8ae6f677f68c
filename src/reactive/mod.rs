//! Reactive state: signals, sequences, the tracked call context, the scheduler.
//!
//! - [`Signal`] — a reactive cell that subscribes the running computation on read.
//! - [`Sequence`] — per-index and length reactivity over a vector.
//! - [`Binding`] — a getter/setter cell; computed when it has no setter.
//! - [`SignalRecord`] — a keyed record of signals, sequences and bindings.
//! - [`tracked_call`] — run a closure as the current computation.
//! - [`queue`] / [`FrameClock`] — frame-aligned batching of invalidations.

pub mod binding;
pub mod record;
pub mod runtime;
pub mod scheduler;
pub mod sequence;
pub mod signal;

pub use binding::{binding, Binding, ReadOnlyBinding};
pub use record::{Field, RecordError, SignalRecord, CELLS_KEY};
pub use runtime::{
    current_computation, current_parent, dependency_count, dispose_computation, is_alive,
    produced_node, tracked_call, untracked, with_parent, ComputationId,
};
pub use scheduler::{
    frame_armed, pending_count, queue, scheduler_state, set_frame_clock, FrameClock,
    FrameRequest, ManualClock, NotifyClock, SchedulerState,
};
pub use sequence::{Sequence, SequenceError, SequenceKey};
pub use signal::{create_signal, Signal, SignalBuilder, SignalValue};
