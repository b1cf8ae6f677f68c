//! Frame-aligned batching of invalidated computations.
//!
//! Writes queue their subscribers here. Queueing arms exactly one frame on the
//! installed [`FrameClock`], cancelling whatever frame was armed before, so a
//! burst of writes inside one tick produces a single flush. The flush itself
//! is driven by [`Renderer::flush`](crate::render::Renderer::flush), which
//! takes a snapshot of the pending set through [`begin_flush`].

use std::cell::Cell as StdCell;
use std::rc::Rc;

use indexmap::IndexSet;
use tokio::sync::Notify;
use tracing::trace;

use super::runtime::{with_runtime, ComputationId};

/// Token for one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// The host's "run once before the next paint" primitive.
///
/// Implementations must not touch the reactive runtime from these methods.
pub trait FrameClock {
    /// Request a frame callback.
    fn request_frame(&self) -> FrameRequest;
    /// Cancel a previously requested, not yet delivered frame.
    fn cancel_frame(&self, request: FrameRequest);
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing pending, no frame armed.
    Idle,
    /// A frame is armed and computations are waiting for it.
    Pending,
    /// A flush is in progress.
    Flushing,
}

pub(crate) struct Scheduler {
    pending: IndexSet<ComputationId>,
    armed: Option<FrameRequest>,
    flushing: bool,
    clock: Rc<dyn FrameClock>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self {
            pending: IndexSet::new(),
            armed: None,
            flushing: false,
            clock: Rc::new(ManualClock::new()),
        }
    }

    fn queue(&mut self, computations: impl IntoIterator<Item = ComputationId>) {
        self.pending.extend(computations);
        self.arm();
    }

    fn arm(&mut self) {
        if let Some(prev) = self.armed.take() {
            self.clock.cancel_frame(prev);
        }
        self.armed = Some(self.clock.request_frame());
    }

    fn state(&self) -> SchedulerState {
        if self.flushing {
            SchedulerState::Flushing
        } else if self.armed.is_some() {
            SchedulerState::Pending
        } else {
            SchedulerState::Idle
        }
    }
}

/// Add computations to the pending set and arm a frame.
///
/// A computation queued several times before the next flush runs once. Flush
/// order is first-insertion order.
pub fn queue(computations: impl IntoIterator<Item = ComputationId>) {
    with_runtime(|rt| {
        let before = rt.scheduler.pending.len();
        rt.scheduler.queue(computations);
        trace!(
            added = rt.scheduler.pending.len() - before,
            pending = rt.scheduler.pending.len(),
            "queued computations"
        );
    });
}

/// Install the clock used to arm frames.
pub fn set_frame_clock(clock: Rc<dyn FrameClock>) {
    with_runtime(|rt| rt.scheduler.clock = clock);
}

pub fn scheduler_state() -> SchedulerState {
    with_runtime(|rt| rt.scheduler.state())
}

/// Number of computations waiting for the next flush.
pub fn pending_count() -> usize {
    with_runtime(|rt| rt.scheduler.pending.len())
}

/// Whether a frame is armed, i.e. a flush is due on the next tick.
pub fn frame_armed() -> bool {
    with_runtime(|rt| rt.scheduler.armed.is_some())
}

/// Snapshot and clear the pending set, entering the flushing state.
///
/// Computations invalidated while the batch is processed go into a fresh
/// pending set and arm a new frame.
pub(crate) fn begin_flush() -> Vec<ComputationId> {
    with_runtime(|rt| {
        rt.scheduler.armed = None;
        rt.scheduler.flushing = true;
        rt.scheduler.pending.drain(..).collect()
    })
}

pub(crate) fn end_flush() {
    with_runtime(|rt| rt.scheduler.flushing = false);
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// A clock whose frames are delivered by hand.
///
/// Counts requests and cancellations so tests can observe debouncing.
#[derive(Debug, Default)]
pub struct ManualClock {
    next: StdCell<u64>,
    live: StdCell<Option<FrameRequest>>,
    requested: StdCell<usize>,
    cancelled: StdCell<usize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames requested so far.
    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    /// Total requests cancelled so far.
    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }

    /// The request that would fire on the next tick, if any.
    pub fn live(&self) -> Option<FrameRequest> {
        self.live.get()
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&self) -> FrameRequest {
        let request = FrameRequest(self.next.get());
        self.next.set(request.0 + 1);
        self.requested.set(self.requested.get() + 1);
        self.live.set(Some(request));
        request
    }

    fn cancel_frame(&self, request: FrameRequest) {
        if self.live.get() == Some(request) {
            self.live.set(None);
        }
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

/// A clock that wakes an async frame loop.
///
/// `Notify` keeps at most one permit, so any number of requests made before
/// the loop wakes collapse into one wake-up.
#[derive(Debug, Default)]
pub struct NotifyClock {
    notify: Notify,
    next: StdCell<u64>,
}

impl NotifyClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a frame is requested.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl FrameClock for NotifyClock {
    fn request_frame(&self) -> FrameRequest {
        let request = FrameRequest(self.next.get());
        self.next.set(request.0 + 1);
        self.notify.notify_one();
        request
    }

    fn cancel_frame(&self, _request: FrameRequest) {}
}
