//! `Signal<T>`: a reactive cell.
//!
//! Reading a signal while a computation runs subscribes that computation.
//! Writing a different value queues every subscriber into the scheduler and
//! clears the subscriber set; each computation re-subscribes on its next run.
//! Single-threaded, synchronous, thread-local runtime.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;

use super::runtime::{self, ComputationId, Source};
use super::scheduler;
use crate::value::Value;

// ---------------------------------------------------------------------------
// SignalValue
// ---------------------------------------------------------------------------

/// Values a [`Signal`] can hold.
pub trait SignalValue: Clone + 'static {
    /// Default equality predicate. Must treat a value as equal to itself,
    /// `NaN` included.
    fn same_value(&self, other: &Self) -> bool;

    /// Adapt an incoming write to the currently stored value.
    fn coerce(incoming: Self, _existing: &Self) -> Self {
        incoming
    }
}

macro_rules! impl_signal_value_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl SignalValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_signal_value_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String,
    &'static str,
);

impl SignalValue for f64 {
    fn same_value(&self, other: &Self) -> bool {
        Value::Number(*self).same_value(&Value::Number(*other))
    }
}

impl SignalValue for f32 {
    fn same_value(&self, other: &Self) -> bool {
        f64::from(*self).same_value(&f64::from(*other))
    }
}

impl SignalValue for Value {
    fn same_value(&self, other: &Self) -> bool {
        Value::same_value(self, other)
    }

    fn coerce(incoming: Self, existing: &Self) -> Self {
        Value::coerce(incoming, existing)
    }
}

impl<T: SignalValue> SignalValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: SignalValue> SignalValue for Vec<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

type ReadTransform<T> = Box<dyn Fn(&T) -> T>;
type WriteTransform<T> = Box<dyn Fn(T, &T) -> T>;
type Equality<T> = Box<dyn Fn(&T, &T) -> bool>;

struct SignalInner<T> {
    value: RefCell<T>,
    on_read: Option<ReadTransform<T>>,
    on_write: Option<WriteTransform<T>>,
    eq: Equality<T>,
    subscribers: RefCell<IndexSet<ComputationId>>,
}

impl<T: 'static> Source for SignalInner<T> {
    fn unsubscribe(&self, id: ComputationId) {
        self.subscribers.borrow_mut().shift_remove(&id);
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A reactive cell. Cloning yields another handle to the same cell.
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: SignalValue + fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// Create a signal holding `initial`.
pub fn create_signal<T: SignalValue>(initial: T) -> Signal<T> {
    Signal::new(initial)
}

impl<T: SignalValue> Signal<T> {
    pub fn new(initial: T) -> Self {
        SignalBuilder::new(initial).build()
    }

    /// Start configuring transforms and equality.
    pub fn builder(initial: T) -> SignalBuilder<T> {
        SignalBuilder::new(initial)
    }

    /// Read the current value, subscribing the running computation (if any).
    pub fn get(&self) -> T {
        self.track();
        self.get_untracked()
    }

    /// Read by reference. Still subscribes the running computation. The read
    /// transform is applied.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        match &self.inner.on_read {
            Some(on_read) => f(&on_read(&self.inner.value.borrow())),
            None => f(&self.inner.value.borrow()),
        }
    }

    /// Read without subscribing anyone.
    pub fn get_untracked(&self) -> T {
        let stored = self.inner.value.borrow();
        match &self.inner.on_read {
            Some(on_read) => on_read(&stored),
            None => stored.clone(),
        }
    }

    /// Write a value.
    ///
    /// The incoming value is coerced against the stored one and passed through
    /// the write transform. Subscribers are queued only when the equality
    /// predicate says the coerced incoming value differs from the old stored
    /// value; they are then cleared.
    pub fn set(&self, incoming: T) {
        let old = self.inner.value.borrow().clone();
        let incoming = T::coerce(incoming, &old);
        let changed = !(self.inner.eq)(&incoming, &old);
        let stored = match &self.inner.on_write {
            Some(on_write) => on_write(incoming, &old),
            None => incoming,
        };
        *self.inner.value.borrow_mut() = stored;

        if changed {
            self.notify();
        }
    }

    /// Mutate a copy of the value and write it back through [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.inner.value.borrow().clone();
        f(&mut next);
        self.set(next);
    }

    /// Number of computations currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn track(&self) {
        let Some(id) = runtime::current_computation() else {
            return;
        };
        let inserted = self.inner.subscribers.borrow_mut().insert(id);
        if inserted {
            let source: Weak<dyn Source> = Rc::downgrade(&self.inner) as Weak<dyn Source>;
            runtime::add_dependency(id, source);
        }
    }

    fn notify(&self) {
        let subscribers: Vec<ComputationId> =
            self.inner.subscribers.borrow_mut().drain(..).collect();
        if !subscribers.is_empty() {
            scheduler::queue(subscribers);
        }
    }
}

// ---------------------------------------------------------------------------
// SignalBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`Signal`] with transforms or a custom equality predicate.
pub struct SignalBuilder<T: 'static> {
    initial: T,
    on_read: Option<ReadTransform<T>>,
    on_write: Option<WriteTransform<T>>,
    eq: Option<Equality<T>>,
}

impl<T: SignalValue> SignalBuilder<T> {
    pub fn new(initial: T) -> Self {
        Self {
            initial,
            on_read: None,
            on_write: None,
            eq: None,
        }
    }

    /// Transform applied to every read.
    pub fn on_read(mut self, f: impl Fn(&T) -> T + 'static) -> Self {
        self.on_read = Some(Box::new(f));
        self
    }

    /// Transform applied to every write. Receives the incoming and old value,
    /// returns what gets stored.
    pub fn on_write(mut self, f: impl Fn(T, &T) -> T + 'static) -> Self {
        self.on_write = Some(Box::new(f));
        self
    }

    /// Replace the default equality predicate.
    pub fn eq(mut self, f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.eq = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Signal<T> {
        Signal {
            inner: Rc::new(SignalInner {
                value: RefCell::new(self.initial),
                on_read: self.on_read,
                on_write: self.on_write,
                eq: self.eq.unwrap_or_else(|| Box::new(T::same_value)),
                subscribers: RefCell::new(IndexSet::new()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
