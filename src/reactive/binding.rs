//! `Binding<T>`: a cell defined by a getter and an optional setter.
//!
//! A binding owns no state. Reading runs the getter, so every signal the
//! getter reads subscribes the running computation. Writing runs the setter,
//! which usually writes one or more signals. A binding without a setter is a
//! computed, read-only cell.

use std::fmt;
use std::rc::Rc;

use super::runtime::untracked;
use super::signal::{Signal, SignalValue};

/// Returned when writing a binding that has no setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("binding has no setter")]
pub struct ReadOnlyBinding;

type Getter<T> = Rc<dyn Fn() -> T>;
type Setter<T> = Rc<dyn Fn(T)>;

/// A derived cell. Cloning yields another handle to the same closures.
pub struct Binding<T: 'static> {
    get: Getter<T>,
    set: Option<Setter<T>>,
}

impl<T: 'static> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            set: self.set.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("read_only", &self.set.is_none())
            .finish()
    }
}

/// Create a binding from a getter and a setter.
pub fn binding<T: 'static>(
    get: impl Fn() -> T + 'static,
    set: impl Fn(T) + 'static,
) -> Binding<T> {
    Binding::new(get, set)
}

impl<T: 'static> Binding<T> {
    pub fn new(get: impl Fn() -> T + 'static, set: impl Fn(T) + 'static) -> Self {
        Self {
            get: Rc::new(get),
            set: Some(Rc::new(set)),
        }
    }

    /// A read-only binding.
    pub fn computed(get: impl Fn() -> T + 'static) -> Self {
        Self {
            get: Rc::new(get),
            set: None,
        }
    }

    pub fn get(&self) -> T {
        (self.get)()
    }

    /// Run the getter without subscribing the running computation.
    pub fn get_untracked(&self) -> T {
        untracked(|| self.get())
    }

    pub fn set(&self, value: T) -> Result<(), ReadOnlyBinding> {
        let set = self.set.as_ref().ok_or(ReadOnlyBinding)?;
        set(value);
        Ok(())
    }

    /// Mutate the current value and write it back through the setter.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), ReadOnlyBinding> {
        if self.set.is_none() {
            return Err(ReadOnlyBinding);
        }
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next)
    }

    pub fn is_read_only(&self) -> bool {
        self.set.is_none()
    }
}

impl<T: SignalValue> From<Signal<T>> for Binding<T> {
    fn from(signal: Signal<T>) -> Self {
        let reader = signal.clone();
        Binding::new(move || reader.get(), move |value| signal.set(value))
    }
}

impl<T: SignalValue> From<&Signal<T>> for Binding<T> {
    fn from(signal: &Signal<T>) -> Self {
        Binding::from(signal.clone())
    }
}
