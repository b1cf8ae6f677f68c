//! `Sequence<T>`: index- and length-level reactivity over a vector.
//!
//! Element signals are created lazily, the first time an index is read or
//! written, and cached afterwards. The length goes through one shared length
//! signal. A computation that only reads index 3 is not re-run when index 4
//! or the length changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::signal::{Signal, SignalValue};
use crate::value::Value;

/// Errors from sequence writes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequenceError {
    #[error("unable to set read-only property {key}")]
    ReadOnly { key: String },
    #[error("index {index} out of bounds for sequence of length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("invalid sequence length {value}")]
    InvalidLength { value: String },
    #[error("unknown sequence key {key:?}")]
    UnknownKey { key: String },
}

/// Largest length the keyed API accepts, as for script arrays.
const MAX_LENGTH: f64 = u32::MAX as f64;

/// Keys accepted by the dynamic [`Sequence::assign`] API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKey {
    /// An element index.
    Index(usize),
    /// `length`
    Length,
    /// `$`: the element-signal view.
    Cells,
    /// `$length`: the length signal.
    LengthCell,
}

impl FromStr for SequenceKey {
    type Err = SequenceError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "$" => Ok(SequenceKey::Cells),
            "$length" => Ok(SequenceKey::LengthCell),
            "length" => Ok(SequenceKey::Length),
            other => other
                .parse::<usize>()
                .map(SequenceKey::Index)
                .map_err(|_| SequenceError::UnknownKey {
                    key: other.to_owned(),
                }),
        }
    }
}

/// A reactive sequence. Cloning yields another handle to the same sequence.
pub struct Sequence<T: 'static> {
    values: Rc<RefCell<Vec<T>>>,
    cells: Rc<RefCell<Vec<Option<Signal<T>>>>>,
    length: Signal<usize>,
}

impl<T: 'static> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            values: Rc::clone(&self.values),
            cells: Rc::clone(&self.cells),
            length: self.length.clone(),
        }
    }
}

impl<T: 'static> Sequence<T> {
    /// Whether both handles refer to the same sequence.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }
}

/// A signal holding a sequence changes only when a different sequence is
/// stored. Element and length changes notify through the sequence's own cells.
impl<T: 'static> SignalValue for Sequence<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells.borrow();
        f.debug_struct("Sequence")
            .field("values", &*self.values.borrow())
            .field("cells", &cells.iter().filter(|c| c.is_some()).count())
            .finish()
    }
}

impl<T: SignalValue + Default> Sequence<T> {
    pub fn new(values: Vec<T>) -> Self {
        let len = values.len();
        let values = Rc::new(RefCell::new(values));
        let cells: Rc<RefCell<Vec<Option<Signal<T>>>>> = Rc::new(RefCell::new(Vec::new()));

        let read_values = Rc::clone(&values);
        let write_values = Rc::clone(&values);
        let write_cells = Rc::clone(&cells);
        let length = Signal::builder(len)
            .on_read(move |_| read_values.borrow().len())
            .on_write(move |len, _| {
                write_values.borrow_mut().resize_with(len, T::default);
                write_cells.borrow_mut().truncate(len);
                len
            })
            .build();

        Self {
            values,
            cells,
            length,
        }
    }

    /// Read element `index`, subscribing to that element only.
    ///
    /// Out-of-range reads subscribe to the length instead and return `None`.
    pub fn get(&self, index: usize) -> Option<T> {
        match self.cell(index) {
            Some(cell) => Some(cell.get()),
            None => {
                let _ = self.length.get();
                None
            }
        }
    }

    /// Write element `index`. Writing at `len()` appends.
    pub fn set(&self, index: usize, value: T) -> Result<(), SequenceError> {
        let len = self.values.borrow().len();
        if index > len {
            return Err(SequenceError::OutOfBounds { index, len });
        }
        if index == len {
            self.push(value);
            return Ok(());
        }

        let existing = self.cells.borrow().get(index).cloned().flatten();
        match existing {
            Some(cell) => {
                cell.set(value);
                self.values.borrow_mut()[index] = cell.get_untracked();
            }
            None => {
                self.values.borrow_mut()[index] = value.clone();
                let mut cells = self.cells.borrow_mut();
                if cells.len() <= index {
                    cells.resize_with(index + 1, || None);
                }
                cells[index] = Some(Signal::new(value));
            }
        }
        Ok(())
    }

    /// Append an element, notifying length readers.
    pub fn push(&self, value: T) {
        let len = self.values.borrow().len();
        self.values.borrow_mut().push(value.clone());
        {
            let mut cells = self.cells.borrow_mut();
            cells.resize_with(len, || None);
            cells.push(Some(Signal::new(value)));
        }
        self.length.set(len + 1);
    }

    /// Current length, subscribing to the length signal.
    pub fn len(&self) -> usize {
        self.length.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize. Shrinking drops element signals past the new end; growing fills
    /// with `T::default()`.
    pub fn set_len(&self, len: usize) {
        self.length.set(len);
    }

    /// The signal backing element `index`, created on first access.
    pub fn cell(&self, index: usize) -> Option<Signal<T>> {
        let values = self.values.borrow();
        if index >= values.len() {
            return None;
        }
        let mut cells = self.cells.borrow_mut();
        if cells.len() <= index {
            cells.resize_with(index + 1, || None);
        }
        let cell = cells[index].get_or_insert_with(|| Signal::new(values[index].clone()));
        Some(cell.clone())
    }

    /// The shared length signal. Writing it resizes the sequence.
    pub fn length_cell(&self) -> Signal<usize> {
        self.length.clone()
    }

    /// Whether a signal has been created for `index`.
    pub fn has_cell(&self, index: usize) -> bool {
        self.cells
            .borrow()
            .get(index)
            .is_some_and(Option::is_some)
    }

    /// Number of element signals created so far.
    pub fn cell_count(&self) -> usize {
        self.cells.borrow().iter().filter(|c| c.is_some()).count()
    }

    /// Read every element (subscribing to the length and to each element).
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

impl Sequence<Value> {
    /// Keyed read. Indices past the end read as `Undefined`.
    ///
    /// The `$` and `$length` views are reached through [`cell`](Self::cell)
    /// and [`length_cell`](Self::length_cell) instead.
    pub fn get_key(&self, key: &str) -> Result<Value, SequenceError> {
        match key.parse::<SequenceKey>()? {
            SequenceKey::Index(index) => Ok(self.get(index).unwrap_or_default()),
            SequenceKey::Length => Ok(Value::from(self.len())),
            SequenceKey::Cells | SequenceKey::LengthCell => Err(SequenceError::UnknownKey {
                key: key.to_owned(),
            }),
        }
    }

    /// Keyed write.
    ///
    /// Numeric keys write elements and `length` resizes. The `$` and `$length`
    /// views cannot be replaced.
    pub fn assign(&self, key: &str, value: Value) -> Result<(), SequenceError> {
        match key.parse::<SequenceKey>()? {
            SequenceKey::Index(index) => self.set(index, value),
            SequenceKey::Length => {
                let n = value.to_number();
                if (0.0..=MAX_LENGTH).contains(&n) && n.fract() == 0.0 {
                    self.set_len(n as usize);
                    Ok(())
                } else {
                    Err(SequenceError::InvalidLength {
                        value: value.to_string(),
                    })
                }
            }
            SequenceKey::Cells | SequenceKey::LengthCell => Err(SequenceError::ReadOnly {
                key: key.to_owned(),
            }),
        }
    }
}

impl<T: SignalValue + Default> From<Vec<T>> for Sequence<T> {
    fn from(values: Vec<T>) -> Self {
        Sequence::new(values)
    }
}
