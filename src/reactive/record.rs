//! `SignalRecord`: a keyed record of reactive fields.
//!
//! Building a record from plain values wraps each one:
//!
//! - a list becomes a [`Sequence`], held in a signal so that replacing the
//!   whole list notifies the readers of the field;
//! - a [`Binding`] is kept as is (getters and setters, computed fields);
//! - anything else becomes a `Signal<Value>`.
//!
//! [`SignalRecord::field`] and [`SignalRecord::binding`] expose the cells
//! behind each key. The `$` key names that view and cannot be assigned.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::binding::Binding;
use super::sequence::Sequence;
use super::signal::Signal;
use crate::value::Value;

/// Key of the cell view.
pub const CELLS_KEY: &str = "$";

/// Errors from keyed record access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("unknown field {key:?}")]
    UnknownField { key: String },
    #[error("unable to set read-only property {key}")]
    ReadOnly { key: String },
    #[error("field {key} is not a list")]
    NotAList { key: String },
    #[error("field {key} holds a list and only accepts lists")]
    ExpectedList { key: String },
}

/// The cell behind one key.
#[derive(Debug, Clone)]
pub enum Field {
    Cell(Signal<Value>),
    List(Signal<Sequence<Value>>),
    Bound(Binding<Value>),
}

impl Field {
    fn wrap(value: Value) -> Self {
        match value {
            Value::List(items) => Field::List(Signal::new(Sequence::new(items))),
            other => Field::Cell(Signal::new(other)),
        }
    }
}

/// A keyed record of reactive fields. Cloning yields another handle to the
/// same record.
#[derive(Debug, Clone, Default)]
pub struct SignalRecord {
    fields: Rc<RefCell<IndexMap<String, Field>>>,
}

impl SignalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record, wrapping every value.
    pub fn from_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let record = Self::new();
        for (key, value) in values {
            record.insert(key, value);
        }
        record
    }

    /// Add a wrapped value (builder).
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a binding (builder).
    pub fn with_binding(self, key: impl Into<String>, binding: Binding<Value>) -> Self {
        self.insert_binding(key, binding);
        self
    }

    /// Add or replace a field holding `value`, wrapped.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields
            .borrow_mut()
            .insert(key.into(), Field::wrap(value.into()));
    }

    pub fn insert_binding(&self, key: impl Into<String>, binding: Binding<Value>) {
        self.fields
            .borrow_mut()
            .insert(key.into(), Field::Bound(binding));
    }

    /// Add a read-only field computed by `get`.
    ///
    /// `get` may read other fields of this record through a clone of it.
    pub fn insert_computed(&self, key: impl Into<String>, get: impl Fn() -> Value + 'static) {
        self.insert_binding(key, Binding::computed(get));
    }

    /// The cell behind `key`.
    pub fn field(&self, key: &str) -> Result<Field, RecordError> {
        self.fields
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| RecordError::UnknownField {
                key: key.to_owned(),
            })
    }

    /// Read a field, subscribing the running computation.
    ///
    /// A list field reads every element, so it subscribes to the list, its
    /// length and each element.
    pub fn get(&self, key: &str) -> Result<Value, RecordError> {
        Ok(match self.field(key)? {
            Field::Cell(cell) => cell.get(),
            Field::List(list) => Value::List(list.get().to_vec()),
            Field::Bound(binding) => binding.get(),
        })
    }

    /// Write a field.
    ///
    /// Cells coerce the value to the type they hold. A list field takes a new
    /// list and replaces its sequence. Bindings run their setter.
    pub fn set(&self, key: &str, value: Value) -> Result<(), RecordError> {
        if key == CELLS_KEY {
            return Err(RecordError::ReadOnly {
                key: key.to_owned(),
            });
        }
        match self.field(key)? {
            Field::Cell(cell) => cell.set(value),
            Field::List(list) => match value {
                Value::List(items) => list.set(Sequence::new(items)),
                _ => {
                    return Err(RecordError::ExpectedList {
                        key: key.to_owned(),
                    })
                }
            },
            Field::Bound(binding) => binding.set(value).map_err(|_| RecordError::ReadOnly {
                key: key.to_owned(),
            })?,
        }
        Ok(())
    }

    /// The sequence behind a list field. Subscribes to the field, not to
    /// its elements.
    pub fn list(&self, key: &str) -> Result<Sequence<Value>, RecordError> {
        match self.field(key)? {
            Field::List(list) => Ok(list.get()),
            _ => Err(RecordError::NotAList {
                key: key.to_owned(),
            }),
        }
    }

    /// Any field as a [`Binding`] over its value.
    ///
    /// The binding of a list field ignores writes that are not lists.
    pub fn binding(&self, key: &str) -> Result<Binding<Value>, RecordError> {
        Ok(match self.field(key)? {
            Field::Cell(cell) => Binding::from(cell),
            Field::List(list) => {
                let reader = list.clone();
                Binding::new(
                    move || Value::List(reader.get().to_vec()),
                    move |value| match value {
                        Value::List(items) => list.set(Sequence::new(items)),
                        other => debug!(value = %other, "ignoring non-list write to a list field"),
                    },
                )
            }
            Field::Bound(binding) => binding,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    /// Read every field into a map value.
    pub fn to_value(&self) -> Value {
        let keys = self.keys();
        Value::Map(
            keys.into_iter()
                .filter_map(|key| self.get(&key).ok().map(|value| (key, value)))
                .collect(),
        )
    }
}
