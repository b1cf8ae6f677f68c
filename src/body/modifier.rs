//! Modifier fragments and the merge that folds them into a node.

use super::node::{collect_record, Attributes, BodyNode, Event, Handler, Handlers, Props, Style};
use crate::value::Value;

/// A partial node description appended after construction.
///
/// Modifiers are not applied when appended. The renderer folds them into the
/// node once, right before first rendering it (see [`merge_modifiers`]).
#[derive(Debug, Clone, Default)]
pub struct Modifier {
    pub style: Option<Style>,
    pub attributes: Option<Attributes>,
    pub handlers: Handlers,
    pub props: Props,
    pub text: Option<String>,
}

impl Modifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style<K, V>(style: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new().with_style(style)
    }

    pub fn attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new().with_attributes(attributes)
    }

    pub fn handler(event: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        Self::new().with_handler(event, f)
    }

    pub fn handlers<K: Into<String>>(handlers: impl IntoIterator<Item = (K, Handler)>) -> Self {
        Self {
            handlers: handlers.into_iter().map(|(k, h)| (k.into(), h)).collect(),
            ..Self::default()
        }
    }

    pub fn prop(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with_prop(name, value)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    pub fn with_style<K, V>(mut self, style: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.style = Some(collect_record(style));
        self
    }

    pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.attributes = Some(collect_record(attributes));
        self
    }

    pub fn with_handler(mut self, event: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.handlers.insert(event.into(), Handler::new(f));
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// A fragment with no fields at all. An empty `style` record still counts.
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.attributes.is_none()
            && self.handlers.is_empty()
            && self.props.is_empty()
            && self.text.is_none()
    }
}

/// Fold a node's pending modifiers into its fields. Runs once per node.
///
/// `style` and `attributes` are merged key by key, starting from the node's
/// own record and then each modifier in append order; later keys win. A record
/// stays `None` when neither the node nor any modifier supplied one. Handlers,
/// props and text are assigned shallowly in the same order.
pub(crate) fn merge_modifiers(node: &mut BodyNode) {
    if node.merged {
        return;
    }
    node.merged = true;
    if node.modifiers.is_empty() {
        return;
    }

    let mut style = node.style.take();
    let mut attributes = node.attributes.take();
    for m in &node.modifiers {
        if let Some(s) = &m.style {
            let merged = style.get_or_insert_with(Style::new);
            merged.extend(s.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(a) = &m.attributes {
            let merged = attributes.get_or_insert_with(Attributes::new);
            merged.extend(a.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        node.handlers
            .extend(m.handlers.iter().map(|(k, h)| (k.clone(), h.clone())));
        node.props
            .extend(m.props.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(text) = &m.text {
            node.text = Some(text.clone());
        }
    }
    node.style = style;
    node.attributes = attributes;
}
