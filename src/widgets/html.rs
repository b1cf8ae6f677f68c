//! HTML builders.
//!
//! Each builder builds its body under the ambient parent, then tags the
//! resulting node. Tag and helper fields are assigned directly; styles and
//! attributes that a caller may want to override go through the modifier
//! chain.

use tracing::debug;

use crate::body::{build_here, BodyNode, Event, IntoBody, Kind, Modifier, NodeRef};
use crate::reactive::Binding;
use crate::value::Value;

/// Build `body` and make it a `<tag>` element.
pub fn tag(tag: &str, body: impl IntoBody) -> NodeRef {
    build_here(body).set_kind(Kind::html(tag))
}

/// [`tag`] plus a directly assigned fragment.
pub fn tag_with(tag: &str, body: impl IntoBody, fragment: Modifier) -> NodeRef {
    self::tag(tag, body).assign(fragment)
}

/// An empty `<tag>` element.
pub fn element(tag: &str) -> NodeRef {
    self::tag(tag, ())
}

/// A `div` whose content is the given markup.
pub fn raw(html: impl Into<String>) -> NodeRef {
    let html: String = html.into();
    tag_with("div", (), Modifier::prop("innerHTML", html))
}

/// A row flex container.
pub fn hbox(body: impl IntoBody) -> NodeRef {
    tag("div", body).set_style([("display", "flex"), ("flex-direction", "row")])
}

/// A column flex container.
pub fn vbox(body: impl IntoBody) -> NodeRef {
    tag("div", body).set_style([("display", "flex"), ("flex-direction", "column")])
}

pub fn image(src: impl Into<String>, body: impl IntoBody) -> NodeRef {
    let src: String = src.into();
    tag_with("img", body, Modifier::prop("src", src))
}

pub fn link(body: impl IntoBody, fragment: Modifier) -> NodeRef {
    tag_with("a", body, fragment)
}

/// A `span`.
pub fn text(body: impl IntoBody) -> NodeRef {
    tag("span", body)
}

/// A `button` with a label and a click handler.
pub fn button(
    label: impl Into<String>,
    on_click: impl Fn(&Event) + 'static,
    body: impl IntoBody,
) -> NodeRef {
    tag_with(
        "button",
        body,
        Modifier::text(label).with_handler("click", on_click),
    )
}

/// An `input` bound to `cell` in both directions.
///
/// The field shows the cell's value (empty while it is `Undefined`) and
/// re-renders when it changes. A committed edit (`change`) writes the
/// entered string back; a signal coerces it to the type it holds. Edits of a
/// read-only binding are dropped.
pub fn text_field(cell: impl Into<Binding<Value>>, placeholder: &str) -> NodeRef {
    let cell: Binding<Value> = cell.into();
    let placeholder = placeholder.to_owned();
    tag("input", move || {
        let current = cell.get();
        let shown = if current.is_undefined() {
            String::new()
        } else {
            current.to_string()
        };
        let mut node = BodyNode::new().with_prop("value", shown);
        if !placeholder.is_empty() {
            node = node.with_attributes([("placeholder", placeholder.clone())]);
        }
        let cell = cell.clone();
        node.with_handler("change", move |ev| {
            if let Some(value) = &ev.value {
                if cell.set(Value::from(value.as_str())).is_err() {
                    debug!("dropping edit of a read-only binding");
                }
            }
        })
    })
}
