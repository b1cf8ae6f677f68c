//! SVG builders. Nodes are created in the SVG namespace.

use crate::body::{build_here, IntoBody, Kind, Modifier, NodeRef};
use crate::value::Value;

/// Build `body` and make it an SVG `<tag>` element.
pub fn svg_tag(tag: &str, body: impl IntoBody) -> NodeRef {
    build_here(body).set_kind(Kind::svg(tag))
}

/// [`svg_tag`] plus a directly assigned fragment.
pub fn svg_tag_with(tag: &str, body: impl IntoBody, fragment: Modifier) -> NodeRef {
    svg_tag(tag, body).assign(fragment)
}

/// An `<svg>` root with a 100×100 view box.
pub fn svg(body: impl IntoBody) -> NodeRef {
    svg_tag("svg", body).set_attributes([
        ("viewBox", Value::from("0 0 100 100")),
        ("width", Value::from(100)),
        ("height", Value::from(100)),
    ])
}

/// A `<g>` group.
pub fn svg_group(body: impl IntoBody) -> NodeRef {
    svg_tag("g", body)
}

/// Alias of [`svg_group`].
pub fn svg_g(body: impl IntoBody) -> NodeRef {
    svg_group(body)
}

pub fn circle<K, V>(attrs: impl IntoIterator<Item = (K, V)>, body: impl IntoBody) -> NodeRef
where
    K: Into<String>,
    V: Into<Value>,
{
    svg_tag("circle", body).set_attributes(attrs)
}

pub fn rect<K, V>(attrs: impl IntoIterator<Item = (K, V)>, body: impl IntoBody) -> NodeRef
where
    K: Into<String>,
    V: Into<Value>,
{
    svg_tag("rect", body).set_attributes(attrs)
}

pub fn line<K, V>(attrs: impl IntoIterator<Item = (K, V)>) -> NodeRef
where
    K: Into<String>,
    V: Into<Value>,
{
    svg_tag("line", ()).set_attributes(attrs)
}
