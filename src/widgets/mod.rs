//! Built-in builders: HTML tags, boxes, text, buttons, text fields, SVG shapes.

pub mod html;
pub mod svg;

pub use html::{button, element, hbox, image, link, raw, tag, tag_with, text, text_field, vbox};
pub use svg::{circle, line, rect, svg, svg_g, svg_group, svg_tag, svg_tag_with};
