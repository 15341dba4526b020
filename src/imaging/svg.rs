//! SVG document composition.
//!
//! Produces the final response body: an `<svg>` wrapper sized to the
//! requested output, an optional `<filter>` block serialized from a
//! [`FilterChain`], and one `<image>` element referencing the raster.
//!
//! Two framings are supported:
//!
//! ```text
//! cropped   <svg width=W height=H viewBox="x y w h">   image at natural size
//! slice     <svg width=W height=H>                      image at W×H
//! ```
//!
//! Both use `preserveAspectRatio="xMidYMid slice"` so the raster always
//! covers the frame. Output is deterministic: identical arguments give
//! byte-identical text.

use super::calculations::CropRect;
use super::filters::{FILTER_ID, FilterChain, FilterPrimitive, FilterSelection};
use crate::types::Size;

/// Crop framing: the visible region plus the image's natural size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub crop: CropRect,
    pub natural: Size,
}

/// Render a complete SVG document.
///
/// `viewport` selects the framing: `Some` draws the image at its natural
/// size and windows it with a `viewBox`; `None` draws it straight at the
/// output size. The filter block and the image's `filter` attribute are
/// emitted only when `filters` selects at least one effect.
pub fn render_svg(
    output: Size,
    viewport: Option<&Viewport>,
    image_ref: &str,
    filters: FilterSelection,
) -> String {
    let chain = FilterChain::from_selection(filters);

    let mut svg = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\"",
        output.width, output.height
    ));
    if let Some(vp) = viewport {
        svg.push_str(&format!(" viewBox=\"{}\"", vp.crop.to_view_box()));
    }
    svg.push_str(">\n");

    svg.push_str(&render_filter(&chain));

    let (position, size) = match viewport {
        Some(vp) => ("x=\"0\" y=\"0\" ", vp.natural),
        None => ("", output),
    };
    let filter_attr = if chain.is_empty() {
        String::new()
    } else {
        format!("filter=\"url(#{FILTER_ID})\" ")
    };
    svg.push_str(&format!(
        "  <image {position}width=\"{}\" height=\"{}\" {filter_attr}preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\" />\n",
        size.width,
        size.height,
        escape_attr(image_ref)
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Serialize a filter chain as a `<filter>` element.
///
/// Returns an empty string for an empty chain. Only primitives that a later
/// step reads carry a `result` name; the last one feeds the filter output.
pub fn render_filter(chain: &FilterChain) -> String {
    if chain.is_empty() {
        return String::new();
    }

    let mut out = format!("  <filter id=\"{FILTER_ID}\" color-interpolation-filters=\"sRGB\">\n");
    let last = chain.steps().len() - 1;
    for (i, step) in chain.steps().iter().enumerate() {
        let input = step.input.as_str();
        let result = if i == last {
            String::new()
        } else {
            format!(" result=\"{}\"", step.primitive.result_name())
        };
        let element = match step.primitive {
            FilterPrimitive::GaussianBlur { std_deviation } => format!(
                "<feGaussianBlur in=\"{input}\" stdDeviation=\"{std_deviation}\"{result} />"
            ),
            FilterPrimitive::Saturate { value } => format!(
                "<feColorMatrix in=\"{input}\" type=\"saturate\" values=\"{value:.2}\"{result} />"
            ),
        };
        out.push_str("    ");
        out.push_str(&element);
        out.push('\n');
    }
    out.push_str("  </filter>\n");
    out
}

/// Escape a string for use inside a double-quoted XML attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
