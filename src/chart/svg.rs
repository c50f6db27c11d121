use std::fmt::Write as _;

use super::{Align, Canvas, Color, Rect, TextStyle};

/// Accumulates drawing calls into an SVG document.
pub struct SvgCanvas {
    width: f32,
    height: f32,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            body: String::with_capacity(16 * 1024),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Closes the document and returns the markup.
    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            rect.x,
            rect.y,
            rect.width.max(0.0),
            rect.height.max(0.0),
            color.hex(),
        );
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
        let _ = write!(
            self.body,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}"/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            color.hex(),
            width,
        );
    }

    fn text(&mut self, text: &str, rect: Rect, style: &TextStyle) {
        let (x, anchor) = match style.align {
            Align::Left => (rect.x, "start"),
            Align::Center => (rect.x + rect.width / 2.0, "middle"),
            Align::Right => (rect.right(), "end"),
        };
        let y = rect.y + rect.height / 2.0;
        let _ = write!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}" text-anchor="{}" dominant-baseline="central">{}</text>"#,
            x,
            y,
            style.size,
            style.color.hex(),
            anchor,
            escape(text),
        );
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render;
    use crate::histogram::Histogram;

    #[test]
    fn produces_a_closed_document() {
        let mut canvas = SvgCanvas::new(640.0, 360.0);
        let bounds = canvas.bounds();
        render(&Histogram::build(&[]), &mut canvas, bounds);
        let svg = canvas.finish();

        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"width="640""#));
        assert!(svg.contains(">Protobuf</text>"));
        assert!(svg.contains(r##"fill="#ffa500""##));
    }

    #[test]
    fn text_is_escaped() {
        let mut canvas = SvgCanvas::new(10.0, 10.0);
        let style = TextStyle {
            color: Color::BLACK,
            size: 10.0,
            align: Align::Center,
        };
        canvas.text("a<b & \"c\"", Rect::new(0.0, 0.0, 10.0, 10.0), &style);
        assert!(canvas
            .finish()
            .contains(">a&lt;b &amp; &quot;c&quot;</text>"));
    }

    #[test]
    fn degenerate_canvas_is_empty_svg() {
        let mut canvas = SvgCanvas::new(0.0, 0.0);
        let bounds = canvas.bounds();
        render(&Histogram::build(&[]), &mut canvas, bounds);
        assert_eq!(
            canvas.finish(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0" viewBox="0 0 0 0" font-family="sans-serif"></svg>"#
        );
    }
}
