//! Grouped bar chart of a latency histogram.
//!
//! `render` only talks to the `Canvas` trait; `svg::SvgCanvas` is the
//! backend used by the HTTP dashboard.

pub mod svg;

use crate::codec::Codec;
use crate::histogram::Histogram;

pub use svg::SvgCanvas;

// ─── Layout ──────────────────────────────────────────────────────

const PADDING: f32 = 16.0;
const LEGEND_HEIGHT: f32 = 30.0;
const LEGEND_SPACING: f32 = 110.0;
const SWATCH: f32 = 14.0;
/// Space between bucket groups
const GROUP_GAP: f32 = 12.0;
/// Space between the two bars of a group
const BAR_GAP: f32 = 4.0;
const MIN_BAR_WIDTH: f32 = 6.0;
const MIN_TICKS: u64 = 3;
const MAX_TICKS: u64 = 8;

// ─── Drawing primitives ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color(0x00, 0x00, 0x00);
    pub const BLUE: Color = Color(0x00, 0x00, 0xff);
    pub const ORANGE: Color = Color(0xff, 0xa5, 0x00);
    pub const LIGHT_GRAY: Color = Color(0xd3, 0xd3, 0xd3);
    pub const DARK_GRAY: Color = Color(0xa9, 0xa9, 0xa9);

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub size: f32,
    pub align: Align,
}

/// Minimal immediate-mode drawing surface.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32);
    /// Draws `text` inside `rect`, vertically centred.
    fn text(&mut self, text: &str, rect: Rect, style: &TextStyle);
}

pub fn codec_color(codec: Codec) -> Color {
    match codec {
        Codec::CompactBinary => Color::BLUE,
        Codec::StructuredText => Color::ORANGE,
    }
}

// ─── Renderer ────────────────────────────────────────────────────

/// Draws `hist` into `bounds`. Never fails: if the padded chart area is
/// empty nothing is drawn.
pub fn render(hist: &Histogram, canvas: &mut impl Canvas, bounds: Rect) {
    let chart_top = bounds.y + LEGEND_HEIGHT + PADDING;
    let chart_bot = bounds.bottom() - PADDING;
    let chart_left = bounds.x + PADDING;
    let chart_right = bounds.right() - PADDING;

    // NaN bounds fail both comparisons, so test the positive case.
    if !(chart_right > chart_left && chart_bot > chart_top) {
        return;
    }

    canvas.fill_rect(bounds, Color::WHITE);

    // ── Legend ──────────────────────────────────────────────────
    let legend_y = bounds.y + PADDING;
    for (n, codec) in Codec::ALL.into_iter().enumerate() {
        legend_swatch(canvas, chart_left + n as f32 * LEGEND_SPACING, legend_y, codec);
    }

    // ── Scale ───────────────────────────────────────────────────
    let bucket_count = hist.buckets.len();
    if bucket_count == 0 {
        return;
    }
    let max_count = hist.max_count().max(1);

    let chart_height = chart_bot - chart_top;
    let chart_width = chart_right - chart_left;

    let groups_width = chart_width - (bucket_count - 1) as f32 * GROUP_GAP;
    let bar_width = ((groups_width / bucket_count as f32 - BAR_GAP) / 2.0).max(MIN_BAR_WIDTH);
    let scale_y = chart_height / max_count as f32;

    // ── Grid + y labels ─────────────────────────────────────────
    let ticks = max_count.clamp(MIN_TICKS, MAX_TICKS);
    let tick_style = TextStyle {
        color: Color::DARK_GRAY,
        size: 10.0,
        align: Align::Right,
    };
    for i in 0..=ticks {
        let value = max_count as f32 / ticks as f32 * i as f32;
        let y = chart_bot - value * scale_y;
        canvas.line((chart_left, y), (chart_right, y), Color::LIGHT_GRAY, 1.0);
        canvas.text(
            &format!("{}", value.round()),
            Rect::new(chart_left - 24.0, y - 6.0, 20.0, 12.0),
            &tick_style,
        );
    }

    // ── Bar groups ──────────────────────────────────────────────
    let group_width = 2.0 * bar_width + BAR_GAP;
    let label_style = TextStyle {
        color: Color::BLACK,
        size: 12.0,
        align: Align::Center,
    };
    for i in 0..bucket_count {
        let group_x = chart_left + i as f32 * (group_width + GROUP_GAP);

        for (n, codec) in Codec::ALL.into_iter().enumerate() {
            let count = hist.counts(codec)[i];
            let x = group_x + n as f32 * (bar_width + BAR_GAP);
            bar(canvas, x, chart_bot, bar_width, count, scale_y, codec_color(codec));
        }

        canvas.text(
            &hist.buckets[i].label,
            Rect::new(group_x, chart_bot + 4.0, group_width, 16.0),
            &label_style,
        );
    }
}

fn bar(
    canvas: &mut impl Canvas,
    x: f32,
    baseline: f32,
    width: f32,
    count: u64,
    scale_y: f32,
    color: Color,
) {
    if count == 0 {
        return;
    }
    let height = count as f32 * scale_y;
    canvas.fill_rect(Rect::new(x, baseline - height, width, height), color);
    canvas.text(
        &count.to_string(),
        Rect::new(x, baseline - height + 2.0, width, 14.0),
        &TextStyle {
            color: Color::WHITE,
            size: 11.0,
            align: Align::Center,
        },
    );
}

fn legend_swatch(canvas: &mut impl Canvas, x: f32, y: f32, codec: Codec) {
    canvas.fill_rect(Rect::new(x, y - 8.0, SWATCH, SWATCH), codec_color(codec));
    canvas.text(
        codec.label(),
        Rect::new(x + 20.0, y - 8.0, 80.0, 16.0),
        &TextStyle {
            color: Color::BLACK,
            size: 12.0,
            align: Align::Left,
        },
    );
}
