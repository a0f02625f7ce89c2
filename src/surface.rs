//! Minimal 2D drawing capability the poster renderer paints through.
//!
//! The compositor never talks to a concrete raster backend. It fills
//! rectangles, places images, and draws single-line text with an optional
//! drop shadow, all through [`Surface`]. [`crate::svg::SvgSurface`] turns the
//! calls into an SVG document for `resvg`; [`RecordingSurface`] keeps them as
//! a list of [`DrawOp`]s.

use crate::background::ColorStop;
use crate::config::TextAlign;
use crate::image_source::DecodedImage;
use crate::text_metrics;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
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
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearGradient {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paint {
    Solid { color: String, opacity: f32 },
    LinearGradient(LinearGradient),
}

impl Paint {
    pub fn solid(color: impl Into<String>) -> Self {
        Paint::Solid {
            color: color.into(),
            opacity: 1.0,
        }
    }
}

/// Resolved font: a family stack, numeric weight and pixel size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16,
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, weight: u16, size: f32) -> Self {
        Self {
            family: family.into(),
            weight,
            size,
        }
    }

    /// Canvas-style shorthand, e.g. `700 48px Georgia, serif`.
    pub fn css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size, self.family)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: FontSpec,
    pub align: TextAlign,
    pub color: String,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeStyle {
    pub color: String,
    pub opacity: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub color: String,
    pub opacity: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

pub trait TextMeasure {
    /// Advance width of `text` in pixels when set in `font`.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32;
}

/// Text origins are the top of the em box at the alignment anchor.
pub trait Surface: TextMeasure {
    fn size(&self) -> (f32, f32);
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn draw_image(&mut self, image: &DecodedImage, dest: Rect);
    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle);
    fn stroke_text(&mut self, text: &str, origin: Point, style: &TextStyle, stroke: &StrokeStyle);
    /// Applies to all following text until replaced; `None` clears it.
    fn set_shadow(&mut self, shadow: Option<Shadow>);
}

/// Measures with the installed system fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMetrics;

impl TextMeasure for FontMetrics {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        text_metrics::text_width(text, font)
    }
}

/// Every character advances by the same amount, independent of font.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f32);

impl TextMeasure for FixedAdvance {
    fn measure_text(&self, text: &str, _font: &FontSpec) -> f32 {
        text.chars().count() as f32 * self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    DrawImage {
        image_width: u32,
        image_height: u32,
        dest: Rect,
    },
    FillText {
        text: String,
        origin: Point,
        style: TextStyle,
        shadow: Option<Shadow>,
    },
    StrokeText {
        text: String,
        origin: Point,
        style: TextStyle,
        stroke: StrokeStyle,
        shadow: Option<Shadow>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Measure {
    Metrics,
    Fixed(f32),
}

/// Keeps every draw call in order. Used for the `--dump` draw list and as a
/// spy in tests.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    measure: Measure,
    shadow: Option<Shadow>,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            measure: Measure::Metrics,
            shadow: None,
            ops: Vec::new(),
        }
    }

    pub fn with_fixed_advance(width: f32, height: f32, advance: f32) -> Self {
        Self {
            measure: Measure::Fixed(advance),
            ..Self::new(width, height)
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Filled text in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.ops)
    }
}

impl TextMeasure for RecordingSurface {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        match self.measure {
            Measure::Metrics => FontMetrics.measure_text(text, font),
            Measure::Fixed(advance) => FixedAdvance(advance).measure_text(text, font),
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.ops.push(DrawOp::FillRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) {
        self.ops.push(DrawOp::DrawImage {
            image_width: image.width,
            image_height: image.height,
            dest,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            origin,
            style: style.clone(),
            shadow: self.shadow.clone(),
        });
    }

    fn stroke_text(&mut self, text: &str, origin: Point, style: &TextStyle, stroke: &StrokeStyle) {
        self.ops.push(DrawOp::StrokeText {
            text: text.to_string(),
            origin,
            style: style.clone(),
            stroke: stroke.clone(),
            shadow: self.shadow.clone(),
        });
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle {
            font: FontSpec::new("serif", 400, 16.0),
            align: TextAlign::Left,
            color: "#FFFFFF".to_string(),
            opacity: 1.0,
        }
    }

    #[test]
    fn font_css_shorthand() {
        let font = FontSpec::new("Georgia, serif", 700, 48.0);
        assert_eq!(font.css(), "700 48px Georgia, serif");
    }

    #[test]
    fn fixed_advance_counts_chars_not_bytes() {
        let font = FontSpec::new("serif", 400, 16.0);
        assert_eq!(FixedAdvance(10.0).measure_text("— ab", &font), 40.0);
    }

    #[test]
    fn recording_surface_tracks_shadow_state() {
        let mut surface = RecordingSurface::with_fixed_advance(100.0, 100.0, 10.0);
        surface.set_shadow(Some(Shadow {
            color: "#000000".to_string(),
            opacity: 0.8,
            offset_x: 2.0,
            offset_y: 2.0,
            blur: 10.0,
        }));
        surface.fill_text("a", Point::new(0.0, 0.0), &style());
        surface.set_shadow(None);
        surface.fill_text("b", Point::new(0.0, 20.0), &style());

        let shadows: Vec<bool> = surface
            .ops()
            .iter()
            .map(|op| matches!(op, DrawOp::FillText { shadow: Some(_), .. }))
            .collect();
        assert_eq!(shadows, vec![true, false]);
        assert_eq!(surface.texts(), vec!["a", "b"]);
    }

    #[test]
    fn draw_list_serializes_with_op_tags() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::solid("#123456"));
        let json = surface.to_json().unwrap();
        assert!(json.contains("\"op\": \"fill_rect\""));
        assert!(json.contains("\"kind\": \"solid\""));
    }
}
