use crate::config::PosterSettings;
use crate::image_source::{DecodedImage, ImageLoader};
use crate::surface::{LinearGradient, Paint, Rect, Surface};
use crate::theme::PosterTheme;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

static GRADIENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"linear-gradient\(\s*[^,]+,\s*(.+)\)").unwrap());
static STOP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s+(\d+)%$").unwrap());

pub const FALLBACK_COLOR: &str = "#1A1A1A";
const DEFAULT_ANGLE: &str = "135deg";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorStop {
    pub color: String,
    pub position: f32,
}

impl ColorStop {
    pub fn new(color: impl Into<String>, position: f32) -> Self {
        Self {
            color: color.into(),
            position: position.clamp(0.0, 1.0),
        }
    }
}

/// Base fill used when no image is set.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Solid(String),
    Gradient(Vec<ColorStop>),
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid(FALLBACK_COLOR.to_string())
    }
}

impl Background {
    pub fn solid(color: impl Into<String>) -> Self {
        Background::Solid(color.into())
    }

    pub fn gradient(from: impl Into<String>, to: impl Into<String>) -> Self {
        Background::Gradient(vec![ColorStop::new(from, 0.0), ColorStop::new(to, 1.0)])
    }

    /// Parses the editor's background string. Anything mentioning
    /// `linear-gradient` that does not yield at least two valid stops
    /// becomes the fallback color.
    pub fn from_css(input: &str) -> Self {
        let trimmed = input.trim();
        if !trimmed.contains("linear-gradient") {
            if trimmed.is_empty() {
                return Background::default();
            }
            return Background::Solid(trimmed.to_string());
        }
        match parse_gradient_stops(trimmed) {
            Some(stops) if stops.len() >= 2 => Background::Gradient(stops),
            _ => {
                tracing::warn!(background = trimmed, "unparseable gradient, using fallback color");
                Background::default()
            }
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Background::Solid(color) => color.clone(),
            Background::Gradient(stops) => {
                let stops = stops
                    .iter()
                    .map(|stop| format!("{} {}%", stop.color, (stop.position * 100.0).round()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("linear-gradient({DEFAULT_ANGLE}, {stops})")
            }
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl Serialize for Background {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Background {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Background::from_css(&raw))
    }
}

/// Returns the valid stops of a `linear-gradient(...)` string, or `None` if
/// the outer pattern does not match. Malformed stops are dropped.
pub fn parse_gradient_stops(input: &str) -> Option<Vec<ColorStop>> {
    let caps = GRADIENT_RE.captures(input)?;
    let body = caps.get(1)?.as_str();
    let stops = split_top_level_commas(body)
        .into_iter()
        .filter_map(|part| {
            let caps = STOP_RE.captures(part.trim())?;
            let color = caps.get(1)?.as_str().trim();
            let percent: u32 = caps.get(2)?.as_str().parse().ok()?;
            Some(ColorStop::new(color, percent as f32 / 100.0))
        })
        .collect();
    Some(stops)
}

// Commas inside `rgba(...)` and friends belong to the color.
fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Background after the image load has settled.
#[derive(Debug, Clone)]
pub enum ResolvedBackground {
    Image(DecodedImage),
    Fill(Background),
    /// The image could not be loaded.
    Fallback,
}

/// Loads the background image if one is set. This is the only blocking
/// stage of a render; failures are absorbed into [`ResolvedBackground::Fallback`].
pub fn resolve_background(settings: &PosterSettings, loader: &dyn ImageLoader) -> ResolvedBackground {
    let Some(source) = settings.image_source() else {
        return ResolvedBackground::Fill(settings.background.clone());
    };
    match loader.load(source) {
        Ok(image) => {
            tracing::debug!(width = image.width, height = image.height, "background image loaded");
            ResolvedBackground::Image(image)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load background image, using fallback color");
            ResolvedBackground::Fallback
        }
    }
}

/// Scale-to-cover placement of an image on the canvas, centered on the
/// overflowing axis.
pub fn cover_rect(image_width: f32, image_height: f32, width: f32, height: f32) -> Rect {
    if image_width <= 0.0 || image_height <= 0.0 {
        return Rect::new(0.0, 0.0, width, height);
    }
    let aspect_ratio = image_width / image_height;
    let canvas_aspect_ratio = width / height;
    if aspect_ratio > canvas_aspect_ratio {
        let draw_width = height * aspect_ratio;
        Rect::new(-(draw_width - width) / 2.0, 0.0, draw_width, height)
    } else {
        let draw_height = width / aspect_ratio;
        Rect::new(0.0, -(draw_height - height) / 2.0, width, draw_height)
    }
}

pub fn paint_background(surface: &mut dyn Surface, resolved: &ResolvedBackground, theme: &PosterTheme) {
    let (width, height) = surface.size();
    let full = Rect::new(0.0, 0.0, width, height);

    match resolved {
        ResolvedBackground::Image(image) => {
            let dest = cover_rect(image.width as f32, image.height as f32, width, height);
            surface.draw_image(image, dest);
        }
        ResolvedBackground::Fill(Background::Solid(color)) => {
            surface.fill_rect(full, &Paint::solid(color.as_str()));
        }
        ResolvedBackground::Fill(Background::Gradient(stops)) if !stops.is_empty() => {
            let gradient = LinearGradient {
                x0: 0.0,
                y0: 0.0,
                x1: width,
                y1: height,
                stops: stops.clone(),
            };
            surface.fill_rect(full, &Paint::LinearGradient(gradient));
        }
        ResolvedBackground::Fill(Background::Gradient(_)) | ResolvedBackground::Fallback => {
            surface.fill_rect(full, &Paint::solid(theme.fallback_background.as_str()));
        }
    }

    surface.fill_rect(
        full,
        &Paint::Solid {
            color: theme.overlay_color.clone(),
            opacity: theme.overlay_opacity,
        },
    );
}
