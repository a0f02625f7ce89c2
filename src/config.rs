use crate::background::Background;
use crate::error::{PosterError, PosterResult};
use crate::theme::PosterTheme;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const FONT_SIZE_RANGE: (f32, f32) = (24.0, 120.0);
pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 2.0);
pub const PADDING_RANGE: (f32, f32) = (20.0, 200.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    Normal,
    Medium,
    SemiBold,
    #[default]
    Bold,
    ExtraBold,
}

impl FontWeight {
    pub const ALL: [FontWeight; 5] = [
        FontWeight::Normal,
        FontWeight::Medium,
        FontWeight::SemiBold,
        FontWeight::Bold,
        FontWeight::ExtraBold,
    ];

    pub fn value(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Medium => 500,
            FontWeight::SemiBold => 600,
            FontWeight::Bold => 700,
            FontWeight::ExtraBold => 800,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FontWeight::Normal => "Normal",
            FontWeight::Medium => "Medium",
            FontWeight::SemiBold => "Semi Bold",
            FontWeight::Bold => "Bold",
            FontWeight::ExtraBold => "Extra Bold",
        }
    }

    pub fn from_value(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|weight| weight.value() == value)
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u16>() {
            return Self::from_value(value)
                .ok_or_else(|| format!("unsupported font weight {value} (expected 400-800)"));
        }
        let lower = trimmed.to_ascii_lowercase().replace(['-', '_', ' '], "");
        Self::ALL
            .into_iter()
            .find(|weight| weight.label().to_ascii_lowercase().replace(' ', "") == lower)
            .ok_or_else(|| format!("unknown font weight '{trimmed}'"))
    }
}

// Persisted as a string ("700") the way the editor stored it.
impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value().to_string())
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WeightRepr {
            Number(u16),
            Text(String),
        }

        match WeightRepr::deserialize(deserializer)? {
            WeightRepr::Number(value) => Self::from_value(value).ok_or_else(|| {
                serde::de::Error::custom(format!("unsupported font weight {value}"))
            }),
            WeightRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Ok(TextAlign::Left),
            "center" | "middle" => Ok(TextAlign::Center),
            "right" | "end" => Ok(TextAlign::Right),
            other => Err(format!("unknown text alignment '{other}'")),
        }
    }
}

/// Everything the user can edit about a poster. Fields missing from JSON take
/// the editor defaults, so an explicit `false` is always kept as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterSettings {
    pub quote_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub padding: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_position: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_position: Option<f32>,
    pub text_color: String,
    #[serde(rename = "backgroundColor")]
    pub background: Background,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub text_shadow: bool,
    pub text_stroke: bool,
    pub watermark: bool,
    pub show_quotes: bool,
    pub show_punctuation: bool,
}

impl Default for PosterSettings {
    fn default() -> Self {
        Self {
            quote_text: String::new(),
            author: None,
            font_family: "serif".to_string(),
            font_size: 48.0,
            font_weight: FontWeight::Bold,
            text_align: TextAlign::Center,
            line_height: 1.4,
            padding: 80.0,
            max_width: None,
            vertical_position: None,
            horizontal_position: None,
            text_color: "#FFFFFF".to_string(),
            background: Background::default(),
            image_url: None,
            text_shadow: true,
            text_stroke: false,
            watermark: true,
            show_quotes: true,
            show_punctuation: true,
        }
    }
}

impl PosterSettings {
    pub fn with_quote(quote: impl Into<String>) -> Self {
        Self {
            quote_text: quote.into(),
            ..Default::default()
        }
    }

    /// Author name if one was entered; blank input counts as no author.
    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn image_source(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn vertical_offset(&self) -> f32 {
        self.vertical_position.unwrap_or(0.0)
    }

    pub fn horizontal_offset(&self) -> f32 {
        self.horizontal_position.unwrap_or(0.0)
    }

    /// `min(maxWidth, canvas_width - 2 * padding)`; not yet clamped to a positive value.
    pub fn wrap_width(&self, canvas_width: f32) -> f32 {
        let available = canvas_width - self.padding * 2.0;
        match self.max_width {
            Some(max) => max.min(available),
            None => available,
        }
    }

    pub fn validate(&self) -> PosterResult<()> {
        if self.quote_text.trim().is_empty() {
            return Err(PosterError::validation("quote text is required"));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(PosterError::validation(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(PosterError::validation(format!(
                "line height must be positive, got {}",
                self.line_height
            )));
        }
        if !self.padding.is_finite() {
            return Err(PosterError::validation(format!(
                "padding must be finite, got {}",
                self.padding
            )));
        }
        for (name, value) in [
            ("max width", self.max_width),
            ("vertical position", self.vertical_position),
            ("horizontal position", self.horizontal_position),
        ] {
            if let Some(value) = value.filter(|value| !value.is_finite()) {
                return Err(PosterError::validation(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Applies the bounds of the editor's sliders.
    pub fn clamp_to_editor_ranges(&mut self) {
        self.font_size = self.font_size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        self.line_height = self.line_height.clamp(LINE_HEIGHT_RANGE.0, LINE_HEIGHT_RANGE.1);
        self.padding = self.padding.clamp(PADDING_RANGE.0, PADDING_RANGE.1);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: PosterTheme,
    pub render: RenderConfig,
}

/// Reads a settings file. Strict JSON is tried first, then JSON5 for
/// hand-written files with comments or trailing commas.
pub fn load_settings_file(path: &Path) -> PosterResult<PosterSettings> {
    let contents = std::fs::read_to_string(path)?;
    parse_settings(&contents)
}

pub fn parse_settings(contents: &str) -> PosterResult<PosterSettings> {
    match serde_json::from_str::<PosterSettings>(contents) {
        Ok(settings) => Ok(settings),
        Err(json_err) => json5::from_str::<PosterSettings>(contents).map_err(|json5_err| {
            PosterError::validation(format!(
                "invalid settings: {json_err} (json5: {json5_err})"
            ))
        }),
    }
}
