use serde::{Deserialize, Serialize};

/// Font family stacks offered by the poster editor, as `(value, label)`.
pub const FONT_FAMILIES: [(&str, &str); 7] = [
    ("serif", "Serif"),
    ("sans-serif", "Sans Serif"),
    ("monospace", "Monospace"),
    ("Georgia, serif", "Georgia"),
    ("Arial, sans-serif", "Arial"),
    ("\"Times New Roman\", serif", "Times New Roman"),
    ("\"Courier New\", monospace", "Courier New"),
];

/// Fixed decoration constants applied on top of the user's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterTheme {
    pub app_name: String,
    pub fallback_background: String,
    pub fallback_family: String,
    pub overlay_color: String,
    pub overlay_opacity: f32,
    pub shadow_color: String,
    pub shadow_opacity: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub shadow_blur: f32,
    pub stroke_color: String,
    pub stroke_opacity: f32,
    pub stroke_width: f32,
    pub author_scale: f32,
    pub author_gap: f32,
    pub caption_family: String,
    pub caption_inset: f32,
    pub watermark_text: String,
    pub watermark_size: f32,
    pub watermark_color: String,
    pub watermark_opacity: f32,
    pub attribution_size: f32,
    pub attribution_color: String,
    pub attribution_opacity: f32,
}

impl PosterTheme {
    pub fn aphorize() -> Self {
        Self {
            app_name: "aphorize".to_string(),
            fallback_background: "#1A1A1A".to_string(),
            fallback_family: "serif".to_string(),
            overlay_color: "#000000".to_string(),
            overlay_opacity: 0.3,
            shadow_color: "#000000".to_string(),
            shadow_opacity: 0.8,
            shadow_offset_x: 2.0,
            shadow_offset_y: 2.0,
            shadow_blur: 10.0,
            stroke_color: "#000000".to_string(),
            stroke_opacity: 0.5,
            stroke_width: 2.0,
            author_scale: 0.7,
            author_gap: 0.5,
            caption_family: "sans-serif".to_string(),
            caption_inset: 20.0,
            watermark_text: "Created with Aphorize".to_string(),
            watermark_size: 16.0,
            watermark_color: "#FFFFFF".to_string(),
            watermark_opacity: 0.5,
            attribution_size: 14.0,
            attribution_color: "#FFFFFF".to_string(),
            attribution_opacity: 0.6,
        }
    }

    /// Appends the generic fallback family unless the stack already lists one.
    pub fn font_stack(&self, family: &str) -> String {
        let family = family.trim();
        if family.is_empty() {
            return self.fallback_family.clone();
        }
        if family.contains(',') {
            family.to_string()
        } else {
            format!("{family}, {}", self.fallback_family)
        }
    }
}

impl Default for PosterTheme {
    fn default() -> Self {
        Self::aphorize()
    }
}
