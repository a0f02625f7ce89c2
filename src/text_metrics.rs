use crate::surface::FontSpec;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

const FALLBACK_ASCENT: f32 = 0.8;

pub fn measure_text_width(text: &str, font_size: f32, font_family: &str, weight: u16) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family, weight)
}

/// Width from installed fonts, or from the calibrated per-character table
/// when no matching face can be loaded.
pub fn text_width(text: &str, font: &FontSpec) -> f32 {
    measure_text_width(text, font.size, &font.family, font.weight)
        .unwrap_or_else(|| fallback_text_width(text, font.size))
}

/// Distance from the top of the em box to the alphabetic baseline.
pub fn ascent(font: &FontSpec) -> f32 {
    let ratio = TEXT_MEASURER
        .lock()
        .ok()
        .and_then(|mut guard| guard.ascent_ratio(&font.family, font.weight))
        .unwrap_or(FALLBACK_ASCENT);
    ratio * font.size
}

pub fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Approximate advance of `ch` at 1px in a proportional serif or sans face.
pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | 'I' => 0.25,
        ' ' | 't' => 0.31,
        '.' | ',' | ':' | ';' | '!' | '|' | '\\' | '\'' => 0.32,
        '(' | ')' | '[' | ']' | '{' | '}' | 'f' | 'r' => 0.35,
        '"' | '1' => 0.4,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '@' | '#' | '%' | '&' | '\u{2014}' => 0.95,
        'a'..='z' => 0.57,
        'A'..='Z' => 0.67,
        '0'..='9' => 0.6,
        _ => 0.57,
    }
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<(String, u16), Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn face(&mut self, font_family: &str, weight: u16) -> Option<&mut FontFace> {
        let key = (normalize_family_key(font_family), weight);
        if !self.cache.contains_key(&key) {
            let face = self.load_face(font_family, weight);
            self.cache.insert(key.clone(), face);
        }
        self.cache.get_mut(&key).and_then(|face| face.as_mut())
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str, weight: u16) -> Option<f32> {
        let face = self.face(font_family, weight)?;
        let normalized = text.replace('\t', "    ");
        face.measure_width(&normalized, font_size)
    }

    fn ascent_ratio(&mut self, font_family: &str, weight: u16) -> Option<f32> {
        self.face(font_family, weight).map(|face| face.ascent_ratio)
    }

    fn load_face(&mut self, font_family: &str, weight: u16) -> Option<FontFace> {
        let stack = parse_family_stack(font_family);
        let families: Vec<Family<'_>> = stack.iter().map(FamilyName::as_family).collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let id = self.db.query(&Query {
            families: &families,
            weight: Weight(weight),
            stretch: Stretch::Normal,
            style: Style::Normal,
        })?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

enum FamilyName {
    Generic(Family<'static>),
    Named(String),
}

impl FamilyName {
    fn as_family(&self) -> Family<'_> {
        match self {
            FamilyName::Generic(family) => *family,
            FamilyName::Named(name) => Family::Name(name),
        }
    }
}

/// Splits a CSS family list. Unknown names are kept for lookup; an empty
/// list resolves to the generic serif family.
fn parse_family_stack(font_family: &str) -> Vec<FamilyName> {
    let mut stack: Vec<FamilyName> = font_family
        .split(',')
        .map(|part| part.trim().trim_matches(|ch| ch == '"' || ch == '\''))
        .filter(|name| !name.is_empty())
        .map(|name| match name.to_ascii_lowercase().as_str() {
            "serif" => FamilyName::Generic(Family::Serif),
            "sans-serif" | "system-ui" => FamilyName::Generic(Family::SansSerif),
            "monospace" => FamilyName::Generic(Family::Monospace),
            "cursive" => FamilyName::Generic(Family::Cursive),
            "fantasy" => FamilyName::Generic(Family::Fantasy),
            _ => FamilyName::Named(name.to_string()),
        })
        .collect();
    if stack.is_empty() {
        stack.push(FamilyName::Generic(Family::Serif));
    }
    stack
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascent_ratio: f32,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;
        let em_height = ascender - descender;
        let ascent_ratio = if em_height > 0.0 {
            ascender / em_height
        } else {
            FALLBACK_ASCENT
        };
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascent_ratio,
            ascii_advances,
            advance_cache: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;

        if text.is_ascii() {
            let width: f32 = text
                .bytes()
                .filter(|byte| *byte != b'\n')
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => advance as f32 * scale,
                })
                .sum();
            return Some(width.max(0.0));
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = *self.advance_cache.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(advance) => advance as f32 * scale,
                None => fallback,
            };
        }
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_glyphs_are_narrower_than_wide_ones() {
        assert!(char_width_factor('i') < char_width_factor('a'));
        assert!(char_width_factor('a') < char_width_factor('W'));
        assert!(char_width_factor('\u{4e2d}') > 0.0);
    }

    #[test]
    fn family_stack_keeps_names_and_generics() {
        let stack = parse_family_stack("\"Times New Roman\", serif");
        assert!(matches!(&stack[0], FamilyName::Named(name) if name == "Times New Roman"));
        assert!(matches!(stack[1], FamilyName::Generic(Family::Serif)));
        assert!(matches!(parse_family_stack(" , ")[..], [FamilyName::Generic(Family::Serif)]));
    }

    #[test]
    fn fallback_width_is_linear_in_size() {
        let small = fallback_text_width("Carpe diem", 24.0);
        let large = fallback_text_width("Carpe diem", 48.0);
        assert!((large - 2.0 * small).abs() < 0.01);
    }

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(measure_text_width("", 48.0, "serif", 700), Some(0.0));
    }

    #[test]
    fn text_width_grows_with_text() {
        let font = FontSpec::new("serif", 400, 24.0);
        let short = text_width("Stay", &font);
        let long = text_width("Stay hungry", &font);
        assert!(long > short);
    }

    #[test]
    fn ascent_is_within_em_box() {
        let font = FontSpec::new("sans-serif", 400, 20.0);
        let ascent = ascent(&font);
        assert!(ascent > 0.0 && ascent <= 20.0, "ascent {ascent}");
    }
}
