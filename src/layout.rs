use crate::config::{PosterSettings, TextAlign};
use crate::surface::{FontSpec, Point, TextMeasure};
use crate::theme::PosterTheme;
use serde::Serialize;

/// Greedy word wrap. Words are separated by single spaces; a word that does
/// not fit on an empty line is kept whole and overflows. The last line is
/// always emitted, so empty input yields one empty line.
pub fn wrap_lines(text: &str, max_width: f32, mut measure: impl FnMut(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut words_on_line = 0usize;

    for word in text.split(' ').filter(|word| !word.is_empty()) {
        let candidate = if words_on_line == 0 {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) > max_width && words_on_line > 0 {
            lines.push(current.trim().to_string());
            current = word.to_string();
            words_on_line = 1;
        } else {
            current = candidate;
            words_on_line += 1;
        }
    }
    lines.push(current.trim().to_string());
    lines
}

/// Wraps each `\n`-separated paragraph on its own.
pub fn wrap_paragraphs(text: &str, max_width: f32, mut measure: impl FnMut(&str) -> f32) -> Vec<String> {
    text.split('\n')
        .flat_map(|paragraph| wrap_lines(paragraph.trim_end_matches('\r'), max_width, &mut measure))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font: FontSpec,
    /// Distance between consecutive line tops.
    pub line_height: f32,
    /// Top of the first line.
    pub top: f32,
}

impl TextBlock {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height()
    }

    pub fn placed_lines(&self, anchor_x: f32) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.lines.iter().enumerate().map(move |(idx, line)| {
            (
                line.as_str(),
                Point::new(anchor_x, self.top + idx as f32 * self.line_height),
            )
        })
    }
}

/// Where every quote and author line goes on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosterLayout {
    pub align: TextAlign,
    pub anchor_x: f32,
    pub wrap_width: f32,
    pub total_height: f32,
    pub quote: TextBlock,
    pub author: Option<TextBlock>,
}

pub fn quote_font(settings: &PosterSettings, theme: &PosterTheme) -> FontSpec {
    FontSpec::new(
        theme.font_stack(&settings.font_family),
        settings.font_weight.value(),
        settings.font_size,
    )
}

pub fn author_font(settings: &PosterSettings, theme: &PosterTheme) -> FontSpec {
    FontSpec::new(
        theme.font_stack(&settings.font_family),
        settings.font_weight.value(),
        settings.font_size * theme.author_scale,
    )
}

pub fn quote_display_text(settings: &PosterSettings) -> String {
    if settings.show_quotes {
        format!("\"{}\"", settings.quote_text)
    } else {
        settings.quote_text.clone()
    }
}

pub fn author_display_text(settings: &PosterSettings) -> Option<String> {
    let author = settings.author_name()?;
    Some(if settings.show_punctuation {
        format!("\u{2014} {author}")
    } else {
        author.to_string()
    })
}

pub fn anchor_x(settings: &PosterSettings, width: f32) -> f32 {
    let base = match settings.text_align {
        TextAlign::Left => settings.padding,
        TextAlign::Center => width / 2.0,
        TextAlign::Right => width - settings.padding,
    };
    base + settings.horizontal_offset()
}

/// Wraps quote and author with their own fonts and centers the combined
/// block vertically before applying the user's offsets.
pub fn compute_layout<M: TextMeasure + ?Sized>(
    settings: &PosterSettings,
    measure: &M,
    width: f32,
    height: f32,
    theme: &PosterTheme,
) -> PosterLayout {
    let mut wrap_width = settings.wrap_width(width);
    if !(wrap_width > 0.0) {
        tracing::warn!(wrap_width, padding = settings.padding, "wrap width not positive, clamping to 1px");
        wrap_width = 1.0;
    }

    let quote_font = quote_font(settings, theme);
    let quote_lines = wrap_paragraphs(&quote_display_text(settings), wrap_width, |text| {
        measure.measure_text(text, &quote_font)
    });
    let quote_line_height = settings.font_size * settings.line_height;

    let author_font = author_font(settings, theme);
    let author_lines = author_display_text(settings)
        .map(|text| wrap_lines(&text, wrap_width, |line| measure.measure_text(line, &author_font)))
        .unwrap_or_default();
    let author_line_height = author_font.size * settings.line_height;

    let author_gap = quote_line_height * theme.author_gap;
    let mut total_height = quote_lines.len() as f32 * quote_line_height;
    if !author_lines.is_empty() {
        total_height += author_lines.len() as f32 * author_line_height + author_gap;
    }

    let start_y = (height - total_height) / 2.0 + settings.vertical_offset();
    let quote = TextBlock {
        lines: quote_lines,
        font: quote_font,
        line_height: quote_line_height,
        top: start_y,
    };
    let author = (!author_lines.is_empty()).then(|| TextBlock {
        lines: author_lines,
        font: author_font,
        line_height: author_line_height,
        top: quote.bottom() + author_gap,
    });

    PosterLayout {
        align: settings.text_align,
        anchor_x: anchor_x(settings, width),
        wrap_width,
        total_height,
        quote,
        author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::FixedAdvance;

    fn fixed(advance: f32) -> impl FnMut(&str) -> f32 {
        move |text: &str| text.chars().count() as f32 * advance
    }

    #[test]
    fn wrap_lines_does_not_wrap_short_text() {
        assert_eq!(wrap_lines("short text", 1000.0, fixed(10.0)), vec!["short text"]);
    }

    #[test]
    fn wrap_lines_breaks_greedily() {
        // "aaa bbb" is 70px, over the 60px limit.
        let lines = wrap_lines("aaa bbb ccc", 60.0, fixed(10.0));
        assert_eq!(lines, vec!["aaa", "bbb", "ccc"]);
        let lines = wrap_lines("aa bb cc dd", 50.0, fixed(10.0));
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn overlong_word_stays_whole() {
        let token = "x".repeat(40);
        let lines = wrap_lines(&format!("a {token} b"), 100.0, fixed(10.0));
        assert_eq!(lines, vec!["a".to_string(), token, "b".to_string()]);
    }

    #[test]
    fn empty_text_yields_single_empty_line() {
        assert_eq!(wrap_lines("", 100.0, fixed(10.0)), vec![String::new()]);
        assert_eq!(wrap_lines("   ", 100.0, fixed(10.0)), vec![String::new()]);
    }

    #[test]
    fn runs_of_spaces_collapse() {
        assert_eq!(wrap_lines("a  b", 100.0, fixed(10.0)), vec!["a b"]);
    }

    #[test]
    fn wrap_paragraphs_honors_newlines() {
        let lines = wrap_paragraphs("one two\nthree", 1000.0, fixed(10.0));
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn author_is_measured_with_author_font() {
        let theme = PosterTheme::aphorize();
        let mut settings = PosterSettings::with_quote("q");
        settings.author = Some("Marcus Aurelius".to_string());
        let layout = compute_layout(&settings, &FixedAdvance(10.0), 1080.0, 1080.0, &theme);
        let author = layout.author.unwrap();
        assert!((author.font.size - 48.0 * 0.7).abs() < 1e-4);
        assert_eq!(author.lines, vec!["\u{2014} Marcus Aurelius"]);
    }

    #[test]
    fn block_is_centered_then_offset() {
        let theme = PosterTheme::aphorize();
        let mut settings = PosterSettings::with_quote("Hello");
        settings.show_quotes = false;
        let layout = compute_layout(&settings, &FixedAdvance(10.0), 1080.0, 1080.0, &theme);
        let pitch = 48.0 * 1.4;
        assert!((layout.total_height - pitch).abs() < 1e-4);
        assert!((layout.quote.top - (1080.0 - pitch) / 2.0).abs() < 1e-4);

        settings.vertical_position = Some(-100.0);
        settings.horizontal_position = Some(30.0);
        let moved = compute_layout(&settings, &FixedAdvance(10.0), 1080.0, 1080.0, &theme);
        assert!((moved.quote.top - (layout.quote.top - 100.0)).abs() < 1e-4);
        assert_eq!(moved.anchor_x, 570.0);
    }

    #[test]
    fn anchor_follows_alignment() {
        let mut settings = PosterSettings::with_quote("q");
        settings.text_align = TextAlign::Left;
        assert_eq!(anchor_x(&settings, 1080.0), 80.0);
        settings.text_align = TextAlign::Right;
        assert_eq!(anchor_x(&settings, 1080.0), 1000.0);
        settings.text_align = TextAlign::Center;
        assert_eq!(anchor_x(&settings, 1080.0), 540.0);
    }

    #[test]
    fn non_positive_wrap_width_is_clamped() {
        let theme = PosterTheme::aphorize();
        let mut settings = PosterSettings::with_quote("two words");
        settings.padding = 600.0;
        let layout = compute_layout(&settings, &FixedAdvance(10.0), 1080.0, 1080.0, &theme);
        assert_eq!(layout.wrap_width, 1.0);
        assert_eq!(layout.quote.lines, vec!["\"two", "words\""]);
    }
}
