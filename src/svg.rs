use crate::config::TextAlign;
use crate::image_source::DecodedImage;
use crate::surface::{
    FontMetrics, FontSpec, LinearGradient, Paint, Point, Rect, Shadow, StrokeStyle, Surface,
    TextMeasure, TextStyle,
};
use crate::text_metrics;

/// Builds an SVG document from draw calls. Text is measured with the same
/// font metrics the layout uses.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f32,
    height: f32,
    defs: String,
    body: String,
    next_id: usize,
    shadow_filter: Option<String>,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            defs: String::new(),
            body: String::new(),
            next_id: 0,
            shadow_filter: None,
        }
    }

    pub fn finish(self) -> String {
        let (width, height) = (self.width, self.height);
        let mut svg = String::with_capacity(self.defs.len() + self.body.len() + 256);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        if !self.defs.is_empty() {
            svg.push_str("<defs>");
            svg.push_str(&self.defs);
            svg.push_str("</defs>");
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn paint_attrs(&mut self, paint: &Paint) -> String {
        match paint {
            Paint::Solid { color, opacity } => solid_attrs("fill", color, *opacity),
            Paint::LinearGradient(gradient) => {
                let id = self.define_gradient(gradient);
                format!("fill=\"url(#{id})\"")
            }
        }
    }

    fn define_gradient(&mut self, gradient: &LinearGradient) -> String {
        let id = self.next_id("gradient-");
        self.defs.push_str(&format!(
            "<linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\">",
            gradient.x0, gradient.y0, gradient.x1, gradient.y1
        ));
        for stop in &gradient.stops {
            self.defs.push_str(&format!(
                "<stop offset=\"{:.4}\" stop-color=\"{}\"/>",
                stop.position,
                escape_xml(&stop.color)
            ));
        }
        self.defs.push_str("</linearGradient>");
        id
    }

    fn text_element(&self, text: &str, origin: Point, font: &FontSpec, align: TextAlign, paint_attrs: &str) -> String {
        let baseline = origin.y + text_metrics::ascent(font);
        let anchor = match align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let filter = self
            .shadow_filter
            .as_ref()
            .map(|id| format!(" filter=\"url(#{id})\""))
            .unwrap_or_default();
        format!(
            "<text x=\"{:.2}\" y=\"{baseline:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" xml:space=\"preserve\" {paint_attrs}{filter}>{}</text>",
            origin.x,
            escape_xml(&font.family),
            font.size,
            font.weight,
            escape_xml(text)
        )
    }
}

impl TextMeasure for SvgSurface {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        FontMetrics.measure_text(text, font)
    }
}

impl Surface for SvgSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let attrs = self.paint_attrs(paint);
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {attrs}/>",
            rect.x, rect.y, rect.width, rect.height
        ));
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) {
        self.body.push_str(&format!(
            "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
            dest.x,
            dest.y,
            dest.width,
            dest.height,
            image.to_data_url()
        ));
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let attrs = solid_attrs("fill", &style.color, style.opacity);
        let element = self.text_element(text, origin, &style.font, style.align, &attrs);
        self.body.push_str(&element);
    }

    fn stroke_text(&mut self, text: &str, origin: Point, style: &TextStyle, stroke: &StrokeStyle) {
        let attrs = format!(
            "fill=\"none\" {} stroke-width=\"{}\"",
            solid_attrs("stroke", &stroke.color, stroke.opacity),
            stroke.width
        );
        let element = self.text_element(text, origin, &style.font, style.align, &attrs);
        self.body.push_str(&element);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        let Some(shadow) = shadow else {
            self.shadow_filter = None;
            return;
        };
        let id = self.next_id("shadow-");
        // Canvas blur radius is twice the Gaussian standard deviation.
        self.defs.push_str(&format!(
            "<filter id=\"{id}\" filterUnits=\"userSpaceOnUse\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\"><feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{}\"/></filter>",
            self.width,
            self.height,
            shadow.offset_x,
            shadow.offset_y,
            shadow.blur / 2.0,
            escape_xml(&shadow.color),
            shadow.opacity
        ));
        self.shadow_filter = Some(id);
    }
}

fn solid_attrs(property: &str, color: &str, opacity: f32) -> String {
    if opacity >= 1.0 {
        format!("{property}=\"{}\"", escape_xml(color))
    } else {
        format!(
            "{property}=\"{}\" {property}-opacity=\"{opacity}\"",
            escape_xml(color)
        )
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
