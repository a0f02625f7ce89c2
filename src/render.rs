use crate::background::{ResolvedBackground, paint_background};
use crate::collab::Attribution;
use crate::config::{PosterSettings, TextAlign};
use crate::error::PosterResult;
use crate::layout::{PosterLayout, compute_layout};
use crate::surface::{FontSpec, Point, Shadow, StrokeStyle, Surface, TextStyle};
use crate::svg::SvgSurface;
use crate::theme::PosterTheme;
use std::path::Path;

/// Paints one poster onto `surface`: background, overlay, quote and author,
/// then the watermark and photo caption. Returns the layout that was drawn.
pub fn compose(
    surface: &mut dyn Surface,
    settings: &PosterSettings,
    background: &ResolvedBackground,
    attribution: Option<&Attribution>,
    theme: &PosterTheme,
) -> PosterLayout {
    let (width, height) = surface.size();
    let _span = tracing::debug_span!("compose", width, height).entered();

    paint_background(surface, background, theme);
    let layout = compute_layout(settings, &*surface, width, height, theme);
    tracing::debug!(
        quote_lines = layout.quote.lines.len(),
        author_lines = layout.author.as_ref().map_or(0, |block| block.lines.len()),
        "layout computed"
    );
    draw_text(surface, settings, &layout, theme);
    draw_overlays(surface, settings, attribution, theme);
    layout
}

pub fn draw_text(
    surface: &mut dyn Surface,
    settings: &PosterSettings,
    layout: &PosterLayout,
    theme: &PosterTheme,
) {
    if settings.text_shadow {
        surface.set_shadow(Some(Shadow {
            color: theme.shadow_color.clone(),
            opacity: theme.shadow_opacity,
            offset_x: theme.shadow_offset_x,
            offset_y: theme.shadow_offset_y,
            blur: theme.shadow_blur,
        }));
    }
    let stroke = settings.text_stroke.then(|| StrokeStyle {
        color: theme.stroke_color.clone(),
        opacity: theme.stroke_opacity,
        width: theme.stroke_width,
    });

    let blocks = std::iter::once(&layout.quote).chain(layout.author.as_ref());
    for block in blocks {
        let style = TextStyle {
            font: block.font.clone(),
            align: layout.align,
            color: settings.text_color.clone(),
            opacity: 1.0,
        };
        for (line, origin) in block.placed_lines(layout.anchor_x) {
            surface.fill_text(line, origin, &style);
            if let Some(stroke) = &stroke {
                surface.stroke_text(line, origin, &style, stroke);
            }
        }
    }

    surface.set_shadow(None);
}

/// Watermark bottom-right, photo credit bottom-left. Never shadowed.
pub fn draw_overlays(
    surface: &mut dyn Surface,
    settings: &PosterSettings,
    attribution: Option<&Attribution>,
    theme: &PosterTheme,
) {
    let (width, height) = surface.size();
    surface.set_shadow(None);

    if settings.watermark {
        let style = TextStyle {
            font: FontSpec::new(theme.caption_family.as_str(), 400, theme.watermark_size),
            align: TextAlign::Right,
            color: theme.watermark_color.clone(),
            opacity: theme.watermark_opacity,
        };
        surface.fill_text(
            &theme.watermark_text,
            Point::new(width - theme.caption_inset, height - theme.caption_inset),
            &style,
        );
    }

    if let Some(attribution) = attribution {
        let style = TextStyle {
            font: FontSpec::new(theme.caption_family.as_str(), 400, theme.attribution_size),
            align: TextAlign::Left,
            color: theme.attribution_color.clone(),
            opacity: theme.attribution_opacity,
        };
        surface.fill_text(
            &attribution.caption(),
            Point::new(theme.caption_inset, height - theme.caption_inset),
            &style,
        );
    }
}

/// Composes onto a fresh SVG canvas of the given size.
pub fn render_svg(
    settings: &PosterSettings,
    background: &ResolvedBackground,
    attribution: Option<&Attribution>,
    theme: &PosterTheme,
    width: f32,
    height: f32,
) -> String {
    let mut surface = SvgSurface::new(width, height);
    compose(&mut surface, settings, background, attribution, theme);
    surface.finish()
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> PosterResult<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterizes an SVG poster to PNG bytes. `Ok(None)` means no canvas could be
/// allocated for the requested size.
#[cfg(feature = "png")]
pub fn rasterize_png(svg: &str, width: f32, height: f32) -> PosterResult<Option<Vec<u8>>> {
    use crate::error::PosterError;

    let mut opt = usvg::Options::default();
    opt.font_family = "serif".to_string();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(width, height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| PosterError::raster(err.to_string()))?;
    let size = tree.size().to_int_size();
    let Some(mut pixmap) = resvg::tiny_skia::Pixmap::new(size.width(), size.height()) else {
        return Ok(None);
    };
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());
    let png = pixmap
        .encode_png()
        .map_err(|err| PosterError::raster(err.to_string()))?;
    Ok(Some(png))
}
