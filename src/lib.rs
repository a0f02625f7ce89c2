pub mod background;
#[cfg(feature = "cli")]
pub mod cli;
pub mod collab;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod image_source;
pub mod layout;
pub mod render;
pub mod store;
pub mod surface;
pub mod svg;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

pub use background::{Background, ColorStop};
pub use collab::Attribution;
pub use compositor::{Compositor, RenderGeneration, RenderOutcome};
pub use config::{Config, FontWeight, PosterSettings, RenderConfig, TextAlign};
pub use error::{PosterError, PosterResult};
pub use image_source::{DefaultImageLoader, ImageLoader};
pub use layout::PosterLayout;
pub use surface::{RecordingSurface, Surface};
pub use svg::SvgSurface;
pub use theme::PosterTheme;

/// Everything besides the settings that shapes a rendered poster.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: PosterTheme,
    pub render: RenderConfig,
    pub attribution: Option<Attribution>,
}

impl RenderOptions {
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.render.width = width;
        self.render.height = height;
        self
    }
}

/// Renders settings to an SVG document, loading any background image with
/// the default loader.
pub fn render_with_options(settings: &PosterSettings, options: RenderOptions) -> PosterResult<String> {
    let compositor = Compositor::new(Box::new(DefaultImageLoader::new()?), options.theme);
    let mut surface = SvgSurface::new(options.render.width, options.render.height);
    match compositor.render(&mut surface, settings, options.attribution.as_ref())? {
        RenderOutcome::Completed(_) => Ok(surface.finish()),
        RenderOutcome::Superseded => Err(anyhow::anyhow!("render was superseded").into()),
    }
}

/// Renders settings given as JSON (or JSON5) with default options.
pub fn render_poster_svg(settings_json: &str) -> PosterResult<String> {
    let settings = config::parse_settings(settings_json)?;
    render_with_options(&settings, RenderOptions::default())
}
