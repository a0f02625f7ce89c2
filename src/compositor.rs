use crate::background::resolve_background;
use crate::collab::Attribution;
use crate::config::PosterSettings;
use crate::error::{PosterError, PosterResult};
use crate::image_source::ImageLoader;
use crate::layout::PosterLayout;
use crate::render::compose;
use crate::surface::Surface;
use crate::theme::PosterTheme;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter shared by everything that can start a render. Only the
/// holder of the newest ticket may paint.
#[derive(Debug, Clone, Default)]
pub struct RenderGeneration(Arc<AtomicU64>);

impl RenderGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RenderTicket {
        let generation = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        RenderTicket {
            generation,
            counter: self.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct RenderTicket {
    generation: u64,
    counter: RenderGeneration,
}

impl RenderTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Completed(PosterLayout),
    /// A newer render started while this one was loading its background.
    /// The surface was left untouched.
    Superseded,
}

impl RenderOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RenderOutcome::Completed(_))
    }
}

pub struct Compositor {
    loader: Box<dyn ImageLoader>,
    theme: PosterTheme,
    generation: RenderGeneration,
}

impl Compositor {
    pub fn new(loader: Box<dyn ImageLoader>, theme: PosterTheme) -> Self {
        Self::with_generation(loader, theme, RenderGeneration::new())
    }

    /// Shares `generation` with other renderers, so starting any of them
    /// supersedes renders in flight on all of them.
    pub fn with_generation(
        loader: Box<dyn ImageLoader>,
        theme: PosterTheme,
        generation: RenderGeneration,
    ) -> Self {
        Self {
            loader,
            theme,
            generation,
        }
    }

    /// Handle for invalidating in-flight renders from elsewhere, e.g. when the
    /// settings change again before the current image has loaded.
    pub fn generation(&self) -> &RenderGeneration {
        &self.generation
    }

    pub fn render(
        &self,
        surface: &mut dyn Surface,
        settings: &PosterSettings,
        attribution: Option<&Attribution>,
    ) -> PosterResult<RenderOutcome> {
        self.render_each(&mut [surface], settings, attribution)
    }

    /// Paints the same poster onto every surface with a single image load.
    pub fn render_each(
        &self,
        surfaces: &mut [&mut dyn Surface],
        settings: &PosterSettings,
        attribution: Option<&Attribution>,
    ) -> PosterResult<RenderOutcome> {
        settings.validate()?;
        if surfaces.is_empty() {
            return Err(PosterError::validation("no surface to render onto"));
        }
        let ticket = self.generation.begin();
        let _span = tracing::debug_span!("render", generation = ticket.generation()).entered();

        let background = resolve_background(settings, self.loader.as_ref());
        if !ticket.is_current() {
            tracing::debug!(
                generation = ticket.generation(),
                current = self.generation.current(),
                "render superseded, discarding"
            );
            return Ok(RenderOutcome::Superseded);
        }

        let mut layout = None;
        for surface in surfaces.iter_mut() {
            let drawn = compose(&mut **surface, settings, &background, attribution, &self.theme);
            layout.get_or_insert(drawn);
        }
        layout
            .map(RenderOutcome::Completed)
            .ok_or_else(|| PosterError::validation("no surface to render onto"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::DecodedImage;
    use crate::image_source::tests::png_bytes;
    use crate::surface::RecordingSurface;

    /// Starts a newer render while "loading", like a second settings change
    /// arriving before the first image is ready.
    struct InterruptingLoader(RenderGeneration);

    impl ImageLoader for InterruptingLoader {
        fn load(&self, _source: &str) -> PosterResult<DecodedImage> {
            self.0.begin();
            DecodedImage::from_bytes(png_bytes(2, 2))
        }
    }

    struct FailingLoader;

    impl ImageLoader for FailingLoader {
        fn load(&self, source: &str) -> PosterResult<DecodedImage> {
            Err(PosterError::image(format!("unreachable: {source}")))
        }
    }

    #[test]
    fn tickets_increase_and_only_newest_is_current() {
        let generation = RenderGeneration::new();
        let first = generation.begin();
        let second = generation.begin();
        assert!(second.generation() > first.generation());
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn stale_render_leaves_surface_untouched() {
        let generation = RenderGeneration::new();
        let compositor = Compositor::with_generation(
            Box::new(InterruptingLoader(generation.clone())),
            PosterTheme::aphorize(),
            generation,
        );

        let mut settings = PosterSettings::with_quote("Hello");
        settings.image_url = Some("mem://photo".to_string());
        let mut surface = RecordingSurface::with_fixed_advance(1080.0, 1080.0, 10.0);
        let outcome = compositor.render(&mut surface, &settings, None).unwrap();
        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn render_without_image_never_waits() {
        let compositor = Compositor::new(Box::new(FailingLoader), PosterTheme::aphorize());
        let mut surface = RecordingSurface::with_fixed_advance(1080.0, 1080.0, 10.0);
        let outcome = compositor
            .render(&mut surface, &PosterSettings::with_quote("Hello"), None)
            .unwrap();
        assert!(outcome.is_completed());
        assert!(surface.texts().contains(&"\"Hello\""));
    }

    #[test]
    fn failed_image_still_renders_text() {
        let compositor = Compositor::new(Box::new(FailingLoader), PosterTheme::aphorize());
        let mut settings = PosterSettings::with_quote("Hello");
        settings.image_url = Some("https://invalid.example/none.jpg".to_string());
        let mut surface = RecordingSurface::with_fixed_advance(1080.0, 1080.0, 10.0);
        let outcome = compositor.render(&mut surface, &settings, None).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(
            surface.texts(),
            vec!["\"Hello\"", "Created with Aphorize"]
        );
    }

    #[test]
    fn empty_quote_is_rejected_before_drawing() {
        let compositor = Compositor::new(Box::new(FailingLoader), PosterTheme::aphorize());
        let mut surface = RecordingSurface::new(100.0, 100.0);
        let err = compositor
            .render(&mut surface, &PosterSettings::default(), None)
            .unwrap_err();
        assert!(matches!(err, PosterError::Validation(_)));
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn render_each_shares_one_image_load() {
        use crate::svg::SvgSurface;
        use std::sync::atomic::AtomicUsize;

        struct CountingLoader(Arc<AtomicUsize>);

        impl ImageLoader for CountingLoader {
            fn load(&self, _source: &str) -> PosterResult<DecodedImage> {
                self.0.fetch_add(1, Ordering::SeqCst);
                DecodedImage::from_bytes(png_bytes(4, 3))
            }
        }

        let loads = Arc::new(AtomicUsize::new(0));
        let compositor = Compositor::new(
            Box::new(CountingLoader(loads.clone())),
            PosterTheme::aphorize(),
        );
        let mut settings = PosterSettings::with_quote("Twice");
        settings.image_url = Some("mem://photo".to_string());
        let mut svg = SvgSurface::new(400.0, 300.0);
        let mut recording = RecordingSurface::new(400.0, 300.0);
        let mut surfaces: [&mut dyn Surface; 2] = [&mut svg, &mut recording];
        let outcome = compositor.render_each(&mut surfaces, &settings, None).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(svg.finish().contains("<image"));
        assert!(matches!(recording.ops()[0], crate::surface::DrawOp::DrawImage { .. }));
    }

    #[test]
    fn compositor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compositor>();
    }
}
