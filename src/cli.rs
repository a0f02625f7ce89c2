use crate::background::Background;
use crate::collab::Attribution;
use crate::compositor::{Compositor, RenderOutcome};
use crate::config::{Config, FontWeight, PosterSettings, TextAlign, load_settings_file};
use crate::export::save_download;
use crate::image_source::{DefaultImageLoader, file_to_data_url};
use crate::render::write_output_svg;
use crate::store::{
    FileStore, KeyValueStore, SETTINGS_KEY, load_settings, put_pending_quote, save_settings,
    take_pending_quote,
};
use crate::surface::{RecordingSurface, Surface};
use crate::svg::SvgSurface;
use crate::theme::FONT_FAMILIES;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "aphorize", version, about = "Compose quote posters from text, color and images")]
pub struct Cli {
    /// Key/value store file (defaults to the user config directory)
    #[arg(long = "store", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a poster
    Render(RenderArgs),
    /// Queue a quote for the next render
    QueueQuote {
        /// Quote text
        text: String,
    },
    /// Inspect or clear the saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// List font family and weight presets
    Presets,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SettingsAction {
    Show,
    Reset,
}

#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Settings file (JSON or JSON5). Defaults to the last saved settings.
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,

    #[arg(short = 'q', long = "quote")]
    pub quote: Option<String>,

    #[arg(short = 'a', long = "author")]
    pub author: Option<String>,

    #[arg(long = "font-family")]
    pub font_family: Option<String>,

    #[arg(long = "font-size")]
    pub font_size: Option<f32>,

    /// 400-800 or a label such as "semi bold"
    #[arg(long = "font-weight")]
    pub font_weight: Option<FontWeight>,

    #[arg(long = "align")]
    pub align: Option<TextAlign>,

    #[arg(long = "line-height")]
    pub line_height: Option<f32>,

    #[arg(long = "padding")]
    pub padding: Option<f32>,

    #[arg(long = "max-width")]
    pub max_width: Option<f32>,

    /// Vertical offset in px (negative moves up)
    #[arg(long = "vertical", allow_hyphen_values = true)]
    pub vertical: Option<f32>,

    /// Horizontal offset in px (negative moves left)
    #[arg(long = "horizontal", allow_hyphen_values = true)]
    pub horizontal: Option<f32>,

    #[arg(long = "text-color")]
    pub text_color: Option<String>,

    /// Solid color or linear-gradient(...) string
    #[arg(long = "background")]
    pub background: Option<String>,

    /// Background image: data URL, http(s) URL, file:// URL or path
    #[arg(long = "image", conflicts_with = "upload")]
    pub image: Option<String>,

    /// Local image file, embedded as a data URL
    #[arg(long = "upload")]
    pub upload: Option<PathBuf>,

    /// Photographer credited under the poster
    #[arg(long = "photographer")]
    pub photographer: Option<String>,

    #[arg(long = "photographer-url", requires = "photographer")]
    pub photographer_url: Option<String>,

    #[arg(long = "shadow")]
    pub shadow: Option<bool>,

    #[arg(long = "stroke")]
    pub stroke: Option<bool>,

    #[arg(long = "watermark")]
    pub watermark: Option<bool>,

    #[arg(long = "show-quotes")]
    pub show_quotes: Option<bool>,

    #[arg(long = "show-punctuation")]
    pub show_punctuation: Option<bool>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1080.0, value_parser = parse_dimension)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 1080.0, value_parser = parse_dimension)]
    pub height: f32,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "png")]
    pub output_format: OutputFormat,

    /// Output file, or directory for PNG downloads. SVG goes to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also write the draw list as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// Do not save the settings for the next session
    #[arg(long = "no-save")]
    pub no_save: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    Svg,
    #[default]
    Png,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let store_path = match cli.store {
        Some(path) => path,
        None => FileStore::default_path()?,
    };
    let store = FileStore::new(store_path);

    match cli.command {
        Command::Render(args) => render(&store, &args),
        Command::QueueQuote { text } => {
            if text.trim().is_empty() {
                anyhow::bail!("quote text is empty");
            }
            put_pending_quote(&store, &text)?;
            tracing::info!(path = %store.path().display(), "quote queued");
            Ok(())
        }
        Command::Settings { action } => settings(&store, action),
        Command::Presets => {
            println!("Font families:");
            for (stack, label) in FONT_FAMILIES {
                println!("  {label:<16} {stack}");
            }
            println!("Font weights:");
            for weight in FontWeight::ALL {
                println!("  {:<16} {}", weight.label(), weight.value());
            }
            Ok(())
        }
    }
}

fn settings(store: &dyn KeyValueStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = load_settings(store);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Reset => {
            store.remove(SETTINGS_KEY)?;
        }
    }
    Ok(())
}

fn parse_dimension(value: &str) -> std::result::Result<f32, String> {
    let size: f32 = value.parse().map_err(|err| format!("{err}"))?;
    if size.is_finite() && size >= 1.0 {
        Ok(size)
    } else {
        Err(format!("canvas size must be at least 1px, got {value}"))
    }
}

fn render(store: &dyn KeyValueStore, args: &RenderArgs) -> Result<()> {
    anyhow::ensure!(
        args.width.is_finite() && args.width >= 1.0 && args.height.is_finite() && args.height >= 1.0,
        "canvas size must be at least 1px, got {}x{}",
        args.width,
        args.height
    );
    let mut settings = match &args.settings {
        Some(path) => load_settings_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => load_settings(store),
    };
    if let Some(quote) = take_pending_quote(store)? {
        tracing::debug!("using queued quote");
        settings.quote_text = quote;
    }
    apply_overrides(&mut settings, args)?;

    if !args.no_save {
        save_settings(store, &settings)?;
    }

    let attribution = args.photographer.as_ref().map(|name| {
        Attribution::new(name.as_str(), args.photographer_url.clone().unwrap_or_default())
    });

    let mut config = Config::default();
    config.render.width = args.width;
    config.render.height = args.height;
    let compositor = Compositor::new(Box::new(DefaultImageLoader::new()?), config.theme.clone());

    let mut svg_surface = SvgSurface::new(config.render.width, config.render.height);
    let mut recording = args
        .dump
        .as_ref()
        .map(|_| RecordingSurface::new(config.render.width, config.render.height));
    let mut surfaces: Vec<&mut dyn Surface> = Vec::with_capacity(2);
    surfaces.push(&mut svg_surface);
    if let Some(recording) = recording.as_mut() {
        surfaces.push(recording);
    }
    match compositor.render_each(&mut surfaces, &settings, attribution.as_ref())? {
        RenderOutcome::Completed(_) => {}
        RenderOutcome::Superseded => anyhow::bail!("render was superseded"),
    }
    drop(surfaces);

    if let (Some(path), Some(recording)) = (&args.dump, &recording) {
        std::fs::write(path, recording.to_json()?)
            .with_context(|| format!("failed to write draw list to {}", path.display()))?;
    }

    let svg = svg_surface.finish();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&svg, args.output.as_deref(), &config)?,
    }
    Ok(())
}

fn apply_overrides(settings: &mut PosterSettings, args: &RenderArgs) -> Result<()> {
    if let Some(quote) = &args.quote {
        settings.quote_text = quote.clone();
    }
    if let Some(author) = &args.author {
        settings.author = Some(author.clone());
    }
    if let Some(family) = &args.font_family {
        settings.font_family = family.clone();
    }
    if let Some(size) = args.font_size {
        settings.font_size = size;
    }
    if let Some(weight) = args.font_weight {
        settings.font_weight = weight;
    }
    if let Some(align) = args.align {
        settings.text_align = align;
    }
    if let Some(line_height) = args.line_height {
        settings.line_height = line_height;
    }
    if let Some(padding) = args.padding {
        settings.padding = padding;
    }
    if args.max_width.is_some() {
        settings.max_width = args.max_width;
    }
    if args.vertical.is_some() {
        settings.vertical_position = args.vertical;
    }
    if args.horizontal.is_some() {
        settings.horizontal_position = args.horizontal;
    }
    if let Some(color) = &args.text_color {
        settings.text_color = color.clone();
    }
    if let Some(background) = &args.background {
        settings.background = Background::from_css(background);
    }
    if let Some(image) = &args.image {
        settings.image_url = Some(image.clone());
    }
    if let Some(upload) = &args.upload {
        settings.image_url = Some(
            file_to_data_url(upload)
                .with_context(|| format!("failed to read upload {}", upload.display()))?,
        );
    }
    let toggles = [
        (args.shadow, &mut settings.text_shadow),
        (args.stroke, &mut settings.text_stroke),
        (args.watermark, &mut settings.watermark),
        (args.show_quotes, &mut settings.show_quotes),
        (args.show_punctuation, &mut settings.show_punctuation),
    ];
    for (value, field) in toggles {
        if let Some(value) = value {
            *field = value;
        }
    }
    settings.clamp_to_editor_ranges();
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    use crate::render::rasterize_png;

    let bytes = rasterize_png(svg, config.render.width, config.render.height)?.unwrap_or_default();
    match output {
        Some(path) if path.extension().is_some() && !path.is_dir() => {
            if bytes.is_empty() {
                tracing::warn!("poster encoded to zero bytes, nothing written");
                return Ok(());
            }
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        dir => {
            let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
            if let Some(path) = save_download(&dir, &config.theme.app_name, &bytes)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: Option<&Path>, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the 'png' feature. Rebuild with --features png"
    ))
}
