use aphorize::config::parse_settings;
use aphorize::{Attribution, RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PosterRenderOptions {
    width: Option<f32>,
    height: Option<f32>,
    photographer: Option<String>,
    photographer_url: Option<String>,
    watermark_text: Option<String>,
}

fn build_render_options(options: PosterRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::default();
    if let Some(width) = options.width {
        render_options.render.width = width;
    }
    if let Some(height) = options.height {
        render_options.render.height = height;
    }
    if let Some(text) = options.watermark_text {
        render_options.theme.watermark_text = text;
    }
    render_options.attribution = options
        .photographer
        .map(|name| Attribution::new(name, options.photographer_url.unwrap_or_default()));
    render_options
}

#[wasm_bindgen]
pub fn render_poster_svg(settings_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<PosterRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        PosterRenderOptions::default()
    };

    let settings = parse_settings(settings_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    render_with_options(&settings, build_render_options(options))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
