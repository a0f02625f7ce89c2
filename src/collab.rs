//! Seams to the services that supply background images: a text-to-image
//! generator and a stock-photo search. Only the contracts live here.

use crate::config::PosterSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Photo credit for a stock image. Shown as a caption, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub photographer: String,
    pub url: String,
}

impl Attribution {
    pub fn new(photographer: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            photographer: photographer.into(),
            url: url.into(),
        }
    }

    pub fn caption(&self) -> String {
        format!("Photo by {}", self.photographer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResult {
    pub image_url: String,
    pub photographer: String,
    pub photographer_url: String,
}

/// Results shown per search.
pub const PHOTO_PAGE_SIZE: usize = 12;

pub trait PhotoSearch {
    fn search(&self, query: &str) -> Result<Vec<PhotoResult>, GenerationError>;
}

/// Runs a stock-photo search. A blank query never reaches the provider.
pub fn search_photos(
    search: &dyn PhotoSearch,
    query: &str,
) -> Result<Vec<PhotoResult>, GenerationError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let mut results = search.search(query).map_err(|err| {
        tracing::warn!(error = %err, query, "photo search failed");
        err
    })?;
    results.truncate(PHOTO_PAGE_SIZE);
    Ok(results)
}

/// Uses a picked stock photo as the background and returns its credit.
pub fn apply_photo(settings: &mut PosterSettings, photo: &PhotoResult) -> Attribution {
    settings.image_url = Some(photo.image_url.clone());
    Attribution::new(photo.photographer.clone(), photo.photographer_url.clone())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationError {
    pub error: String,
    pub message: String,
}

impl GenerationError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for GenerationError {}

pub trait BackgroundGenerator {
    /// Returns the generated image as a data URL.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub fn background_prompt(prompt: &str) -> String {
    format!(
        "Create an elegant, minimalist background image suitable for a quote poster. {}. \
         The image should be abstract or scenic, with plenty of space for overlaying text. \
         Avoid any text, words, or distracting elements. Style: professional, clean, aesthetic, high quality.",
        prompt.trim()
    )
}

/// Generates a background for `prompt` and installs it. A generated image
/// has no photographer, so any previous credit is dropped.
pub fn apply_generated_background(
    generator: &dyn BackgroundGenerator,
    settings: &mut PosterSettings,
    attribution: &mut Option<Attribution>,
    prompt: &str,
) -> Result<(), GenerationError> {
    if prompt.trim().is_empty() {
        return Err(GenerationError::new(
            "Prompt is required",
            "Describe the background you want to generate",
        ));
    }
    let data_url = generator.generate(&background_prompt(prompt)).map_err(|err| {
        tracing::warn!(error = %err, "background generation failed");
        err
    })?;
    settings.image_url = Some(data_url);
    *attribution = None;
    Ok(())
}
