use crate::error::{PosterError, PosterResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "remote")]
use std::time::Duration;

/// A background image whose bytes are known to decode.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    bytes: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Decodes `bytes` to validate them and read the dimensions. Formats an
    /// SVG renderer cannot embed directly are re-encoded as PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> PosterResult<Self> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(PosterError::image("image has no pixels"));
        }

        if matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return Ok(Self {
                width,
                height,
                format,
                bytes: Arc::new(bytes),
            });
        }

        let mut png = Vec::new();
        decoded.write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            width,
            height,
            format: ImageFormat::Png,
            bytes: Arc::new(png),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn to_data_url(&self) -> String {
        encode_data_url(self.mime_type(), &self.bytes)
    }
}

/// Resolves an `imageUrl` value to a decoded image.
pub trait ImageLoader: Send + Sync {
    fn load(&self, source: &str) -> PosterResult<DecodedImage>;
}

/// Handles data URLs, local paths, `file://` URLs and, with the `remote`
/// feature, http(s) URLs.
pub struct DefaultImageLoader {
    #[cfg(feature = "remote")]
    client: reqwest::blocking::Client,
}

impl DefaultImageLoader {
    pub fn new() -> PosterResult<Self> {
        Ok(Self {
            #[cfg(feature = "remote")]
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("aphorize/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|err| PosterError::image(format!("http client: {err}")))?,
        })
    }

    fn fetch(&self, url: &str) -> PosterResult<Vec<u8>> {
        #[cfg(feature = "remote")]
        {
            let response = self
                .client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .map_err(|err| PosterError::image(format!("fetch {url}: {err}")))?;
            let bytes = response
                .bytes()
                .map_err(|err| PosterError::image(format!("read {url}: {err}")))?;
            Ok(bytes.to_vec())
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(PosterError::image(format!(
                "cannot fetch {url}: built without the `remote` feature"
            )))
        }
    }
}

impl ImageLoader for DefaultImageLoader {
    fn load(&self, source: &str) -> PosterResult<DecodedImage> {
        let source = source.trim();
        let bytes = if source.starts_with("data:") {
            decode_data_url(source)?
        } else if source.starts_with("http://") || source.starts_with("https://") {
            self.fetch(source)?
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            std::fs::read(path)
                .map_err(|err| PosterError::image(format!("read {path}: {err}")))?
        };
        DecodedImage::from_bytes(bytes)
    }
}

/// Decodes the payload of a `data:` URL. Non-base64 payloads are taken verbatim.
pub fn decode_data_url(url: &str) -> PosterResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PosterError::image("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PosterError::image("data URL without payload"))?;
    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let compact: String = payload.chars().filter(|ch| !ch.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| PosterError::image(format!("invalid base64 in data URL: {err}")))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads a local image file into a data URL, the way an upload is fed into
/// `imageUrl`.
pub fn file_to_data_url(path: &Path) -> PosterResult<String> {
    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|err| PosterError::image(format!("{}: {err}", path.display())))?;
    Ok(encode_data_url(format.to_mime_type(), &bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 80, 120, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png_dimensions() {
        let image = DecodedImage::from_bytes(png_bytes(4, 2)).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(DecodedImage::from_bytes(b"definitely not an image".to_vec()).is_err());
    }

    #[test]
    fn data_url_round_trip_through_loader() {
        let url = encode_data_url("image/png", &png_bytes(3, 5));
        let loader = DefaultImageLoader::new().unwrap();
        let image = loader.load(&url).unwrap();
        assert_eq!((image.width, image.height), (3, 5));
    }

    #[test]
    fn data_url_without_comma_is_an_error() {
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("image/png;base64,AAAA").is_err());
    }

    #[test]
    fn plain_data_url_payload_is_verbatim() {
        assert_eq!(decode_data_url("data:text/plain,hello").unwrap(), b"hello");
    }

    #[test]
    fn missing_file_fails_to_load() {
        let loader = DefaultImageLoader::new().unwrap();
        assert!(loader.load("/definitely/not/here.png").is_err());
    }

    #[test]
    fn file_to_data_url_uses_detected_mime() {
        let dir = std::env::temp_dir().join(format!("aphorize-upload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("upload.bin");
        std::fs::write(&path, png_bytes(2, 2)).unwrap();
        let url = file_to_data_url(&path).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
