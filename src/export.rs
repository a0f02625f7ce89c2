use crate::error::PosterResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn download_filename(app_name: &str, epoch_ms: u128) -> String {
    format!("{app_name}-quote-{epoch_ms}.png")
}

/// Removes the temporary file unless the write was committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Writes encoded poster bytes to `<dir>/<app>-quote-<epoch-ms>.png`.
/// Nothing is written for an empty encode; `Ok(None)` is returned instead.
pub fn save_download(dir: &Path, app_name: &str, bytes: &[u8]) -> PosterResult<Option<PathBuf>> {
    if bytes.is_empty() {
        tracing::warn!("poster encoded to zero bytes, skipping download");
        return Ok(None);
    }

    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let target = dir.join(download_filename(app_name, epoch_ms));
    let mut partial = PartialFile {
        path: target.with_extension("png.part"),
        committed: false,
    };

    fs::create_dir_all(dir)?;
    fs::write(&partial.path, bytes)?;
    fs::rename(&partial.path, &target)?;
    partial.committed = true;

    tracing::info!(path = %target.display(), bytes = bytes.len(), "poster saved");
    Ok(Some(target))
}
