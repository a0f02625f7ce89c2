//! Small persistent key/value store for editor state.
//!
//! Two keys are used: `posterSettings` holds the last settings (without the
//! background image, which is too large and often transient), and
//! `pendingQuote` hands a quote from another tool to the next editor session.

use crate::config::PosterSettings;
use crate::error::{PosterError, PosterResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const SETTINGS_KEY: &str = "posterSettings";
pub const PENDING_QUOTE_KEY: &str = "pendingQuote";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PosterResult<()>;
    fn remove(&self, key: &str) -> PosterResult<()>;
}

/// All keys live in one JSON object file. Values are stored as strings.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/aphorize/store.json`, else `~/.config/aphorize/store.json`.
    pub fn default_path() -> PosterResult<PathBuf> {
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir).join("aphorize").join("store.json"));
        }
        let home = std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .ok_or_else(|| PosterError::store("neither XDG_CONFIG_HOME nor HOME is set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("aphorize")
            .join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PosterResult<Map<String, Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(PosterError::store(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> PosterResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>> {
        Ok(self.read_all()?.get(key).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: &str) -> PosterResult<()> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> PosterResult<()> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> PosterResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PosterError::store("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PosterResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PosterResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Last saved settings, or the defaults when nothing usable is stored.
pub fn load_settings(store: &dyn KeyValueStore) -> PosterSettings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return PosterSettings::default(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read saved settings, using defaults");
            return PosterSettings::default();
        }
    };
    match serde_json::from_str::<PosterSettings>(&raw) {
        Ok(mut settings) => {
            settings.image_url = None;
            settings
        }
        Err(err) => {
            tracing::warn!(error = %err, "saved settings are malformed, using defaults");
            PosterSettings::default()
        }
    }
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &PosterSettings) -> PosterResult<()> {
    let mut value = serde_json::to_value(settings)?;
    if let Value::Object(map) = &mut value {
        map.remove("imageUrl");
    }
    store.set(SETTINGS_KEY, &value.to_string())
}

/// Returns the queued quote at most once.
pub fn take_pending_quote(store: &dyn KeyValueStore) -> PosterResult<Option<String>> {
    let quote = store.get(PENDING_QUOTE_KEY)?;
    if quote.is_some() {
        store.remove(PENDING_QUOTE_KEY)?;
    }
    Ok(quote)
}

pub fn put_pending_quote(store: &dyn KeyValueStore, quote: &str) -> PosterResult<()> {
    store.set(PENDING_QUOTE_KEY, quote)
}
