/*!
 * JSON file stores.
 *
 * A missing file is created with its default content on first load. Saves
 * replace the whole file through a temp file in the same directory.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{SettingsStore, WordStore};
use crate::app_config::Settings;
use crate::errors::StoreError;
use crate::file_utils::FileManager;

const WORDS: &str = "protected words";
const SETTINGS: &str = "settings";

/// Accepted on-disk layouts of the word list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordFile {
    Object { protected_words: Vec<String> },
    List(Vec<String>),
}

impl WordFile {
    fn into_words(self) -> Vec<String> {
        match self {
            Self::Object { protected_words } => protected_words,
            Self::List(words) => words,
        }
    }
}

#[derive(Serialize)]
struct WordFileRef<'a> {
    protected_words: &'a [String],
}

fn load_error(what: &'static str, path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Load {
        what,
        message: format!("{}: {}", path.display(), err),
    }
}

fn save_error(what: &'static str, path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Save {
        what,
        message: format!("{}: {}", path.display(), err),
    }
}

fn write_json<T: Serialize>(what: &'static str, path: &Path, value: &T) -> Result<(), StoreError> {
    // serde_json leaves non-ASCII characters unescaped
    let json = serde_json::to_string_pretty(value).map_err(|e| save_error(what, path, e))?;
    FileManager::write_atomic(path, &json).map_err(|e| save_error(what, path, format!("{:#}", e)))
}

/// Word list stored as `{"protected_words": [...]}`
#[derive(Debug, Clone)]
pub struct JsonWordStore {
    path: PathBuf,
}

impl JsonWordStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WordStore for JsonWordStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        if !FileManager::file_exists(&self.path) {
            info!("Creating empty word list at {}", self.path.display());
            self.save(&[])?;
            return Ok(Vec::new());
        }

        let content = FileManager::read_to_string(&self.path)
            .map_err(|e| load_error(WORDS, &self.path, format!("{:#}", e)))?;
        let file: WordFile =
            serde_json::from_str(&content).map_err(|e| load_error(WORDS, &self.path, e))?;
        let words = file.into_words();
        debug!("Loaded {} protected word(s) from {}", words.len(), self.path.display());
        Ok(words)
    }

    fn save(&self, words: &[String]) -> Result<(), StoreError> {
        write_json(WORDS, &self.path, &WordFileRef { protected_words: words })?;
        debug!("Saved {} protected word(s) to {}", words.len(), self.path.display());
        Ok(())
    }
}

/// Settings stored as a JSON object; unknown keys survive a round trip
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings, StoreError> {
        if !FileManager::file_exists(&self.path) {
            info!("Creating default settings at {}", self.path.display());
            let settings = Settings::default();
            self.save(&settings)?;
            return Ok(settings);
        }

        let content = FileManager::read_to_string(&self.path)
            .map_err(|e| load_error(SETTINGS, &self.path, format!("{:#}", e)))?;
        let mut settings: Settings =
            serde_json::from_str(&content).map_err(|e| load_error(SETTINGS, &self.path, e))?;

        for fix in settings.repair() {
            warn!("{}: {}", self.path.display(), fix);
        }
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        write_json(SETTINGS, &self.path, settings)
    }
}
