//! In-memory stores, mainly for tests.

use parking_lot::Mutex;

use super::{SettingsStore, WordStore};
use crate::app_config::Settings;
use crate::errors::StoreError;

/// Word list kept in memory
#[derive(Debug, Default)]
pub struct MemoryWordStore {
    words: Mutex<Vec<String>>,
    fail_load: bool,
    fail_save: bool,
    saves: Mutex<usize>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: Mutex::new(words.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Store whose loads fail
    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    /// Store whose saves fail
    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    /// What was last saved
    pub fn words(&self) -> Vec<String> {
        self.words.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl WordStore for MemoryWordStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_load {
            return Err(StoreError::Load {
                what: "protected words",
                message: "memory store configured to fail".to_string(),
            });
        }
        Ok(self.words.lock().clone())
    }

    fn save(&self, words: &[String]) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(StoreError::Save {
                what: "protected words",
                message: "memory store configured to fail".to_string(),
            });
        }
        *self.words.lock() = words.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}

/// Settings kept in memory
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    fail_load: bool,
    fail_save: bool,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Self::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, StoreError> {
        if self.fail_load {
            return Err(StoreError::Load {
                what: "settings",
                message: "memory store configured to fail".to_string(),
            });
        }
        Ok(self.settings.lock().clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(StoreError::Save {
                what: "settings",
                message: "memory store configured to fail".to_string(),
            });
        }
        *self.settings.lock() = settings.clone();
        Ok(())
    }
}
