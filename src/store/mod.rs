/*!
 * Persistent storage for the protected word list and the settings.
 *
 * Both live in small JSON files next to each other:
 * - `protected_words.json`: `{"protected_words": [...]}`
 * - `settings.json`: the `Settings` object
 *
 * In-memory variants are provided for tests and for running without a
 * config directory.
 */

use crate::app_config::Settings;
use crate::errors::StoreError;

pub mod json;
pub mod memory;

// Re-export main types
pub use json::{JsonSettingsStore, JsonWordStore};
pub use memory::{MemorySettingsStore, MemoryWordStore};

/// Default word list filename
pub const WORDS_FILENAME: &str = "protected_words.json";

/// Default settings filename
pub const SETTINGS_FILENAME: &str = "settings.json";

/// Load and save the protected word list
pub trait WordStore: Send + Sync {
    fn load(&self) -> Result<Vec<String>, StoreError>;

    /// Overwrite the whole persisted list
    fn save(&self, words: &[String]) -> Result<(), StoreError>;
}

/// Load and save the settings
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, StoreError>;

    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}
