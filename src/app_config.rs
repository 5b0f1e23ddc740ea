use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::default::Default;

use crate::conversion::engine::{DEFAULT_PROFILE, SUPPORTED_PROFILES, is_supported_profile};

/// Application configuration module
/// This module handles the persisted user settings: display font and the
/// conversion profile used by the correction engine.
/// Represents the persisted settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    // @field: Font family of the text view
    #[serde(default = "default_font_family")]
    pub font_family: String,

    // @field: Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    // @field: Conversion profile passed to the engine (e.g. s2t)
    #[serde(default = "default_conversion_profile")]
    pub conversion_profile: String,

    // @field: Keys this version does not know, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

pub const MIN_FONT_SIZE: u32 = 1;
pub const MAX_FONT_SIZE: u32 = 200;

fn default_font_family() -> String {
    "新細明體".to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_conversion_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Settings {
    /// Validate the settings for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.font_family.trim().is_empty() {
            return Err(anyhow!("Font family cannot be empty"));
        }

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(anyhow!(
                "Font size {} is out of range ({}-{})",
                self.font_size,
                MIN_FONT_SIZE,
                MAX_FONT_SIZE
            ));
        }

        if !is_supported_profile(&self.conversion_profile) {
            return Err(anyhow!(
                "Unknown conversion profile '{}', expected one of: {}",
                self.conversion_profile,
                SUPPORTED_PROFILES.join(", ")
            ));
        }

        Ok(())
    }

    /// Reset every invalid field to its default.
    ///
    /// Returns one message per field that was reset; empty when the settings
    /// were already valid.
    pub fn repair(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();

        if self.font_family.trim().is_empty() {
            self.font_family = default_font_family();
            fixes.push(format!("empty font family, using {}", self.font_family));
        }

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            fixes.push(format!(
                "font size {} out of range, using {}",
                self.font_size,
                default_font_size()
            ));
            self.font_size = default_font_size();
        }

        if !is_supported_profile(&self.conversion_profile) {
            fixes.push(format!(
                "unknown conversion profile '{}', using {}",
                self.conversion_profile, DEFAULT_PROFILE
            ));
            self.conversion_profile = default_conversion_profile();
        }

        fixes
    }

    /// Whether switching to `other` requires a new conversion engine
    pub fn profile_changed(&self, other: &Settings) -> bool {
        self.conversion_profile != other.conversion_profile
    }
}

/// Default implementation for Settings
impl Default for Settings {
    fn default() -> Self {
        Settings {
            font_family: default_font_family(),
            font_size: default_font_size(),
            conversion_profile: default_conversion_profile(),
            extra: Map::new(),
        }
    }
}
