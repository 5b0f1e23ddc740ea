//! Protected word list owned by the application state.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Ordered list of literal substrings that conversion must leave untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedWordSet {
    words: Vec<String>,
}

impl ProtectedWordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from persisted words, dropping blank entries
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words
                .into_iter()
                .map(Into::into)
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Add a word after trimming it
    ///
    /// Returns the stored form. Blank and already-present words are rejected.
    pub fn add(&mut self, word: &str) -> Result<String, AppError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(AppError::InvalidInput("protected word cannot be empty".to_string()));
        }
        if self.contains(word) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is already protected",
                word
            )));
        }
        self.words.push(word.to_string());
        Ok(word.to_string())
    }

    /// Remove a word; returns whether it was present
    pub fn remove(&mut self, word: &str) -> bool {
        match self.words.iter().position(|w| w == word) {
            Some(index) => {
                self.words.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    /// Owned copy handed to background conversions
    pub fn snapshot(&self) -> Vec<String> {
        self.words.clone()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.words.iter()
    }
}
