/*!
 * Protected-word-aware correction.
 *
 * Glues the locator and the segmenter to a conversion engine.
 */

use log::debug;
use std::sync::Arc;

use super::engine::CharacterConverter;
use super::locator::{TieBreak, locate};
use super::segmenter::convert_segments;
use crate::errors::ConversionError;

/// Runs a conversion engine over everything except protected words
#[derive(Debug, Clone)]
pub struct ProtectedCorrector {
    converter: Arc<dyn CharacterConverter>,
    tie_break: TieBreak,
}

impl ProtectedCorrector {
    /// Create a corrector with the default tie-break rule
    pub fn new(converter: Arc<dyn CharacterConverter>) -> Self {
        Self::with_tie_break(converter, TieBreak::default())
    }

    pub fn with_tie_break(converter: Arc<dyn CharacterConverter>, tie_break: TieBreak) -> Self {
        Self {
            converter,
            tie_break,
        }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn converter(&self) -> &Arc<dyn CharacterConverter> {
        &self.converter
    }

    /// Convert `text`, keeping every occurrence of `words` verbatim.
    ///
    /// Fails atomically: any segment error discards the whole result.
    pub fn correct<S: AsRef<str>>(&self, text: &str, words: &[S]) -> Result<String, ConversionError> {
        let occurrences = locate(text, words, self.tie_break);
        debug!(
            "Found {} protected occurrence(s) in {} chars",
            occurrences.len(),
            text.chars().count()
        );

        let corrected = convert_segments(text, &occurrences, |segment| {
            self.converter.convert(segment).map_err(|e| match e {
                ConversionError::SegmentFailure { .. } => e,
                other => ConversionError::SegmentFailure {
                    segment_chars: segment.chars().count(),
                    message: other.to_string(),
                },
            })
        })?;

        debug!(
            "Correction with {} done, result is {} chars",
            self.converter.name(),
            corrected.chars().count()
        );
        Ok(corrected)
    }
}
