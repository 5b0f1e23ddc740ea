/*!
 * Protected-word-aware text conversion.
 *
 * This module contains the core of the correction pass. It is split into
 * several submodules:
 *
 * - `locator`: finds the protected spans of a text
 * - `segmenter`: converts the gaps between protected spans and reassembles
 * - `engine`: the character conversion engine trait and its OpenCC backend
 * - `corrector`: locator + segmenter + engine in one call
 * - `worker`: runs corrections in the background, latest result wins
 * - `word_set`: the user-maintained protected word list
 * - `mock`: deterministic engine for tests
 */

// Re-export main types for easier usage
pub use self::corrector::ProtectedCorrector;
pub use self::engine::{CharacterConverter, DEFAULT_PROFILE, create_converter};
pub use self::locator::{OccurrenceSet, ProtectedOccurrence, TieBreak, locate};
pub use self::segmenter::{Segment, convert_segments, segments};
pub use self::word_set::ProtectedWordSet;
pub use self::worker::{CorrectionOutcome, CorrectionReceiver, CorrectionWorker};

// Submodules
pub mod corrector;
pub mod engine;
pub mod locator;
pub mod mock;
pub mod segmenter;
pub mod word_set;
pub mod worker;
