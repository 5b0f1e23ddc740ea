/*!
 * Protected-span location.
 *
 * Scans a text for every occurrence of every protected word and produces an
 * ordered, non-overlapping set of spans that the segmenter must leave alone.
 *
 * Offsets are byte offsets into the scanned text and always fall on `char`
 * boundaries, so they can be used to slice the text directly. Use
 * [`ProtectedOccurrence::char_span`] when character offsets are needed.
 */

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// A located instance of a protected word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedOccurrence {
    /// Byte offset of the first character
    pub start: usize,

    /// Byte offset one past the last character (`start + word.len()`)
    pub end: usize,

    /// The protected word as it appears in the text
    pub word: String,
}

impl ProtectedOccurrence {
    /// Create an occurrence of `word` starting at byte offset `start`
    pub fn new(start: usize, word: &str) -> Self {
        Self {
            start,
            end: start + word.len(),
            word: word.to_string(),
        }
    }

    /// Span of the occurrence in character offsets of `text`
    pub fn char_span(&self, text: &str) -> Range<usize> {
        let start = text[..self.start].chars().count();
        start..start + self.word.chars().count()
    }
}

/// Rule applied when two different protected words start at the same offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The longest word wins; equal lengths keep the earlier-declared word
    #[default]
    Longest,

    /// The word declared first in the protected list wins
    FirstDeclared,

    /// The word declared last wins, overwriting earlier matches
    LastDeclared,
}

impl TieBreak {
    /// Whether `challenger`, declared after `incumbent`, should replace it
    fn replaces(self, incumbent: &str, challenger: &str) -> bool {
        match self {
            // Both words match the text at the same offset, so the longer one
            // in bytes is also the longer one in characters.
            Self::Longest => challenger.len() > incumbent.len(),
            Self::FirstDeclared => false,
            Self::LastDeclared => true,
        }
    }
}

/// Ordered, non-overlapping protected occurrences of one text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceSet {
    occurrences: Vec<ProtectedOccurrence>,
}

impl OccurrenceSet {
    /// Number of occurrences kept
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Occurrences in ascending start order
    pub fn iter(&self) -> std::slice::Iter<'_, ProtectedOccurrence> {
        self.occurrences.iter()
    }

    pub fn as_slice(&self) -> &[ProtectedOccurrence] {
        &self.occurrences
    }

    /// Start offsets in ascending order
    pub fn starts(&self) -> Vec<usize> {
        self.occurrences.iter().map(|o| o.start).collect()
    }

    pub fn into_vec(self) -> Vec<ProtectedOccurrence> {
        self.occurrences
    }
}

impl<'a> IntoIterator for &'a OccurrenceSet {
    type Item = &'a ProtectedOccurrence;
    type IntoIter = std::slice::Iter<'a, ProtectedOccurrence>;

    fn into_iter(self) -> Self::IntoIter {
        self.occurrences.iter()
    }
}

/// Find every start offset of `word` in `text`, including overlapping ones.
///
/// Each new search starts one character after the previous match start.
/// An empty word never matches.
pub fn find_all(text: &str, word: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let Some(first) = word.chars().next() else {
        return positions;
    };
    let step = first.len_utf8();

    let mut from = 0;
    while let Some(offset) = text[from..].find(word) {
        let pos = from + offset;
        positions.push(pos);
        from = pos + step;
    }

    positions
}

/// Collect matches of all words keyed by start offset, settling same-start
/// collisions with `tie_break`. Overlaps at different offsets are kept.
pub fn keyed_matches<'w, S: AsRef<str>>(
    text: &str,
    words: &'w [S],
    tie_break: TieBreak,
) -> BTreeMap<usize, &'w str> {
    let mut keyed: BTreeMap<usize, &'w str> = BTreeMap::new();

    for word in words.iter().map(AsRef::as_ref) {
        for pos in find_all(text, word) {
            let replace = keyed
                .get(&pos)
                .is_none_or(|incumbent| tie_break.replaces(incumbent, word));
            if replace {
                keyed.insert(pos, word);
            }
        }
    }

    keyed
}

/// Locate the protected spans of `text`.
///
/// Words are scanned in list order. Same-start collisions follow `tie_break`;
/// among overlapping spans with different starts the earliest start wins and
/// any span beginning before its end is dropped.
pub fn locate<S: AsRef<str>>(text: &str, words: &[S], tie_break: TieBreak) -> OccurrenceSet {
    if text.is_empty() || words.is_empty() {
        return OccurrenceSet::default();
    }

    let keyed = keyed_matches(text, words, tie_break);
    let mut occurrences = Vec::with_capacity(keyed.len());
    let mut last_end = 0;

    for (start, word) in keyed {
        if start < last_end {
            trace!("Dropping overlapping protected match '{}' at {}", word, start);
            continue;
        }
        let occurrence = ProtectedOccurrence::new(start, word);
        last_end = occurrence.end;
        occurrences.push(occurrence);
    }

    OccurrenceSet { occurrences }
}
