/*!
 * Segmented conversion.
 *
 * Walks a text together with its protected occurrences, runs the conversion
 * function on the gaps only and stitches the pieces back in order.
 */

use super::locator::OccurrenceSet;

/// A contiguous run of text between protection boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text handed to the conversion function
    Convert(&'a str),
    /// Protected text copied verbatim
    Preserve(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Convert(text) | Self::Preserve(text) => text,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Preserve(_))
    }
}

/// Partition `text` into alternating convert/preserve segments.
///
/// `occurrences` must have been located on this same `text`. Concatenating
/// the returned segments reproduces `text` exactly.
pub fn segments<'a>(text: &'a str, occurrences: &'a OccurrenceSet) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(occurrences.len() * 2 + 1);
    let mut last_end = 0;

    for occurrence in occurrences {
        if occurrence.start > last_end {
            out.push(Segment::Convert(&text[last_end..occurrence.start]));
        }
        out.push(Segment::Preserve(occurrence.word.as_str()));
        last_end = occurrence.end;
    }

    if last_end < text.len() {
        out.push(Segment::Convert(&text[last_end..]));
    }

    out
}

/// Convert `text`, leaving every protected occurrence untouched.
///
/// Empty text yields an empty string without calling `convert_fn`. Without
/// occurrences the whole text goes through `convert_fn` in one call. The
/// first error from `convert_fn` aborts the pass.
pub fn convert_segments<F, E>(
    text: &str,
    occurrences: &OccurrenceSet,
    mut convert_fn: F,
) -> Result<String, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    if text.is_empty() {
        return Ok(String::new());
    }
    if occurrences.is_empty() {
        return convert_fn(text);
    }

    let mut result = String::with_capacity(text.len());
    for segment in segments(text, occurrences) {
        match segment {
            Segment::Convert(gap) => result.push_str(&convert_fn(gap)?),
            Segment::Preserve(word) => result.push_str(word),
        }
    }

    Ok(result)
}
