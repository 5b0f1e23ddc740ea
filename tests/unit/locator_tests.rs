/*!
 * Tests for protected span location and segmented conversion
 */

use std::cell::Cell;
use std::sync::Arc;
use zhcorrect::conversion::mock::MockConverter;
use zhcorrect::conversion::{
    CharacterConverter, ProtectedCorrector, Segment, TieBreak, convert_segments, locate, segments,
};

fn spans(text: &str, words: &[&str], tie_break: TieBreak) -> Vec<(usize, usize, String)> {
    locate(text, words, tie_break)
        .iter()
        .map(|o| (o.start, o.end, o.word.clone()))
        .collect()
}

fn bracket(s: &str) -> Result<String, String> {
    Ok(format!("[{}]", s))
}

/// Test that an identity engine leaves the text unchanged
#[test]
fn test_correct_withIdentityEngine_shouldReturnInput() {
    let text = "公司今天開會討論項目";
    let corrector = ProtectedCorrector::new(Arc::new(MockConverter::identity()));
    assert_eq!(corrector.correct(text, &["公司"]).unwrap(), text);

    let occurrences = locate(text, &["公司"], TieBreak::default());
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences.as_slice()[0].start, 0);
}

/// Test that a bracketing engine shows exactly which parts were converted
#[test]
fn test_correct_withBracketEngine_shouldOnlyConvertGaps() {
    let text = "公司今天開會討論項目";
    let occurrences = locate(text, &["公司"], TieBreak::default());
    let out = convert_segments(text, &occurrences, bracket).unwrap();
    assert_eq!(out, "公司[今天開會討論項目]");
}

/// Test that a repeated word is found at both offsets and preserved
#[test]
fn test_locate_withRepeatedWord_shouldFindBothOccurrences() {
    assert_eq!(
        spans("ABCABC", &["ABC"], TieBreak::default()),
        vec![(0, 3, "ABC".to_string()), (3, 6, "ABC".to_string())]
    );

    let occurrences = locate("ABCABC", &["ABC"], TieBreak::default());
    let calls = Cell::new(0);
    let out = convert_segments("ABCABC", &occurrences, |s: &str| {
        calls.set(calls.get() + 1);
        Ok::<_, String>(s.to_lowercase())
    })
    .unwrap();
    assert_eq!(out, "ABCABC");
    assert_eq!(calls.get(), 0);
}

/// Test that overlapping self-matches resolve to non-overlapping spans
#[test]
fn test_locate_withOverlappingMatches_shouldKeepEarliestNonOverlapping() {
    assert_eq!(
        spans("AAAA", &["AA"], TieBreak::default()),
        vec![(0, 2, "AA".to_string()), (2, 4, "AA".to_string())]
    );

    let occurrences = locate("AAAA", &["AA"], TieBreak::default());
    assert_eq!(convert_segments("AAAA", &occurrences, bracket).unwrap(), "AAAA");

    let occurrences = locate("AAA", &["AA"], TieBreak::default());
    assert_eq!(convert_segments("AAA", &occurrences, bracket).unwrap(), "AA[A]");
}

/// Test that the tie-break rule decides same-start collisions
#[test]
fn test_locate_withSharedStart_shouldFollowTieBreak() {
    let words = ["AB", "ABC"];
    assert_eq!(spans("ABCD", &words, TieBreak::Longest), vec![(0, 3, "ABC".to_string())]);
    assert_eq!(spans("ABCD", &words, TieBreak::FirstDeclared), vec![(0, 2, "AB".to_string())]);
    assert_eq!(spans("ABCD", &words, TieBreak::LastDeclared), vec![(0, 3, "ABC".to_string())]);

    let reversed = ["ABC", "AB"];
    assert_eq!(spans("ABCD", &reversed, TieBreak::Longest), vec![(0, 3, "ABC".to_string())]);
    assert_eq!(spans("ABCD", &reversed, TieBreak::LastDeclared), vec![(0, 2, "AB".to_string())]);

    let occurrences = locate("ABCD", &words, TieBreak::Longest);
    assert_eq!(convert_segments("ABCD", &occurrences, bracket).unwrap(), "ABC[D]");
}

/// Test that segments partition the text, protected ones verbatim and in order
#[test]
fn test_segments_withMixedText_shouldReconstructInput() {
    let text = "这个软件是公司的软件项目";
    let occurrences = locate(text, &["软件", "公司"], TieBreak::default());
    let parts = segments(text, &occurrences);

    let joined: String = parts.iter().map(|s| s.as_str()).collect();
    assert_eq!(joined, text);

    let protected: Vec<&str> = parts
        .iter()
        .filter(|s| s.is_protected())
        .map(|s| s.as_str())
        .collect();
    assert_eq!(protected, vec!["软件", "公司", "软件"]);
    assert_eq!(parts[0], Segment::Convert("这个"));
}

/// Test that the converted length differs only by the engine's own delta
#[test]
fn test_convertSegments_withLengthChangingEngine_shouldOnlyShiftGaps() {
    let text = "ab公司cd";
    let occurrences = locate(text, &["公司"], TieBreak::default());
    let out = convert_segments(text, &occurrences, |s: &str| Ok::<_, String>(s.repeat(2))).unwrap();
    assert_eq!(out, "abab公司cdcd");
    assert_eq!(out.chars().count(), text.chars().count() + 4);
}

/// Test that each protected word sits where the preceding segments end
#[test]
fn test_convertSegments_withProtectedWords_shouldPlaceWordsAtCumulativeOffsets() {
    let text = "这个软件开发项目";
    let corrector = ProtectedCorrector::new(Arc::new(MockConverter::working()));
    let out = corrector.correct(text, &["软件"]).unwrap();

    let prefix = MockConverter::working().convert("这个").unwrap();
    assert!(out[prefix.len()..].starts_with("软件"));
    assert_eq!(out, "這個软件開發項目");
}

/// Test that no protected words means one call on the whole text
#[test]
fn test_convertSegments_withNoWords_shouldEqualDirectConversion() {
    let text = "汉语简体软件";
    let occurrences = locate(text, &[] as &[&str], TieBreak::default());
    let calls = Cell::new(0);
    let out = convert_segments(text, &occurrences, |s: &str| {
        calls.set(calls.get() + 1);
        MockConverter::working().convert(s)
    })
    .unwrap();
    assert_eq!(out, MockConverter::working().convert(text).unwrap());
    assert_eq!(calls.get(), 1);
}

/// Test that empty input makes no engine calls
#[test]
fn test_convertSegments_withEmptyText_shouldNotCallEngine() {
    let occurrences = locate("", &["公司"], TieBreak::default());
    assert!(occurrences.is_empty());
    let out = convert_segments("", &occurrences, |_s: &str| -> Result<String, String> {
        panic!("engine must not be called")
    })
    .unwrap();
    assert_eq!(out, "");
}

/// A failing segment aborts the whole conversion
#[test]
fn test_convertSegments_withFailingSegment_shouldReturnNoPartialText() {
    let text = "好 KEEP 坏";
    let occurrences = locate(text, &["KEEP"], TieBreak::default());
    let result = convert_segments(text, &occurrences, |s: &str| {
        if s.contains('坏') {
            Err("boom".to_string())
        } else {
            Ok(s.to_string())
        }
    });
    assert_eq!(result, Err("boom".to_string()));
}

/// Multi-byte offsets stay on character boundaries
#[test]
fn test_locate_withUnicodeText_shouldReportCharSpans() {
    let text = "甲乙丙甲乙";
    let occurrences = locate(text, &["甲乙"], TieBreak::default());
    let char_spans: Vec<_> = occurrences.iter().map(|o| o.char_span(text)).collect();
    assert_eq!(char_spans, vec![0..2, 3..5]);
    assert_eq!(occurrences.starts(), vec![0, 9]);
}
