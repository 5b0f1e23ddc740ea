/*!
 * Mock converter implementations for testing.
 *
 * This module provides a deterministic converter that simulates different
 * engine behaviors:
 * - `MockConverter::working()` - Maps a small built-in Simplified to Traditional table
 * - `MockConverter::identity()` - Returns its input unchanged
 * - `MockConverter::failing()` - Always fails
 * - `MockConverter::fail_on(..)` - Fails on segments containing a marker
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::engine::CharacterConverter;
use crate::errors::ConversionError;

/// Simplified to Traditional pairs known to the mock
const MOCK_TABLE: &[(char, char)] = &[
    ('这', '這'),
    ('个', '個'),
    ('测', '測'),
    ('试', '試'),
    ('会', '會'),
    ('议', '議'),
    ('讨', '討'),
    ('论', '論'),
    ('项', '項'),
    ('开', '開'),
    ('发', '發'),
    ('们', '們'),
    ('说', '說'),
    ('国', '國'),
    ('汉', '漢'),
    ('语', '語'),
    ('简', '簡'),
    ('体', '體'),
    ('软', '軟'),
];

/// Behavior mode for the mock converter
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Maps characters through the built-in table
    Working,
    /// Returns the input unchanged
    Identity,
    /// Always fails with an error
    Failing,
    /// Fails when a segment contains the marker, works otherwise
    FailOn(String),
    /// Works like `Working` after sleeping on every call
    Slow { delay_ms: u64 },
}

/// Mock converter for testing conversion behavior
#[derive(Debug)]
pub struct MockConverter {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockConverter {
    /// Create a new mock converter with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_on(marker: &str) -> Self {
        Self::new(MockBehavior::FailOn(marker.to_string()))
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of `convert` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter, still readable after the mock is moved into an `Arc`
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Map one character through the built-in table
    pub fn map_char(c: char) -> char {
        MOCK_TABLE
            .iter()
            .find(|(simplified, _)| *simplified == c)
            .map(|(_, traditional)| *traditional)
            .unwrap_or(c)
    }

    fn map_text(text: &str) -> String {
        text.chars().map(Self::map_char).collect()
    }
}

impl Clone for MockConverter {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl CharacterConverter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn convert(&self, text: &str) -> Result<String, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working => Ok(Self::map_text(text)),
            MockBehavior::Identity => Ok(text.to_string()),
            MockBehavior::Failing => Err(ConversionError::SegmentFailure {
                segment_chars: text.chars().count(),
                message: "mock engine failure".to_string(),
            }),
            MockBehavior::FailOn(marker) if text.contains(marker.as_str()) => {
                Err(ConversionError::SegmentFailure {
                    segment_chars: text.chars().count(),
                    message: format!("mock engine rejected '{}'", marker),
                })
            }
            MockBehavior::FailOn(_) => Ok(Self::map_text(text)),
            MockBehavior::Slow { delay_ms } => {
                std::thread::sleep(Duration::from_millis(*delay_ms));
                Ok(Self::map_text(text))
            }
        }
    }
}
