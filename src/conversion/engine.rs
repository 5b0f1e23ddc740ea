/*!
 * Character conversion engines.
 *
 * The mapping tables themselves live outside this crate. Everything that
 * needs a conversion goes through the [`CharacterConverter`] trait so the
 * engine can be swapped for a test double.
 */

use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ConversionError;

/// Conversion profiles understood by the OpenCC engine
pub const SUPPORTED_PROFILES: &[&str] = &[
    "s2t", "s2tw", "s2twp", "s2hk", "t2s", "tw2s", "tw2sp", "hk2s", "t2tw", "t2hk", "t2jp",
    "jp2t",
];

/// Default profile: Simplified Chinese to Traditional Chinese
pub const DEFAULT_PROFILE: &str = "s2t";

/// Common trait for all character conversion engines
///
/// Implementations must be pure: the same input always yields the same
/// output, and no state leaks between calls.
pub trait CharacterConverter: Send + Sync + Debug {
    /// Short engine name used in logs
    fn name(&self) -> &str;

    /// Convert a piece of text
    ///
    /// # Arguments
    /// * `text` - The text to convert
    ///
    /// # Returns
    /// * `Result<String, ConversionError>` - The converted text or an error
    fn convert(&self, text: &str) -> Result<String, ConversionError>;
}

/// Whether `profile` names a known conversion profile
pub fn is_supported_profile(profile: &str) -> bool {
    SUPPORTED_PROFILES.contains(&profile)
}

/// OpenCC-backed converter
#[cfg(feature = "opencc")]
pub struct OpenccConverter {
    engine: opencc_fmmseg::OpenCC,
    profile: String,
}

#[cfg(feature = "opencc")]
impl OpenccConverter {
    /// Create a converter for the given profile (e.g. "s2t")
    pub fn new(profile: &str) -> Result<Self, ConversionError> {
        if !is_supported_profile(profile) {
            return Err(ConversionError::EngineUnavailable(format!(
                "unknown conversion profile '{}'",
                profile
            )));
        }

        Ok(Self {
            engine: opencc_fmmseg::OpenCC::new(),
            profile: profile.to_string(),
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }
}

#[cfg(feature = "opencc")]
impl Debug for OpenccConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenccConverter")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "opencc")]
impl CharacterConverter for OpenccConverter {
    fn name(&self) -> &str {
        "opencc"
    }

    fn convert(&self, text: &str) -> Result<String, ConversionError> {
        Ok(self.engine.convert(text, &self.profile, false))
    }
}

/// Create the default converter for `profile`
///
/// Fails with [`ConversionError::EngineUnavailable`] when the profile is
/// unknown or the crate was built without an engine.
pub fn create_converter(profile: &str) -> Result<Arc<dyn CharacterConverter>, ConversionError> {
    #[cfg(feature = "opencc")]
    {
        let converter = OpenccConverter::new(profile)?;
        Ok(Arc::new(converter))
    }

    #[cfg(not(feature = "opencc"))]
    {
        Err(ConversionError::EngineUnavailable(format!(
            "built without a conversion engine (profile '{}')",
            profile
        )))
    }
}
