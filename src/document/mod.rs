/*!
 * Document source: text extraction from Word files.
 *
 * Extraction runs a fixed chain of strategies. The first one producing
 * non-empty text wins. Password-related failures stop the chain at once so
 * the caller can ask for a password.
 */

use log::{debug, info, warn};
use std::path::Path;

use crate::errors::DocumentError;
use crate::file_utils::FileManager;

pub use self::docx::{Block, FlatTextStrategy, StructuredStrategy};

pub mod crypto;
pub mod docx;

/// Message fragments that mark a generic failure as a password problem
const PASSWORD_KEYWORDS: [&str; 5] = ["password", "encrypted", "保護", "密碼", "加密"];

/// One way of turning document bytes into text
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs and error summaries
    fn name(&self) -> &'static str;

    /// Extract text; `Ok("")` means the strategy found nothing
    fn attempt(&self, bytes: &[u8], password: Option<&str>) -> Result<String, DocumentError>;
}

/// Decrypts an agile-encrypted package, then retries the inner strategies
pub struct DecryptThenRetry {
    inner: Vec<Box<dyn ExtractionStrategy>>,
}

impl DecryptThenRetry {
    pub fn new(inner: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { inner }
    }
}

impl Default for DecryptThenRetry {
    fn default() -> Self {
        Self::new(vec![Box::new(StructuredStrategy), Box::new(FlatTextStrategy)])
    }
}

impl ExtractionStrategy for DecryptThenRetry {
    fn name(&self) -> &'static str {
        "decrypt-then-retry"
    }

    fn attempt(&self, bytes: &[u8], password: Option<&str>) -> Result<String, DocumentError> {
        if !crypto::is_encrypted(bytes) {
            return Err(DocumentError::ReadFailed(
                "no EncryptionInfo stream, nothing to decrypt".to_string(),
            ));
        }
        let password = password.ok_or_else(|| {
            DocumentError::PasswordRequired("document is encrypted".to_string())
        })?;

        let decrypted = crypto::decrypt(bytes, password)?;
        run_chain(&self.inner, &decrypted, None)
    }
}

fn is_password_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    PASSWORD_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Run strategies in order. Returns `Ok("")` only when every strategy
/// either missed or produced nothing and at least one produced nothing.
fn run_chain(
    strategies: &[Box<dyn ExtractionStrategy>],
    bytes: &[u8],
    password: Option<&str>,
) -> Result<String, DocumentError> {
    let mut failures = Vec::new();
    let mut found_empty = false;

    for strategy in strategies {
        match strategy.attempt(bytes, password) {
            Ok(text) if !text.trim().is_empty() => {
                debug!("{} extracted {} chars", strategy.name(), text.chars().count());
                return Ok(text);
            }
            Ok(_) => {
                debug!("{} found no text", strategy.name());
                found_empty = true;
            }
            Err(
                e @ (DocumentError::PasswordRequired(_)
                | DocumentError::WrongPassword(_)
                | DocumentError::UnsupportedEncryption(_)),
            ) => return Err(e),
            Err(e) => {
                debug!("{} failed: {}", strategy.name(), e);
                failures.push(format!("{}: {}", strategy.name(), e));
            }
        }
    }

    if found_empty {
        return Ok(String::new());
    }

    let summary = failures.join("; ");
    if is_password_message(&summary) {
        return Err(DocumentError::PasswordRequired(summary));
    }
    Err(DocumentError::ReadFailed(summary))
}

/// Reads .doc/.docx files through the strategy chain
pub struct DocumentSource {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for DocumentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource {
    /// Source with the standard chain: flat text, structured, decrypt-then-retry
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(FlatTextStrategy),
            Box::new(StructuredStrategy),
            Box::new(DecryptThenRetry::default()),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract the text of the document at `path`
    pub fn extract<P: AsRef<Path>>(
        &self,
        path: P,
        password: Option<&str>,
    ) -> Result<String, DocumentError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !FileManager::file_exists(path) {
            return Err(DocumentError::NotFound(display));
        }
        if !FileManager::is_word_document(path) {
            return Err(DocumentError::UnsupportedExtension(display));
        }

        let bytes = std::fs::read(path)?;
        info!("Reading {} ({} bytes)", display, bytes.len());
        self.extract_bytes(&bytes, password)
            .inspect_err(|e| warn!("Extraction of {} failed: {}", display, e))
    }

    /// Extract from bytes already in memory
    pub fn extract_bytes(&self, bytes: &[u8], password: Option<&str>) -> Result<String, DocumentError> {
        if password.is_none() && crypto::is_encrypted(bytes) {
            return Err(DocumentError::PasswordRequired(
                "document is encrypted".to_string(),
            ));
        }
        run_chain(&self.strategies, bytes, password)
    }
}
