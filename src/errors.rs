/*!
 * Error types for the zhcorrect application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised by the character conversion engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The conversion engine could not be created, so correction is refused
    #[error("Conversion engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine failed on one of the segments; the whole pass is abandoned
    #[error("Segment conversion failed ({segment_chars} chars): {message}")]
    SegmentFailure {
        /// Length of the failing segment in characters
        segment_chars: usize,
        /// Error message from the engine
        message: String,
    },

    /// The background conversion task died before delivering a result
    #[error("Conversion task failed: {0}")]
    TaskFailed(String),
}

/// Errors that can occur while extracting text from a Word document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The path does not point to an existing file
    #[error("File not found: {0}")]
    NotFound(String),

    /// The file is not a .doc or .docx document
    #[error("Unsupported file format: {0} (only .doc and .docx are supported)")]
    UnsupportedExtension(String),

    /// The document is encrypted and no password was supplied
    #[error("Document is password protected: {0}")]
    PasswordRequired(String),

    /// A password was supplied but did not unlock the document
    #[error("Decryption failed, the password may be incorrect: {0}")]
    WrongPassword(String),

    /// The document uses an encryption scheme this tool cannot open
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// Every extraction strategy failed
    #[error("Unable to read document: {0}")]
    ReadFailed(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Whether the caller should ask for a password and try again
    pub fn is_password_required(&self) -> bool {
        matches!(self, Self::PasswordRequired(_))
    }
}

/// Errors from the protected-word and settings stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or parsing the persisted data failed
    #[error("Failed to load {what}: {message}")]
    Load {
        /// Which store failed
        what: &'static str,
        /// Underlying error message
        message: String,
    },

    /// Writing the persisted data failed
    #[error("Failed to save {what}: {message}")]
    Save {
        /// Which store failed
        what: &'static str,
        /// Underlying error message
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the conversion engine
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from document extraction
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from a persistent store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
