/*!
 * # zhcorrect - Simplified to Traditional Chinese correction
 *
 * A Rust library that converts Simplified Chinese text to Traditional
 * Chinese while leaving a user-maintained list of protected words verbatim.
 *
 * ## Features
 *
 * - Text extraction from Word documents (.docx), including agile-encrypted ones
 * - Protected-word-aware conversion:
 *   - every occurrence of a protected word is located first
 *   - only the text between occurrences goes through the engine
 * - Background correction where the latest request wins
 * - JSON persistence of the word list and the settings
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Settings and their validation
 * - `conversion`: The correction pass:
 *   - `conversion::locator`: Protected span location
 *   - `conversion::segmenter`: Gap conversion and reassembly
 *   - `conversion::engine`: Character conversion engine trait
 *   - `conversion::worker`: Background correction
 * - `document`: Word document text extraction
 * - `store`: Word list and settings persistence
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod conversion;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod store;

// Re-export main types for easier usage
pub use app_config::Settings;
pub use app_controller::{Controller, PasswordPrompt};
pub use conversion::{CharacterConverter, ProtectedCorrector, TieBreak, convert_segments, locate};
pub use document::DocumentSource;
pub use errors::{AppError, ConversionError, DocumentError, StoreError};
