use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

// @module: File and path utilities

/// Any `scheme://` prefix of a pasted path
static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://").expect("valid scheme regex"));

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @checks: .doc or .docx extension, any case
    pub fn is_word_document<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                ext.eq_ignore_ascii_case("doc") || ext.eq_ignore_ascii_case("docx")
            })
            .unwrap_or(false)
    }

    // @generates: Output path for a corrected document
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        // Get the file stem (filename without extension)
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        if !suffix.is_empty() {
            output_filename.push('.');
            output_filename.push_str(suffix);
        }
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));

        output_dir.join(output_filename)
    }

    /// Turn a pasted or dropped path into a filesystem path.
    ///
    /// Strips surrounding whitespace, braces and quotes, and converts
    /// `file://` URLs. Any other URL scheme is rejected.
    pub fn normalize_input_path(raw: &str) -> Result<PathBuf> {
        let mut cleaned = raw.trim();
        if cleaned.starts_with('{') && cleaned.ends_with('}') && cleaned.len() >= 2 {
            cleaned = cleaned[1..cleaned.len() - 1].trim();
        }
        let cleaned = cleaned.trim_matches(|c| c == '"' || c == '\'').trim();

        if cleaned.is_empty() {
            return Err(anyhow!("Empty path"));
        }

        if let Some(captures) = URL_SCHEME.captures(cleaned) {
            let scheme = &captures[1];
            if !scheme.eq_ignore_ascii_case("file") {
                return Err(anyhow!("Unsupported location '{}': only local files can be opened", cleaned));
            }
            let url = Url::parse(cleaned).with_context(|| format!("Invalid file URL: {}", cleaned))?;
            return url
                .to_file_path()
                .map_err(|_| anyhow!("File URL does not name a local path: {}", cleaned));
        }

        Ok(PathBuf::from(cleaned))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Replace a file's content through a temp file in the same directory
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write temp file for {:?}", path))?;
        temp.as_file().sync_all()?;
        temp.persist(path)
            .with_context(|| format!("Failed to replace file: {:?}", path))?;

        Ok(())
    }
}
