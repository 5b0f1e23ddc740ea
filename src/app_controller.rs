use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::app_config::Settings;
use crate::conversion::{
    CharacterConverter, CorrectionReceiver, CorrectionWorker, ProtectedCorrector, ProtectedWordSet,
    create_converter,
};
use crate::document::DocumentSource;
use crate::errors::{AppError, ConversionError, DocumentError, StoreError};
use crate::file_utils::FileManager;
use crate::store::{
    JsonSettingsStore, JsonWordStore, SETTINGS_FILENAME, SettingsStore, WORDS_FILENAME, WordStore,
};

// @module: Application controller for document correction

/// Builds a conversion engine for a profile name
pub type ConverterFactory =
    Box<dyn Fn(&str) -> Result<Arc<dyn CharacterConverter>, ConversionError> + Send + Sync>;

/// Asked for a password when a document turns out to be encrypted
pub trait PasswordPrompt: Send + Sync {
    /// `None` means the user cancelled
    fn ask_password(&self, path: &Path) -> Option<String>;
}

/// Prompt that never supplies a password
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPasswordPrompt;

impl PasswordPrompt for NoPasswordPrompt {
    fn ask_password(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Prompt that always answers with the same password
#[derive(Debug, Clone)]
pub struct FixedPasswordPrompt(pub String);

impl PasswordPrompt for FixedPasswordPrompt {
    fn ask_password(&self, _path: &Path) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Everything the user sees, mutated only through the controller
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub protected_words: ProtectedWordSet,
    pub settings: Settings,
    pub text: String,
    pub status: String,
}

struct Engine {
    worker: CorrectionWorker,
    receiver: CorrectionReceiver,
}

/// Main application controller
pub struct Controller {
    // @field: Shared application state
    state: Arc<RwLock<AppState>>,

    // @field: Persistence
    word_store: Box<dyn WordStore>,
    settings_store: Box<dyn SettingsStore>,

    // @field: Engine construction and the live engine, `None` when unavailable
    factory: ConverterFactory,
    engine: Mutex<Option<Engine>>,

    // @field: Bumped on every external text edit
    edits: AtomicU64,

    documents: Arc<DocumentSource>,
}

impl Controller {
    /// Create a controller, loading words and settings from the stores.
    ///
    /// Store failures fall back to an empty list or default settings and are
    /// reported through the status line.
    pub fn new(
        word_store: Box<dyn WordStore>,
        settings_store: Box<dyn SettingsStore>,
        factory: ConverterFactory,
    ) -> Self {
        let mut problems = Vec::new();

        let words = match word_store.load() {
            Ok(words) => ProtectedWordSet::from_words(words),
            Err(e) => {
                warn!("{}, starting with an empty word list", e);
                problems.push(e.to_string());
                ProtectedWordSet::new()
            }
        };

        let settings = match settings_store.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}, using default settings", e);
                problems.push(e.to_string());
                Settings::default()
            }
        };

        let engine = match Self::build_engine(&factory, &settings.conversion_profile) {
            Ok(engine) => Some(engine),
            Err(e) => {
                error!("{}", e);
                problems.push(e.to_string());
                None
            }
        };

        let status = if problems.is_empty() {
            "Ready".to_string()
        } else {
            problems.join("; ")
        };
        info!(
            "Controller ready: {} protected word(s), profile {}",
            words.len(),
            settings.conversion_profile
        );

        Self {
            state: Arc::new(RwLock::new(AppState {
                protected_words: words,
                settings,
                text: String::new(),
                status,
            })),
            word_store,
            settings_store,
            factory,
            engine: Mutex::new(engine),
            edits: AtomicU64::new(0),
            documents: Arc::new(DocumentSource::new()),
        }
    }

    /// Controller backed by the JSON files in `config_dir` and the default engine
    pub fn with_json_stores<P: AsRef<Path>>(config_dir: P) -> Self {
        let dir = config_dir.as_ref();
        Self::new(
            Box::new(JsonWordStore::new(dir.join(WORDS_FILENAME))),
            Box::new(JsonSettingsStore::new(dir.join(SETTINGS_FILENAME))),
            Box::new(|profile: &str| create_converter(profile)),
        )
    }

    fn build_engine(factory: &ConverterFactory, profile: &str) -> Result<Engine, ConversionError> {
        let converter = factory(profile)?;
        debug!("Conversion engine {} ready", converter.name());
        let (worker, receiver) = CorrectionWorker::new(ProtectedCorrector::new(converter));
        Ok(Engine { worker, receiver })
    }

    fn set_status(&self, status: impl Into<String>) {
        self.state.write().status = status.into();
    }

    /// Record a failure in the status line and the log, then hand it back
    fn fail<E: Into<AppError>>(&self, err: E) -> AppError {
        let err = err.into();
        error!("{}", err);
        self.set_status(err.to_string());
        err
    }

    fn file_label(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Whether a conversion engine is available
    pub async fn engine_available(&self) -> bool {
        self.engine.lock().await.is_some()
    }

    /// Extract a document and show its text, without correcting it.
    ///
    /// Blocking: call from a plain thread or inside `spawn_blocking`.
    pub fn load_document<P: AsRef<Path>>(
        &self,
        path: P,
        password: Option<&str>,
        prompt: &dyn PasswordPrompt,
    ) -> Result<bool, AppError> {
        let path = path.as_ref();
        self.set_status(format!("Processing {}", Self::file_label(path)));

        let text = match self.documents.extract(path, password) {
            Err(e) if e.is_password_required() => {
                info!("{} is password protected", path.display());
                let Some(password) = prompt.ask_password(path) else {
                    return Err(self.fail(e));
                };
                self.documents
                    .extract(path, Some(&password))
                    .map_err(|e| self.fail(e))?
            }
            other => other.map_err(|e| self.fail(e))?,
        };

        Ok(self.apply_document_text(path, text))
    }

    /// Async form of `load_document`; extraction runs on the blocking pool
    async fn extract_off_thread(
        &self,
        path: &Path,
        password: Option<String>,
    ) -> Result<String, DocumentError> {
        let documents = Arc::clone(&self.documents);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || documents.extract(&path, password.as_deref()))
            .await
            .map_err(|e| DocumentError::ReadFailed(format!("extraction task failed: {}", e)))?
    }

    fn apply_document_text(&self, path: &Path, text: String) -> bool {
        let label = Self::file_label(path);
        if text.trim().is_empty() {
            warn!("{} contains no text", path.display());
            self.set_status(format!("No text found in {}", label));
            return false;
        }

        self.edits.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write();
        state.text = text;
        state.status = format!("Loaded {}", label);
        true
    }

    /// Open a document, show its text and correct it right away.
    ///
    /// An encrypted document triggers one password prompt. Returns whether
    /// any text was loaded.
    pub async fn open_document<P: AsRef<Path>>(
        &self,
        path: P,
        password: Option<String>,
        prompt: &dyn PasswordPrompt,
    ) -> Result<bool, AppError> {
        let path = path.as_ref();
        self.set_status(format!("Processing {}", Self::file_label(path)));

        let text = match self.extract_off_thread(path, password).await {
            Err(e) if e.is_password_required() => {
                info!("{} is password protected", path.display());
                let Some(password) = prompt.ask_password(path) else {
                    return Err(self.fail(e));
                };
                self.extract_off_thread(path, Some(password))
                    .await
                    .map_err(|e| self.fail(e))?
            }
            other => other.map_err(|e| self.fail(e))?,
        };

        if !self.apply_document_text(path, text) {
            return Ok(false);
        }

        self.correct_text().await?;
        Ok(true)
    }

    /// Convert the current text, keeping protected words.
    ///
    /// The text is replaced only when the pass succeeds and nobody edited
    /// the text in the meantime.
    pub async fn correct_text(&self) -> Result<(), AppError> {
        let mut guard = self.engine.lock().await;
        let Some(engine) = guard.as_mut() else {
            return Err(self.fail(ConversionError::EngineUnavailable(
                "no conversion engine, correction is disabled".to_string(),
            )));
        };

        let (text, words) = {
            let state = self.state.read();
            (state.text.clone(), state.protected_words.snapshot())
        };
        let edits_before = self.edits.load(Ordering::SeqCst);
        self.set_status("Correcting text...");

        let start_time = Instant::now();
        let generation = engine.worker.submit(text, words);
        let outcome = engine.receiver.recv_latest().await.ok_or_else(|| {
            ConversionError::TaskFailed("correction channel closed".to_string())
        });
        let outcome = outcome.map_err(|e| self.fail(e))?;
        debug!("Correction #{} finished (asked for #{})", outcome.generation, generation);

        let corrected = outcome.result.map_err(|e| self.fail(e))?;

        if self.edits.load(Ordering::SeqCst) != edits_before {
            warn!("Text changed while correcting, discarding result #{}", generation);
            self.set_status("Text changed during correction, result discarded");
            return Ok(());
        }

        let mut state = self.state.write();
        state.text = corrected;
        state.status = format!(
            "Text correction finished in {}",
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    /// Add a protected word and persist the list.
    ///
    /// If saving fails the word stays in the in-memory list.
    pub fn add_word(&self, word: &str) -> Result<String, AppError> {
        let stored = {
            let mut state = self.state.write();
            state.protected_words.add(word)
        }
        .map_err(|e| self.fail(e))?;

        info!("Protected word added: {}", stored);
        self.persist_words()?;
        self.set_status(format!("Added protected word: {}", stored));
        Ok(stored)
    }

    /// Remove a protected word and persist the list; returns whether it existed
    pub fn remove_word(&self, word: &str) -> Result<bool, AppError> {
        let removed = self.state.write().protected_words.remove(word);
        if !removed {
            self.set_status(format!("'{}' is not a protected word", word));
            return Ok(false);
        }

        info!("Protected word removed: {}", word);
        self.persist_words()?;
        self.set_status(format!("Removed protected word: {}", word));
        Ok(true)
    }

    fn persist_words(&self) -> Result<(), AppError> {
        let words = self.state.read().protected_words.snapshot();
        self.word_store
            .save(&words)
            .map_err(|e: StoreError| self.fail(e))
    }

    /// Validate, apply and persist new settings
    pub async fn update_settings(&self, settings: Settings) -> Result<(), AppError> {
        settings
            .validate()
            .map_err(|e| self.fail(AppError::InvalidInput(e.to_string())))?;

        let profile_changed = self.state.read().settings.profile_changed(&settings);
        if profile_changed {
            let mut guard = self.engine.lock().await;
            match Self::build_engine(&self.factory, &settings.conversion_profile) {
                Ok(engine) => {
                    if let Some(old) = guard.as_ref() {
                        old.worker.invalidate();
                    }
                    *guard = Some(engine);
                    info!("Switched conversion profile to {}", settings.conversion_profile);
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        self.state.write().settings = settings.clone();
        self.settings_store.save(&settings).map_err(|e| self.fail(e))?;
        self.set_status("Settings saved");
        Ok(())
    }

    /// Write the current text as UTF-8
    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, AppError> {
        let path = path.as_ref();
        let text = self.text();
        FileManager::write_to_file(path, &text)
            .map_err(|e| self.fail(AppError::File(format!("{:#}", e))))?;

        info!("Saved {} chars to {}", text.chars().count(), path.display());
        self.set_status(format!("Saved to {}", Self::file_label(path)));
        Ok(path.to_path_buf())
    }

    pub fn text(&self) -> String {
        self.state.read().text.clone()
    }

    /// Replace the text as if the user edited it
    pub fn set_text(&self, text: impl Into<String>) {
        self.edits.fetch_add(1, Ordering::SeqCst);
        self.state.write().text = text.into();
    }

    pub fn status(&self) -> String {
        self.state.read().status.clone()
    }

    pub fn protected_words(&self) -> Vec<String> {
        self.state.read().protected_words.snapshot()
    }

    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    /// Shared handle to the state, for read-only observers
    pub fn state(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }

    /// Format a duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_millis = duration.as_millis();
        if total_millis < 1000 {
            return format!("{}ms", total_millis);
        }

        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}
