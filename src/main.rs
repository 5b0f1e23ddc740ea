// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use zhcorrect::app_config::{self, Settings};
use zhcorrect::app_controller::{Controller, PasswordPrompt};
use zhcorrect::conversion::engine::SUPPORTED_PROFILES;
use zhcorrect::file_utils::FileManager;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a Word document, correct its text and save the result
    Correct(CorrectArgs),

    /// Correct a piece of text given as argument or on stdin
    Convert {
        /// Text to correct; read from stdin when omitted
        text: Option<String>,
    },

    /// Manage the protected word list
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },

    /// Show or change the settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Generate shell completions for zhcorrect
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CorrectArgs {
    /// Word document (.doc/.docx); quoted, braced and file:// paths are accepted
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output text file (default: <INPUT>.corrected.txt next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Password of an encrypted document
    #[arg(short, long, env = "ZHCORRECT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print the corrected text instead of writing a file
    #[arg(long)]
    stdout: bool,
}

#[derive(Subcommand, Debug)]
enum WordsAction {
    /// List protected words
    List,
    /// Add a protected word
    Add { word: String },
    /// Remove a protected word
    Remove { word: String },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        font_family: Option<String>,

        #[arg(long)]
        font_size: Option<u32>,

        /// Conversion profile (s2t, s2tw, s2hk, ...)
        #[arg(long)]
        profile: Option<String>,
    },
}

/// zhcorrect - Simplified to Traditional Chinese correction for Word documents
#[derive(Parser, Debug)]
#[command(name = "zhcorrect")]
#[command(version)]
#[command(about = "Simplified to Traditional Chinese correction with protected words")]
#[command(long_about = "zhcorrect extracts the text of Word documents and converts Simplified Chinese
to Traditional Chinese, leaving every protected word exactly as written.

EXAMPLES:
    zhcorrect correct report.docx                 # Writes report.corrected.txt
    zhcorrect correct -p secret locked.docx       # Encrypted document
    zhcorrect correct report.docx --stdout        # Print instead of saving
    zhcorrect convert \"这个软件\"                  # Correct a string
    zhcorrect words add 软件                       # Protect a word
    zhcorrect settings set --profile s2tw         # Taiwan standard
    zhcorrect completions bash > zhcorrect.bash   # Generate bash completions

CONFIGURATION:
    protected_words.json and settings.json are kept in the directory given by
    --config-dir (default: current directory) and created on first use.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding protected_words.json and settings.json
    #[arg(short, long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Asks for the password on the terminal, with the spinner held still
struct TerminalPasswordPrompt {
    progress: ProgressBar,
}

impl TerminalPasswordPrompt {
    fn new(progress: ProgressBar) -> Self {
        Self { progress }
    }

    /// Prompt on `output` and read one line from `input`, spinner suspended
    fn ask_with<R: BufRead, W: Write>(
        &self,
        path: &Path,
        input: &mut R,
        output: &mut W,
    ) -> Option<String> {
        // Spinner redraws would wipe the prompt line
        self.progress.suspend(|| {
            let _ = write!(output, "Password for {}: ", path.display());
            let _ = output.flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => {
                    let password = line.trim_end_matches(['\r', '\n']).to_string();
                    (!password.is_empty()).then_some(password)
                }
            }
        })
    }
}

impl PasswordPrompt for TerminalPasswordPrompt {
    fn ask_password(&self, path: &Path) -> Option<String> {
        self.ask_with(path, &mut std::io::stdin().lock(), &mut std::io::stderr())
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with warn level by default so CLI output stays clean
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Warn);

    let cli = CommandLineOptions::parse();

    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "zhcorrect", &mut std::io::stdout());
            Ok(())
        }
        command => {
            FileManager::ensure_dir(&cli.config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", cli.config_dir))?;
            debug!("Using config directory {:?}", cli.config_dir);
            let controller = Controller::with_json_stores(&cli.config_dir);

            match command {
                Commands::Correct(args) => run_correct(&controller, args).await,
                Commands::Convert { text } => run_convert(&controller, text).await,
                Commands::Words { action } => run_words(&controller, action),
                Commands::Settings { action } => run_settings(&controller, action).await,
                Commands::Completions { .. } => Ok(()),
            }
        }
    }
}

async fn run_correct(controller: &Controller, args: CorrectArgs) -> Result<()> {
    let input = FileManager::normalize_input_path(&args.input)?;

    let progress = spinner(&format!("Processing {}", input.display()))?;
    let prompt = TerminalPasswordPrompt::new(progress.clone());
    let loaded = controller
        .open_document(&input, args.password.clone(), &prompt)
        .await;
    progress.finish_and_clear();

    if !loaded.with_context(|| format!("Failed to correct {}", input.display()))? {
        return Err(anyhow!(controller.status()));
    }

    if args.stdout {
        println!("{}", controller.text());
        return Ok(());
    }

    let output = match args.output {
        Some(output) => output,
        None => {
            let dir = input.parent().unwrap_or(Path::new("")).to_path_buf();
            FileManager::generate_output_path(&input, dir, "corrected", "txt")
        }
    };
    let saved = controller.save_text(&output)?;
    info!("Success: {:?}", saved);
    println!("{}", saved.display());
    Ok(())
}

async fn run_convert(controller: &Controller, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    controller.set_text(text);
    controller.correct_text().await?;
    print!("{}", controller.text());
    std::io::stdout().flush()?;
    Ok(())
}

fn run_words(controller: &Controller, action: WordsAction) -> Result<()> {
    match action {
        WordsAction::List => {
            for word in controller.protected_words() {
                println!("{}", word);
            }
        }
        WordsAction::Add { word } => {
            let stored = controller.add_word(&word)?;
            println!("Added: {}", stored);
        }
        WordsAction::Remove { word } => {
            if controller.remove_word(&word)? {
                println!("Removed: {}", word);
            } else {
                return Err(anyhow!("'{}' is not a protected word", word));
            }
        }
    }
    Ok(())
}

async fn run_settings(controller: &Controller, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let json = serde_json::to_string_pretty(&controller.settings())
                .context("Failed to serialize settings")?;
            println!("{}", json);
        }
        SettingsAction::Set {
            font_family,
            font_size,
            profile,
        } => {
            let mut settings: Settings = controller.settings();
            if let Some(font_family) = font_family {
                settings.font_family = font_family;
            }
            if let Some(font_size) = font_size {
                settings.font_size = font_size;
            }
            if let Some(profile) = profile {
                if !SUPPORTED_PROFILES.contains(&profile.as_str()) {
                    return Err(anyhow!(
                        "Unknown profile '{}', expected one of: {}",
                        profile,
                        SUPPORTED_PROFILES.join(", ")
                    ));
                }
                settings.conversion_profile = profile;
            }
            controller.update_settings(settings).await?;
            println!("{}", controller.status());
        }
    }
    Ok(())
}
