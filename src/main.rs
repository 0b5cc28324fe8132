// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use chaperone::app_config::{self, Config, DuplicatePolicy};
use chaperone::app_controller::Controller;

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

/// CLI Wrapper for DuplicatePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDuplicatePolicy {
    HighestSeverity,
    LastRow,
}

impl From<CliDuplicatePolicy> for DuplicatePolicy {
    fn from(cli_policy: CliDuplicatePolicy) -> Self {
        match cli_policy {
            CliDuplicatePolicy::HighestSeverity => DuplicatePolicy::HighestSeverity,
            CliDuplicatePolicy::LastRow => DuplicatePolicy::LastRow,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Moderate a transcript file or every transcript in a directory
    Moderate(ModerateArgs),

    /// Load a keyword dictionary and report what would be used
    CheckKeywords(KeywordArgs),

    /// Generate shell completions for chaperone
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ModerateArgs {
    /// Transcript file (.vtt/.srt) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    keywords: KeywordArgs,

    /// Job identifier (single file only; a random id is used otherwise)
    #[arg(short, long)]
    job_id: Option<String>,

    /// Original s3:// location of the transcript, recorded in the report
    #[arg(short = 'u', long)]
    transcript_url: Option<String>,

    /// Directory that receives the reports
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Treat '-' as part of a word when checking single-word boundaries
    #[arg(long)]
    hyphen_word_char: bool,

    /// Force overwrite of existing reports
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct KeywordArgs {
    /// Keyword CSV file (overrides the configuration)
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// How duplicate keyword rows are merged
    #[arg(long, value_enum)]
    duplicate_policy: Option<CliDuplicatePolicy>,

    /// Configuration file path
    #[arg(short, long, default_value = "chaperone.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Chaperone - rules-based transcript moderation
///
/// Scans meeting transcripts for prohibited keywords and phrases and writes a
/// scored violation report per transcript.
#[derive(Parser, Debug)]
#[command(name = "chaperone")]
#[command(version)]
#[command(about = "Rules-based transcript moderation tool")]
#[command(long_about = "Chaperone matches a keyword dictionary against WebVTT transcripts and writes
one rules_result.json report per transcript.

EXAMPLES:
    chaperone moderate meeting.vtt -k keywords.csv          # Moderate one transcript
    chaperone moderate -j job-42 meeting.vtt                # Use a fixed job id
    chaperone moderate -f --log-level debug transcripts/    # Moderate a whole folder
    chaperone check-keywords -k keywords.csv                # Validate a keyword file
    chaperone completions bash > chaperone.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in chaperone.json by default. You can specify a
    different file with --config-path. If the file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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

    // @returns: Emoji and colour for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
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
            let (emoji, colour) = Self::decoration_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chaperone", &mut std::io::stdout());
            Ok(())
        }
        Commands::CheckKeywords(args) => run_check_keywords(args),
        Commands::Moderate(args) => run_moderate(args).await,
    }
}

// @loads: Configuration file (creating a default one) with CLI overrides applied
fn load_config(args: &KeywordArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &args.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = &args.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader::<_, Config>(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(keywords) = &args.keywords {
        config.keywords.path = keywords.display().to_string();
    }

    if let Some(policy) = &args.duplicate_policy {
        config.keywords.duplicate_policy = policy.clone().into();
    }

    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if args.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn run_check_keywords(args: KeywordArgs) -> Result<()> {
    let config = load_config(&args)?;
    let load = Controller::load_keywords(&config.keywords)?;

    for skipped in &load.skipped {
        warn!("Row {}: {}", skipped.row_number, skipped.reason);
    }

    info!(
        "{}: {} rules ({} single words, {} phrases), {} rows skipped, {} duplicates merged",
        config.keywords.path,
        load.rules.len(),
        load.rules.single_word_count(),
        load.rules.phrase_count(),
        load.skipped_rows,
        load.duplicate_rows
    );
    info!("Rule set fingerprint: {}", load.rules.fingerprint());

    Ok(())
}

async fn run_moderate(args: ModerateArgs) -> Result<()> {
    let mut config = load_config(&args.keywords)?;

    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }

    if args.hyphen_word_char {
        config.matching.hyphen_is_word_char = true;
    }

    let controller = Controller::with_config(config)?;

    if args.input_path.is_file() {
        let summary = controller.run(
            &args.input_path,
            args.job_id.clone(),
            args.transcript_url.clone(),
            args.force_overwrite,
        )?;

        if let Some(summary) = summary {
            let json = serde_json::to_string_pretty(&summary).context("Failed to serialize job summary")?;
            println!("{}", json);
        }
    } else if args.input_path.is_dir() {
        if args.job_id.is_some() || args.transcript_url.is_some() {
            warn!("--job-id and --transcript-url are ignored in folder mode");
        }

        let folder = controller
            .run_folder(args.input_path.clone(), args.force_overwrite)
            .await?;

        let json = serde_json::to_string_pretty(&folder.summaries).context("Failed to serialize job summaries")?;
        println!("{}", json);

        if folder.failed > 0 {
            return Err(anyhow!("{} transcripts failed moderation", folder.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}
