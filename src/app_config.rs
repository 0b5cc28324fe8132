use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

/// Application configuration module
/// This module handles the configuration of the moderation binary: where the
/// keyword dictionary lives, how its CSV columns are named, how matches are
/// bounded and how progress is reported. It is built once by the caller and
/// passed by reference into the engine.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Keyword dictionary source
    #[serde(default)]
    pub keywords: KeywordSourceConfig,

    /// Matching options for the pattern automaton
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Seconds between progress reports during long scans
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Directory that receives `<job_id>/rules_result.json`
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Transcripts moderated in parallel in folder mode
    #[serde(default = "default_concurrent_jobs")]
    pub concurrent_jobs: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Policy applied when the same normalized phrase appears on several rows
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the highest severity seen and union the categories
    #[default]
    HighestSeverity,
    /// The last row replaces earlier ones entirely
    LastRow,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighestSeverity => write!(f, "highest_severity"),
            Self::LastRow => write!(f, "last_row"),
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "highest_severity" | "highest-severity" => Ok(Self::HighestSeverity),
            "last_row" | "last-row" => Ok(Self::LastRow),
            _ => Err(anyhow!("Invalid duplicate policy: {}", s)),
        }
    }
}

/// Where the keyword rows come from and how the CSV columns are named
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KeywordSourceConfig {
    /// Path of the keyword CSV file
    #[serde(default = "String::new")]
    pub path: String,

    /// Column holding the keyword or phrase
    #[serde(default = "default_phrase_column")]
    pub phrase_column: String,

    /// Column holding the serialized category list
    #[serde(default = "default_categories_column")]
    pub categories_column: String,

    /// Column holding LOW / MEDIUM / HIGH
    #[serde(default = "default_severity_column")]
    pub severity_column: String,

    /// How duplicate phrases are merged
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for KeywordSourceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            phrase_column: default_phrase_column(),
            categories_column: default_categories_column(),
            severity_column: default_severity_column(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Options that change which automaton hits are accepted as violations
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchingConfig {
    /// Treat `-` as part of a word for the single-word boundary check.
    ///
    /// Off by default: only alphanumerics glue a match to its neighbours.
    #[serde(default)]
    pub hyphen_is_word_char: bool,
}

impl MatchingConfig {
    /// Whether `c` continues a word for boundary purposes
    pub fn is_word_char(&self, c: char) -> bool {
        c.is_alphanumeric() || (self.hyphen_is_word_char && c == '-')
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_phrase_column() -> String {
    "cleaned_words".to_string()
}

fn default_categories_column() -> String {
    "mod_categories".to_string()
}

fn default_severity_column() -> String {
    "mod_critical".to_string()
}

fn default_progress_interval_secs() -> u64 {
    10
}

fn default_output_dir() -> String {
    "moderation-results".to_string()
}

fn default_concurrent_jobs() -> usize {
    4
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("phrase_column", &self.keywords.phrase_column),
            ("categories_column", &self.keywords.categories_column),
            ("severity_column", &self.keywords.severity_column),
        ];
        for (name, value) in &columns {
            if value.trim().is_empty() {
                return Err(anyhow!("keywords.{} must not be empty", name));
            }
        }
        for (i, (name_a, a)) in columns.iter().enumerate() {
            for (name_b, b) in columns.iter().skip(i + 1) {
                if a == b {
                    return Err(anyhow!(
                        "keywords.{} and keywords.{} both name column '{}'",
                        name_a, name_b, a
                    ));
                }
            }
        }

        if self.progress_interval_secs == 0 {
            return Err(anyhow!("progress_interval_secs must be at least 1"));
        }

        if self.concurrent_jobs == 0 {
            return Err(anyhow!("concurrent_jobs must be at least 1"));
        }

        Ok(())
    }

    /// Progress interval as a duration
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            keywords: KeywordSourceConfig::default(),
            matching: MatchingConfig::default(),
            progress_interval_secs: default_progress_interval_secs(),
            output_dir: default_output_dir(),
            concurrent_jobs: default_concurrent_jobs(),
            log_level: LogLevel::default(),
        }
    }
}
