/*!
 * # Chaperone - rules-based transcript moderation
 *
 * A Rust library that scans speech transcripts for prohibited keywords and
 * phrases and produces a scored, structured violation report.
 *
 * ## Features
 *
 * - Keyword dictionaries loaded from CSV rows with per-row validation
 * - Aho–Corasick multi-pattern search in time linear in the text length
 * - Word-boundary checks for single words, substring matching for phrases
 * - WebVTT / SRT-style cue parsing with speaker detection
 * - Deterministic severity scoring and per-category breakdowns
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `keywords`: Keyword dictionary and rule sets
 * - `automaton`: Arena-based Aho–Corasick automaton
 * - `transcript`: Cue-based transcript parser
 * - `detector`: Violation detection over utterances
 * - `aggregator`: Severity scoring and category buckets
 * - `engine`: The `process` pipeline and automaton cache
 * - `report` / `job`: Report wire format and job metadata
 * - `app_config`: Configuration management
 * - `file_utils` / `app_controller`: Filesystem plumbing for the binary
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(non_snake_case)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod severity;
pub mod normalize;
pub mod keywords;
pub mod automaton;
pub mod transcript;
pub mod detector;
pub mod aggregator;
pub mod report;
pub mod job;
pub mod engine;
pub mod file_utils;
pub mod app_controller;

// Re-export main types for easier usage
pub use app_config::{Config, DuplicatePolicy, KeywordSourceConfig, MatchingConfig};
pub use automaton::{AutomatonMatch, PatternAutomaton};
pub use detector::{ScanProgress, Violation, ViolationDetector};
pub use engine::{process, ModerationEngine};
pub use errors::{AppError, ModerationError};
pub use job::{JobMetadata, JobSummary, S3Location};
pub use keywords::{DictionaryLoad, KeywordDictionary, KeywordRule, RawKeywordRow, RuleSet};
pub use report::{CategoryBucket, CategoryFlag, ModerationReport};
pub use severity::{Severity, SeverityLevel};
pub use transcript::{ParsedTranscript, TranscriptParser, Utterance};
