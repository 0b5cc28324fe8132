/*!
 * Common test utilities for the chaperone test suite
 */

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use chaperone::app_config::KeywordSourceConfig;
use chaperone::keywords::{KeywordDictionary, KeywordRule, RuleSet};
use chaperone::severity::Severity;
use chaperone::{Config, DuplicatePolicy};

/// Keyword CSV used by most tests
pub const SAMPLE_KEYWORDS_CSV: &str = "cleaned_words,mod_categories,mod_critical
kill,\"['violence', 'threat']\",HIGH
bad word,['profanity'],MEDIUM
idiot,['insult'],LOW
";

/// A small meeting transcript with three speakers and one NOTE block
pub const SAMPLE_TRANSCRIPT: &str = "WEBVTT

1
00:00:01.000 --> 00:00:04.000
Alice: Good morning everyone.

2
00:00:05.000 --> 00:00:08.500
Bob: I will kill you in this game.

NOTE the next cue uses a voice tag

3
00:00:09.000 --> 00:00:12.000
<v Carol>That was a bad word, Bob.</v>
";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Wraps cue texts into a WebVTT document, one cue per entry
pub fn vtt(cues: &[&str]) -> String {
    let mut content = String::from("WEBVTT\n");
    for (i, text) in cues.iter().enumerate() {
        content.push_str(&format!(
            "\n{}\n00:00:{:02}.000 --> 00:00:{:02}.500\n{}\n",
            i + 1,
            i,
            i,
            text
        ));
    }
    content
}

/// Builds a rule set from `(phrase, "cat1,cat2", severity)` triples
pub fn rule_set(rules: &[(&str, &str, Severity)]) -> RuleSet {
    RuleSet::new(
        rules
            .iter()
            .map(|(phrase, categories, severity)| {
                let categories: Vec<&str> = categories.split(',').filter(|c| !c.is_empty()).collect();
                KeywordRule::new(phrase, &categories, *severity).unwrap()
            })
            .collect(),
    )
}

/// Rule set loaded from `SAMPLE_KEYWORDS_CSV`
pub fn sample_rules() -> RuleSet {
    KeywordDictionary::load_csv(SAMPLE_KEYWORDS_CSV.as_bytes(), &KeywordSourceConfig::default())
        .unwrap()
        .rules
}

/// Fixed processing time for byte-for-byte comparisons
pub fn pinned_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap()
}

/// Config whose keyword source and output directory live under `dir`
pub fn create_test_config(dir: &Path) -> Result<Config> {
    let keywords = create_test_file(dir, "keywords.csv", SAMPLE_KEYWORDS_CSV)?;
    let mut config = Config::default();
    config.keywords.path = keywords.display().to_string();
    config.keywords.duplicate_policy = DuplicatePolicy::HighestSeverity;
    config.output_dir = dir.join("results").display().to_string();
    config.concurrent_jobs = 2;
    Ok(config)
}
