/*!
 * Tests for application configuration
 */

use std::time::Duration;

use chaperone::app_config::{Config, DuplicatePolicy, LogLevel, MatchingConfig};

/// Test that the default configuration is valid and uses the documented defaults
#[test]
fn test_default_config_shouldBeValid() {
    let config = Config::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.keywords.phrase_column, "cleaned_words");
    assert_eq!(config.keywords.categories_column, "mod_categories");
    assert_eq!(config.keywords.severity_column, "mod_critical");
    assert_eq!(config.keywords.duplicate_policy, DuplicatePolicy::HighestSeverity);
    assert_eq!(config.progress_interval(), Duration::from_secs(10));
    assert!(!config.matching.hyphen_is_word_char);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a partial JSON file is completed with defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "keywords": { "path": "keywords.csv", "duplicate_policy": "last_row" },
        "matching": { "hyphen_is_word_char": true },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.keywords.path, "keywords.csv");
    assert_eq!(config.keywords.phrase_column, "cleaned_words");
    assert_eq!(config.keywords.duplicate_policy, DuplicatePolicy::LastRow);
    assert!(config.matching.hyphen_is_word_char);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.concurrent_jobs, 4);
    assert_eq!(config.output_dir, "moderation-results");
}

/// Test that the serialized default config reads back unchanged
#[test]
fn test_serialize_defaultConfig_shouldReadBack() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
}

/// Test that validation rejects empty and clashing column names
#[test]
fn test_validate_withBadColumns_shouldFail() {
    let mut config = Config::default();
    config.keywords.phrase_column = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.keywords.severity_column = config.keywords.categories_column.clone();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("mod_categories"));
}

/// Test that validation rejects zero interval and zero concurrency
#[test]
fn test_validate_withZeroCounters_shouldFail() {
    let mut config = Config::default();
    config.progress_interval_secs = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.concurrent_jobs = 0;
    assert!(config.validate().is_err());
}

/// Test duplicate policy parsing and display
#[test]
fn test_duplicatePolicy_fromStr_shouldAcceptBothSpellings() {
    assert_eq!("highest_severity".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::HighestSeverity);
    assert_eq!("Last-Row".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::LastRow);
    assert!("first_row".parse::<DuplicatePolicy>().is_err());
    assert_eq!(DuplicatePolicy::LastRow.to_string(), "last_row");
}

/// Test the word character predicate used by boundary checks
#[test]
fn test_matchingConfig_isWordChar_shouldHonourHyphenOption() {
    let default = MatchingConfig::default();
    let hyphenated = MatchingConfig { hyphen_is_word_char: true };

    assert!(default.is_word_char('a'));
    assert!(default.is_word_char('7'));
    assert!(default.is_word_char('ß'));
    assert!(!default.is_word_char('-'));
    assert!(!default.is_word_char('\''));
    assert!(hyphenated.is_word_char('-'));
}

/// Test log level mapping
#[test]
fn test_logLevel_toLevelFilter_shouldMap() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
