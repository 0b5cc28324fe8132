/*!
 * Tests for keyword dictionary loading
 */

use chaperone::app_config::{DuplicatePolicy, KeywordSourceConfig};
use chaperone::errors::ModerationError;
use chaperone::keywords::{KeywordDictionary, KeywordRule, RawKeywordRow, RuleSet, read_csv_rows};
use chaperone::severity::Severity;

use crate::common;

/// Test that the sample dictionary loads with normalized phrases in row order
#[test]
fn test_loadCsv_withSampleDictionary_shouldLoadAllRows() {
    let load = KeywordDictionary::load_csv(common::SAMPLE_KEYWORDS_CSV.as_bytes(), &KeywordSourceConfig::default())
        .unwrap();

    assert_eq!(load.skipped_rows, 0);
    assert_eq!(load.duplicate_rows, 0);
    let phrases: Vec<&str> = load.rules.rules().iter().map(|r| r.phrase()).collect();
    assert_eq!(phrases, vec!["kill", "bad word", "idiot"]);

    let kill = &load.rules.rules()[0];
    assert_eq!(kill.categories(), &["violence".to_string(), "threat".to_string()]);
    assert_eq!(kill.severity(), Severity::High);
    assert!(kill.is_single_word());
    assert!(!load.rules.rules()[1].is_single_word());
}

/// Test that column names come from the keyword source configuration
#[test]
fn test_loadCsv_withCustomColumns_shouldUseConfiguredNames() {
    let csv = "level,word,tags\nlow,Jerk,\"['rude']\"\nhigh,  Shut   UP  ,[]\n";
    let source = KeywordSourceConfig {
        phrase_column: "word".to_string(),
        categories_column: "tags".to_string(),
        severity_column: "level".to_string(),
        ..KeywordSourceConfig::default()
    };

    let load = KeywordDictionary::load_csv(csv.as_bytes(), &source).unwrap();

    assert_eq!(load.rules.len(), 2);
    assert_eq!(load.rules.rules()[0].phrase(), "jerk");
    assert_eq!(load.rules.rules()[0].severity(), Severity::Low);
    assert_eq!(load.rules.rules()[1].phrase(), "shut up");
    assert!(load.rules.rules()[1].categories().is_empty());
}

/// Test that a byte order mark on the header does not hide the phrase column
#[test]
fn test_readCsvRows_withBom_shouldFindPhraseColumn() {
    let csv = "\u{feff}cleaned_words,mod_categories,mod_critical\nkill,[],HIGH\n";
    let rows = read_csv_rows(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap();
    assert_eq!(rows, vec![RawKeywordRow::new("kill", "[]", "HIGH")]);
}

/// Test that short rows and a missing severity column skip rows instead of failing
#[test]
fn test_loadCsv_withShortRows_shouldSkipAndCount() {
    let csv = "cleaned_words,mod_categories,mod_critical\njerk\nkill,\"['violence']\",HIGH\nfool,['insult'],EXTREME\n";
    let load = KeywordDictionary::load_csv(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap();

    assert_eq!(load.rules.len(), 1);
    assert_eq!(load.skipped_rows, 2);
    assert_eq!(load.skipped[0].row_number, 1);
    assert_eq!(load.skipped[1].row_number, 3);
    assert!(load.skipped[1].reason.contains("EXTREME"));

    let csv = "cleaned_words,mod_categories\nkill,[]\n";
    let load = KeywordDictionary::load_csv(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap();
    assert!(load.rules.is_empty());
    assert_eq!(load.skipped_rows, 1);
}

/// Test that a source without the phrase column is a configuration error
#[test]
fn test_loadCsv_withoutPhraseColumn_shouldFail() {
    let csv = "keyword,mod_categories,mod_critical\nkill,[],HIGH\n";
    let err = KeywordDictionary::load_csv(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap_err();
    assert!(matches!(err, ModerationError::Configuration(_)));
    assert_eq!(err.kind(), "ConfigurationError");
}

/// Test that a header-only source yields an empty rule set
#[test]
fn test_loadCsv_withHeaderOnly_shouldYieldEmptyRuleSet() {
    let csv = "cleaned_words,mod_categories,mod_critical\n";
    let load = KeywordDictionary::load_csv(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap();
    assert!(load.rules.is_empty());
    assert_eq!(load.skipped_rows, 0);
}

/// Test that the duplicate policy from the source configuration is applied
#[test]
fn test_loadCsv_withDuplicates_shouldApplyConfiguredPolicy() {
    let csv = "cleaned_words,mod_categories,mod_critical\nFight,['violence'],HIGH\nfight,['sports'],LOW\n";

    let highest = KeywordDictionary::load_csv(csv.as_bytes(), &KeywordSourceConfig::default()).unwrap();
    assert_eq!(highest.duplicate_rows, 1);
    assert_eq!(highest.rules.rules()[0].severity(), Severity::High);
    assert_eq!(
        highest.rules.rules()[0].categories(),
        &["violence".to_string(), "sports".to_string()]
    );

    let source = KeywordSourceConfig {
        duplicate_policy: DuplicatePolicy::LastRow,
        ..KeywordSourceConfig::default()
    };
    let last = KeywordDictionary::load_csv(csv.as_bytes(), &source).unwrap();
    assert_eq!(last.rules.rules()[0].severity(), Severity::Low);
    assert_eq!(last.rules.rules()[0].categories(), &["sports".to_string()]);
}

/// Test that a rule built directly rejects a blank phrase
#[test]
fn test_keywordRule_new_withBlankPhrase_shouldFailValidation() {
    let err = KeywordRule::new(" \t ", &["x"], Severity::Low).unwrap_err();
    assert!(matches!(err, ModerationError::Validation(_)));
}

/// Test that building a rule set merges phrases that normalize alike
#[test]
fn test_ruleSet_new_withEquivalentPhrases_shouldKeepFirstPosition() {
    let rules = RuleSet::new(vec![
        KeywordRule::new("Bad  Word", &["profanity"], Severity::Low).unwrap(),
        KeywordRule::new("kill", &["violence"], Severity::High).unwrap(),
        KeywordRule::new("bad word", &["insult"], Severity::Medium).unwrap(),
    ]);

    assert_eq!(rules.len(), 2);
    assert_eq!(rules.get(0).unwrap().phrase(), "bad word");
    assert_eq!(rules.get(0).unwrap().severity(), Severity::Medium);
    assert_eq!(rules.get(1).unwrap().phrase(), "kill");
    assert!(rules.get(2).is_none());
}
