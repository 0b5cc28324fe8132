/*!
 * Tests for severity aggregation
 */

use chaperone::aggregator::SeverityAggregator;
use chaperone::detector::Violation;
use chaperone::severity::{Severity, SeverityLevel};

fn violation(keyword: &str, speaker: &str, timestamp: &str, categories: &[&str], severity: Severity) -> Violation {
    Violation {
        keyword: keyword.to_string(),
        speaker: speaker.to_string(),
        utterance_text: format!("they said {}", keyword),
        timestamp: timestamp.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        severity,
    }
}

/// Test that repeated violations are each counted in the score
#[test]
fn test_compoundScore_withRepeats_shouldCountEachOccurrence() {
    let violations: Vec<Violation> = (0..3)
        .map(|i| violation("kill", "Ann", &format!("00:00:0{}.000", i), &["violence"], Severity::High))
        .collect();

    assert_eq!(SeverityAggregator::compound_score(&violations), 30);
    assert_eq!(SeverityAggregator::category_report(&violations)["violence"].count, 3);
}

/// Test that the highest level is the maximum over all violations
#[test]
fn test_highestSeverity_shouldTakeMaximum() {
    let violations = vec![
        violation("a", "X", "00:00:01.000", &[], Severity::Low),
        violation("b", "X", "00:00:02.000", &[], Severity::Medium),
        violation("c", "X", "00:00:03.000", &[], Severity::Low),
    ];
    assert_eq!(SeverityAggregator::highest_severity(&violations), SeverityLevel::Medium);
    assert_eq!(SeverityAggregator::highest_severity(&[]), SeverityLevel::Safe);
}

/// Test that violations without categories are scored but not bucketed
#[test]
fn test_categoryReport_withUncategorizedViolation_shouldOnlyScoreIt() {
    let violations = vec![violation("jerk", "Ben", "00:00:01.000", &[], Severity::Medium)];
    let aggregate = SeverityAggregator::aggregate(&violations);

    assert_eq!(aggregate.compound_severity_score, 5);
    assert!(aggregate.category_report.is_empty());
    assert_eq!(aggregate.speakers_with_violations, vec!["Ben"]);
}

/// Test that bucket entries keep violation order and carry compact fields
#[test]
fn test_categoryReport_shouldKeepViolationOrderInBuckets() {
    let violations = vec![
        violation("slur", "Zed", "00:00:01.000", &["hate"], Severity::High),
        violation("idiot", "Amy", "00:00:02.000", &["insult", "hate"], Severity::Low),
    ];
    let report = SeverityAggregator::category_report(&violations);

    let keys: Vec<&str> = report.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["hate", "insult"]);

    let hate = &report["hate"];
    assert_eq!(hate.count, 2);
    assert_eq!(hate.violations[0].keyword, "slur");
    assert_eq!(hate.violations[1].timestamp, "00:00:02.000");
    assert_eq!(hate.violations[1].severity, Severity::Low);
    assert_eq!(hate.speakers, vec!["Amy", "Zed"]);

    for bucket in report.values() {
        assert_eq!(bucket.count, bucket.violations.len());
    }
}
