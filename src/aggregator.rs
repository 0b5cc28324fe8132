/*!
 * Severity aggregation over a list of violations.
 */

use std::collections::{BTreeMap, BTreeSet};

use crate::detector::Violation;
use crate::report::{CategoryBucket, CategoryFlag};
use crate::severity::SeverityLevel;

/// Everything the report derives from the violation list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeverityAggregate {
    pub compound_severity_score: u64,
    pub highest_severity_level: SeverityLevel,
    pub speakers_with_violations: Vec<String>,
    pub category_report: BTreeMap<String, CategoryBucket>,
}

pub struct SeverityAggregator;

impl SeverityAggregator {
    pub fn aggregate(violations: &[Violation]) -> SeverityAggregate {
        SeverityAggregate {
            compound_severity_score: Self::compound_score(violations),
            highest_severity_level: Self::highest_severity(violations),
            speakers_with_violations: Self::speakers(violations),
            category_report: Self::category_report(violations),
        }
    }

    /// Sum of weights, repeats counted individually
    pub fn compound_score(violations: &[Violation]) -> u64 {
        violations.iter().map(|v| v.severity.weight()).sum()
    }

    /// SAFE when there is nothing to report
    pub fn highest_severity(violations: &[Violation]) -> SeverityLevel {
        violations
            .iter()
            .map(|v| SeverityLevel::from(v.severity))
            .max()
            .unwrap_or(SeverityLevel::Safe)
    }

    /// Distinct speakers, sorted
    pub fn speakers(violations: &[Violation]) -> Vec<String> {
        violations
            .iter()
            .map(|v| v.speaker.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One bucket per category; a violation lands in every category it carries
    pub fn category_report(violations: &[Violation]) -> BTreeMap<String, CategoryBucket> {
        let mut flags: BTreeMap<String, Vec<CategoryFlag>> = BTreeMap::new();
        let mut speakers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for violation in violations {
            for category in &violation.categories {
                flags
                    .entry(category.clone())
                    .or_default()
                    .push(CategoryFlag::from(violation));
                speakers
                    .entry(category.clone())
                    .or_default()
                    .insert(violation.speaker.clone());
            }
        }

        flags
            .into_iter()
            .map(|(category, violations)| {
                let speakers = speakers.remove(&category).unwrap_or_default().into_iter().collect();
                let bucket = CategoryBucket {
                    count: violations.len(),
                    violations,
                    speakers,
                };
                (category, bucket)
            })
            .collect()
    }
}
