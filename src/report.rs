/*!
 * The moderation report and its JSON wire shape.
 *
 * Field names are fixed by downstream consumers; keep them stable.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detector::Violation;
use crate::severity::{Severity, SeverityLevel};

/// Compact violation entry inside a category bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlag {
    pub keyword: String,
    pub speaker: String,
    pub timestamp: String,
    pub severity: Severity,
}

impl From<&Violation> for CategoryFlag {
    fn from(violation: &Violation) -> Self {
        Self {
            keyword: violation.keyword.clone(),
            speaker: violation.speaker.clone(),
            timestamp: violation.timestamp.clone(),
            severity: violation.severity,
        }
    }
}

/// Per-category aggregation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub count: usize,
    pub violations: Vec<CategoryFlag>,
    pub speakers: Vec<String>,
}

/// Counters that are useful to the caller but not part of the wire format
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportDiagnostics {
    pub skipped_blocks: usize,
    pub rule_count: usize,
}

/// Result of one moderation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationReport {
    pub job_id: String,
    pub transcript_file: String,
    pub transcript_s3_url: Option<String>,
    /// ISO-8601, UTC
    pub processed_at: String,
    pub total_utterances: usize,
    pub total_violations: usize,
    pub compound_severity_score: u64,
    pub highest_severity_level: SeverityLevel,
    pub violations: Vec<Violation>,
    pub speakers_with_violations: Vec<String>,
    pub category_report: BTreeMap<String, CategoryBucket>,
    #[serde(skip)]
    pub diagnostics: ReportDiagnostics,
}

impl ModerationReport {
    pub fn is_safe(&self) -> bool {
        self.highest_severity_level == SeverityLevel::Safe
    }

    /// Pretty JSON with two-space indentation; non-ASCII text is kept as is
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
