/*!
 * Violation detection.
 *
 * Runs the compiled automaton over each utterance and turns every accepted
 * match into a `Violation`. Violations come out in utterance order, then in
 * match order within the utterance.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::app_config::MatchingConfig;
use crate::automaton::PatternAutomaton;
use crate::errors::ModerationError;
use crate::keywords::RuleSet;
use crate::severity::Severity;
use crate::transcript::Utterance;

/// One keyword occurrence in one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub keyword: String,
    pub speaker: String,
    #[serde(rename = "text")]
    pub utterance_text: String,
    pub timestamp: String,
    pub categories: Vec<String>,
    pub severity: Severity,
}

/// Snapshot handed to the progress callback
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub rate_per_sec: f64,
    pub estimated_remaining: Duration,
}

impl ScanProgress {
    fn sample(processed: usize, total: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let rate_per_sec = if secs > 0.0 { processed as f64 / secs } else { 0.0 };
        let remaining = total.saturating_sub(processed);
        let estimated_remaining = if rate_per_sec > 0.0 {
            Duration::from_secs_f64(remaining as f64 / rate_per_sec)
        } else {
            Duration::ZERO
        };
        Self {
            processed,
            total,
            elapsed,
            rate_per_sec,
            estimated_remaining,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 * 100.0 / self.total as f64
        }
    }
}

impl std::fmt::Display for ScanProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Progress: {}/{} utterances processed ({:.1}%) - Rate: {:.1} utterances/sec - Est. remaining: {:.1} seconds",
            self.processed,
            self.total,
            self.percent(),
            self.rate_per_sec,
            self.estimated_remaining.as_secs_f64()
        )
    }
}

/// Progress hook; observes the scan, never influences it
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&ScanProgress);

/// Matches utterances against a compiled rule set
pub struct ViolationDetector<'a> {
    automaton: &'a PatternAutomaton,
    rules: &'a RuleSet,
    matching: MatchingConfig,
    progress_interval: Duration,
}

impl<'a> ViolationDetector<'a> {
    /// The automaton must have been compiled from `rules`
    pub fn new(
        automaton: &'a PatternAutomaton,
        rules: &'a RuleSet,
        matching: MatchingConfig,
    ) -> Result<Self, ModerationError> {
        if automaton.pattern_count() != rules.len() {
            return Err(ModerationError::Validation(format!(
                "automaton has {} patterns but the rule set has {} rules",
                automaton.pattern_count(),
                rules.len()
            )));
        }

        Ok(Self {
            automaton,
            rules,
            matching,
            progress_interval: Duration::from_secs(10),
        })
    }

    /// Minimum wall-clock time between two progress callbacks
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Scan every utterance in order
    pub fn detect(&self, utterances: &[Utterance], mut progress: Option<ProgressCallback<'_>>) -> Vec<Violation> {
        let started = Instant::now();
        let mut last_report = started;
        let mut violations = Vec::new();

        for (i, utterance) in utterances.iter().enumerate() {
            violations.extend(self.detect_utterance(utterance));

            if let Some(callback) = progress.as_deref_mut() {
                let now = Instant::now();
                if now.duration_since(last_report) >= self.progress_interval {
                    callback(&ScanProgress::sample(i + 1, utterances.len(), now.duration_since(started)));
                    last_report = now;
                }
            }
        }

        debug!(
            "Scanned {} utterances in {:.2?}, {} violations",
            utterances.len(),
            started.elapsed(),
            violations.len()
        );

        violations
    }

    /// Violations found in a single utterance
    pub fn detect_utterance(&self, utterance: &Utterance) -> Vec<Violation> {
        self.automaton
            .find_accepted(&utterance.normalized_text, &self.matching)
            .into_iter()
            .filter_map(|m| self.rules.get(m.rule_index))
            .map(|rule| Violation {
                keyword: rule.phrase().to_string(),
                speaker: utterance.speaker.clone(),
                utterance_text: utterance.raw_text.clone(),
                timestamp: utterance.start_timestamp.clone(),
                categories: rule.categories().to_vec(),
                severity: rule.severity(),
            })
            .collect()
    }
}
