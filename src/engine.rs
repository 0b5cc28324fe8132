/*!
 * Moderation engine: transcript + rule set in, report out.
 *
 * The pipeline is Build → Parse → Detect → Aggregate with no hidden state
 * apart from the engine's own automaton cache. The cache is keyed by the
 * rule set fingerprint and only ever holds read-only automatons, so one
 * engine can serve concurrent `process` calls from several threads.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregator::SeverityAggregator;
use crate::app_config::{Config, MatchingConfig};
use crate::automaton::PatternAutomaton;
use crate::detector::{ProgressCallback, ViolationDetector};
use crate::errors::ModerationError;
use crate::job::JobMetadata;
use crate::keywords::RuleSet;
use crate::report::{ModerationReport, ReportDiagnostics};
use crate::transcript::TranscriptParser;

/// Reusable moderation engine
pub struct ModerationEngine {
    matching: MatchingConfig,
    progress_interval: Duration,
    cache: RwLock<HashMap<String, Arc<PatternAutomaton>>>,
}

impl Default for ModerationEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default(), Duration::from_secs(10))
    }
}

impl ModerationEngine {
    pub fn new(matching: MatchingConfig, progress_interval: Duration) -> Self {
        Self {
            matching,
            progress_interval,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.matching, config.progress_interval())
    }

    /// Compiled automaton for `rules`, built on first use
    pub fn compile(&self, rules: &RuleSet) -> Arc<PatternAutomaton> {
        let fingerprint = rules.fingerprint();

        if let Some(automaton) = self.cache.read().get(&fingerprint) {
            debug!("Automaton cache hit for rule set {}", &fingerprint[..12]);
            return Arc::clone(automaton);
        }

        let started = Instant::now();
        let automaton = Arc::new(PatternAutomaton::build(rules));
        debug!(
            "Built automaton with {} patterns and {} nodes in {:.2?}",
            automaton.pattern_count(),
            automaton.node_count(),
            started.elapsed()
        );

        let mut cache = self.cache.write();
        Arc::clone(cache.entry(fingerprint).or_insert(automaton))
    }

    /// Number of cached automatons
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    /// Moderate one transcript.
    ///
    /// Either returns a complete report or exactly one error; the progress
    /// callback only observes the scan.
    pub fn process(
        &self,
        transcript: &str,
        rules: &RuleSet,
        job: &JobMetadata,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ModerationReport, ModerationError> {
        if transcript.trim().is_empty() {
            return Err(ModerationError::Validation("transcript text is required".to_string()));
        }
        job.validate()?;

        let automaton = self.compile(rules);

        let started = Instant::now();
        let parsed = TranscriptParser::parse(transcript)?;
        debug!("Parsed {} utterances in {:.2?}", parsed.utterances.len(), started.elapsed());

        let detector = ViolationDetector::new(&automaton, rules, self.matching)?
            .with_progress_interval(self.progress_interval);
        let violations = detector.detect(&parsed.utterances, progress);

        let started = Instant::now();
        let aggregate = SeverityAggregator::aggregate(&violations);
        debug!("Aggregated {} violations in {:.2?}", violations.len(), started.elapsed());

        Ok(ModerationReport {
            job_id: job.job_id.clone(),
            transcript_file: job.transcript_file.clone(),
            transcript_s3_url: job.transcript_s3_url.clone(),
            processed_at: job.processed_at_iso(),
            total_utterances: parsed.utterances.len(),
            total_violations: violations.len(),
            compound_severity_score: aggregate.compound_severity_score,
            highest_severity_level: aggregate.highest_severity_level,
            violations,
            speakers_with_violations: aggregate.speakers_with_violations,
            category_report: aggregate.category_report,
            diagnostics: ReportDiagnostics {
                skipped_blocks: parsed.skipped_blocks,
                rule_count: rules.len(),
            },
        })
    }
}

/// Moderate a transcript with default options and ad-hoc job metadata
pub fn process(transcript: &str, rules: &RuleSet) -> Result<ModerationReport, ModerationError> {
    ModerationEngine::default().process(transcript, rules, &JobMetadata::adhoc(), None)
}
