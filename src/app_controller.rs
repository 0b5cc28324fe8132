use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_config::{Config, KeywordSourceConfig};
use crate::detector::{ProgressCallback, ScanProgress};
use crate::engine::ModerationEngine;
use crate::errors::ModerationError;
use crate::file_utils::FileManager;
use crate::job::{JobMetadata, JobSummary};
use crate::keywords::{DictionaryLoad, KeywordDictionary, RuleSet};

// @module: Application controller for transcript moderation

/// Outcome of a folder run
#[derive(Debug, Default)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub summaries: Vec<JobSummary>,
}

/// Main application controller.
///
/// Holds the configuration, the loaded rule set and one engine; cloning is
/// cheap and every clone shares the same compiled automaton.
#[derive(Clone)]
pub struct Controller {
    // @field: App configuration
    config: Arc<Config>,
    // @field: Engine with its automaton cache
    engine: Arc<ModerationEngine>,
    // @field: Rules loaded from the keyword source
    rules: Arc<RuleSet>,
}

impl Controller {
    // @method: Create a controller, loading keywords from the configured source
    pub fn with_config(config: Config) -> Result<Self> {
        let load = Self::load_keywords(&config.keywords)?;
        info!(
            "Loaded {} keywords ({} single words, {} phrases)",
            load.rules.len(),
            load.rules.single_word_count(),
            load.rules.phrase_count()
        );
        if load.skipped_rows > 0 {
            warn!("Skipped {} malformed keyword rows", load.skipped_rows);
        }
        if load.duplicate_rows > 0 {
            warn!(
                "Merged {} duplicate keyword rows ({})",
                load.duplicate_rows, config.keywords.duplicate_policy
            );
        }
        Ok(Self::with_rules(config, load.rules))
    }

    /// Create a controller around an already loaded rule set
    pub fn with_rules(config: Config, rules: RuleSet) -> Self {
        let engine = ModerationEngine::from_config(&config);
        let started = Instant::now();
        let automaton = engine.compile(&rules);
        info!(
            "Aho-Corasick automaton built with {} patterns in {:.2?}",
            automaton.pattern_count(),
            started.elapsed()
        );

        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            rules: Arc::new(rules),
        }
    }

    /// Load the keyword dictionary named by `source`
    pub fn load_keywords(source: &KeywordSourceConfig) -> Result<DictionaryLoad> {
        if source.path.trim().is_empty() {
            return Err(ModerationError::Configuration("no keyword source configured".to_string()).into());
        }

        let file = File::open(&source.path).map_err(|e| {
            ModerationError::Configuration(format!("Failed to open keyword file {}: {}", source.path, e))
        })?;

        let load = KeywordDictionary::load_csv(BufReader::new(file), source)?;
        Ok(load)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Moderate one transcript file and store its report.
    ///
    /// Returns `None` when a report for the job already exists and
    /// `force_overwrite` is off.
    pub fn moderate_file(
        &self,
        input_file: &Path,
        job: &JobMetadata,
        force_overwrite: bool,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Option<JobSummary>> {
        job.validate()?;
        let output_path = FileManager::report_path(&self.config.output_dir, &job.job_id);
        if output_path.exists() && !force_overwrite {
            warn!(
                "Skipping {}, report already exists at {} (use -f to force overwrite)",
                input_file.display(),
                output_path.display()
            );
            return Ok(None);
        }

        let started = Instant::now();
        let content = FileManager::read_to_string(input_file)?;
        debug!("Read transcript {} in {:.2?}", input_file.display(), started.elapsed());

        let report = self
            .engine
            .process(&content, &self.rules, job, progress)
            .with_context(|| format!("Failed to moderate {}", input_file.display()))?;

        if report.diagnostics.skipped_blocks > 0 {
            warn!(
                "{}: skipped {} malformed cue blocks",
                input_file.display(),
                report.diagnostics.skipped_blocks
            );
        }

        let json = report
            .to_json_pretty()
            .context("Failed to serialize moderation report")?;
        FileManager::write_to_file(&output_path, &json)?;

        let summary = JobSummary::completed(&report, &output_path.display().to_string());
        info!(
            "{}: {} utterances, {} violations, score {}, highest {} ({:.2?})",
            report.job_id,
            report.total_utterances,
            report.total_violations,
            report.compound_severity_score,
            report.highest_severity_level,
            started.elapsed()
        );

        Ok(Some(summary))
    }

    /// Moderate a single file with a progress bar
    pub fn run(
        &self,
        input_file: &Path,
        job_id: Option<String>,
        transcript_url: Option<String>,
        force_overwrite: bool,
    ) -> Result<Option<JobSummary>> {
        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let job_id = job_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let job = match transcript_url {
            Some(url) => JobMetadata::for_s3(&job_id, &url)?,
            None => JobMetadata::for_local(&job_id, input_file)?,
        };
        info!("Processing job_id: {}", job.job_id);

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(Self::progress_style("utterances"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar.set_message("Scanning transcript");

        let mut on_progress = |progress: &ScanProgress| {
            progress_bar.set_length(progress.total as u64);
            progress_bar.set_position(progress.processed as u64);
            info!("{}", progress);
        };

        let result = self.moderate_file(input_file, &job, force_overwrite, Some(&mut on_progress));
        progress_bar.finish_and_clear();
        result
    }

    /// Moderate every transcript under `input_dir`.
    ///
    /// Files run in parallel on the blocking pool, sharing one automaton.
    /// A failing file is logged and counted; it does not stop the run.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let files = FileManager::find_transcripts(&input_dir)?;
        if files.is_empty() {
            warn!("No transcripts (.vtt/.srt) found in {:?}", input_dir);
            return Ok(FolderSummary::default());
        }
        info!("Found {} transcripts in {:?}", files.len(), input_dir);

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        folder_pb.set_style(Self::progress_style("files"));
        folder_pb.set_message("Moderating transcripts");

        let outcomes = stream::iter(files.into_iter().map(|path| {
            let controller = self.clone();
            let job_id = Self::job_id_for(&input_dir, &path);
            let folder_pb = folder_pb.clone();
            async move {
                let task_path = path.clone();
                let outcome = tokio::task::spawn_blocking(move || -> Result<Option<JobSummary>> {
                    let job = JobMetadata::for_local(&job_id, &task_path)?;
                    controller.moderate_file(&task_path, &job, force_overwrite, None)
                })
                .await
                .map_err(|e| anyhow!("Moderation task panicked: {}", e))
                .and_then(|result| result);
                folder_pb.inc(1);
                (path, outcome)
            }
        }))
        .buffer_unordered(self.config.concurrent_jobs)
        .collect::<Vec<_>>()
        .await;

        folder_pb.finish_and_clear();

        let mut summary = FolderSummary::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(Some(job_summary)) => {
                    summary.processed += 1;
                    summary.summaries.push(job_summary);
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing {}: {:#}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }
        summary.summaries.sort_by(|a, b| a.job_id.cmp(&b.job_id));

        info!(
            "Finished: {} moderated, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        );

        Ok(summary)
    }

    /// Stable job id for a transcript in folder mode: its path relative to
    /// the folder, without extension, with separators replaced by `_`.
    pub fn job_id_for(root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("_");
        if id.is_empty() { "transcript".to_string() } else { id }
    }

    fn progress_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }
}
