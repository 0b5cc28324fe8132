/*!
 * Job metadata carried into the report header, and the summary handed back
 * to whoever submitted the job.
 */

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ModerationError;
use crate::report::ModerationReport;
use crate::severity::SeverityLevel;

/// A parsed `s3://bucket/key` location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    pub fn parse(url: &str) -> Result<Self, ModerationError> {
        let path = url
            .strip_prefix("s3://")
            .ok_or_else(|| ModerationError::Validation(format!("Invalid S3 URL format: {}", url)))?;

        match path.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ModerationError::Validation(format!("Invalid S3 URL format: {}", url))),
        }
    }
}

impl std::fmt::Display for S3Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Identifies the job a report belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMetadata {
    pub job_id: String,
    pub transcript_file: String,
    pub transcript_s3_url: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl JobMetadata {
    /// Job whose transcript lives in object storage; the file is the object key
    pub fn for_s3(job_id: &str, transcript_s3_url: &str) -> Result<Self, ModerationError> {
        let location = S3Location::parse(transcript_s3_url)?;
        let job = Self {
            job_id: job_id.trim().to_string(),
            transcript_file: location.key,
            transcript_s3_url: Some(transcript_s3_url.to_string()),
            processed_at: Utc::now(),
        };
        job.validate()?;
        Ok(job)
    }

    /// Job for a transcript on the local filesystem
    pub fn for_local(job_id: &str, path: &Path) -> Result<Self, ModerationError> {
        let transcript_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let job = Self {
            job_id: job_id.trim().to_string(),
            transcript_file,
            transcript_s3_url: None,
            processed_at: Utc::now(),
        };
        job.validate()?;
        Ok(job)
    }

    /// Placeholder metadata for library callers that only want the analysis
    pub fn adhoc() -> Self {
        Self {
            job_id: "adhoc".to_string(),
            transcript_file: String::new(),
            transcript_s3_url: None,
            processed_at: Utc::now(),
        }
    }

    /// Pin the processing time, e.g. for reproducible output
    pub fn with_processed_at(mut self, processed_at: DateTime<Utc>) -> Self {
        self.processed_at = processed_at;
        self
    }

    pub fn validate(&self) -> Result<(), ModerationError> {
        if self.job_id.trim().is_empty() {
            return Err(ModerationError::Validation("job_id is required".to_string()));
        }
        // The id names the report directory under the output root
        if matches!(self.job_id.as_str(), "." | "..") || self.job_id.contains(['/', '\\']) {
            return Err(ModerationError::Validation(format!(
                "job_id '{}' must not contain path separators or be '.'/'..'",
                self.job_id
            )));
        }
        Ok(())
    }

    pub fn processed_at_iso(&self) -> String {
        self.processed_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Short outcome returned to the submitter once the report is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub message: String,
    pub job_id: String,
    pub output_location: String,
    pub total_violations: usize,
    pub highest_severity: SeverityLevel,
}

impl JobSummary {
    pub fn completed(report: &ModerationReport, output_location: &str) -> Self {
        Self {
            message: "Moderation completed successfully".to_string(),
            job_id: report.job_id.clone(),
            output_location: output_location.to_string(),
            total_violations: report.total_violations,
            highest_severity: report.highest_severity_level,
        }
    }
}
