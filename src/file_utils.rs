use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities for the moderation binary

/// Extensions recognized as cue-based transcripts
const TRANSCRIPT_EXTENSIONS: [&str; 2] = ["vtt", "srt"];

/// File name of a stored report inside its job directory
pub const REPORT_FILE_NAME: &str = "rules_result.json";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a text file, replacing invalid UTF-8 sequences
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write text, creating parent directories first
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    // @generates: `<output_dir>/<job_id>/rules_result.json`
    pub fn report_path<P: AsRef<Path>>(output_dir: P, job_id: &str) -> PathBuf {
        output_dir.as_ref().join(job_id).join(REPORT_FILE_NAME)
    }

    /// Whether the path has a transcript extension (case-insensitive)
    pub fn is_transcript_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| TRANSCRIPT_EXTENSIONS.contains(&ext.as_str()))
    }

    /// All transcripts under `dir`, sorted for a stable processing order
    pub fn find_transcripts<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::is_transcript_file(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }
}
