/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;

use chaperone::file_utils::{FileManager, REPORT_FILE_NAME};

use crate::common;

/// Test that file_exists distinguishes files from missing paths and directories
#[test]
fn test_fileExists_shouldOnlyAcceptFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.vtt", "WEBVTT\n")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.vtt")));

    Ok(())
}

/// Test that report paths follow the `<dir>/<job_id>/rules_result.json` layout
#[test]
fn test_reportPath_shouldNestByJobId() {
    let path = FileManager::report_path("/tmp/results", "job-42");
    assert_eq!(path, Path::new("/tmp/results/job-42").join(REPORT_FILE_NAME));
    assert!(path.ends_with("job-42/rules_result.json"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_writeToFile_withMissingParents_shouldCreateThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("deep").join("er").join("report.json");

    FileManager::write_to_file(&target, "{}")?;

    assert_eq!(std::fs::read_to_string(&target)?, "{}");
    Ok(())
}

/// Test that invalid UTF-8 is replaced instead of failing the read
#[test]
fn test_readToString_withInvalidUtf8_shouldReplaceBytes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("latin1.vtt");
    std::fs::write(&path, b"WEBVTT\n\ncaf\xe9\n")?;

    let content = FileManager::read_to_string(&path)?;
    assert!(content.starts_with("WEBVTT"));
    assert!(content.contains('\u{fffd}'));
    Ok(())
}

/// Test that reading a missing file reports the path
#[test]
fn test_readToString_withMissingFile_shouldFail() {
    let err = FileManager::read_to_string("definitely/not/here.vtt").unwrap_err();
    assert!(err.to_string().contains("definitely/not/here.vtt"));
}

/// Test transcript extension detection
#[test]
fn test_isTranscriptFile_shouldMatchVttAndSrtIgnoringCase() {
    assert!(FileManager::is_transcript_file("meeting.vtt"));
    assert!(FileManager::is_transcript_file("MEETING.VTT"));
    assert!(FileManager::is_transcript_file("clip.srt"));
    assert!(!FileManager::is_transcript_file("notes.txt"));
    assert!(!FileManager::is_transcript_file("vtt"));
}

/// Test that find_transcripts walks subdirectories and sorts the result
#[test]
fn test_findTranscripts_shouldRecurseAndSort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.vtt", "WEBVTT\n")?;
    common::create_test_file(temp_dir.path(), "a.srt", "1\n")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "ignored")?;
    common::create_test_file(temp_dir.path(), "day2/c.vtt", "WEBVTT\n")?;

    let found = FileManager::find_transcripts(temp_dir.path())?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().display().to_string())
        .collect();

    assert_eq!(names, vec!["a.srt", "b.vtt", "day2/c.vtt"]);
    Ok(())
}

/// Test that ensure_dir is idempotent
#[test]
fn test_ensureDir_calledTwice_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().join("results");

    FileManager::ensure_dir(&dir)?;
    FileManager::ensure_dir(&dir)?;

    assert!(dir.is_dir());
    Ok(())
}
