/*!
 * Cue-based transcript parsing.
 *
 * Reads WebVTT exports (and header-less SRT-style files) into an ordered
 * list of utterances, one per cue block. Malformed blocks are skipped and
 * counted; only input with no recognizable cue structure at all is an error.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ModerationError;
use crate::normalize::normalize_phrase;

/// Speaker used when a cue carries no speaker prefix
pub const UNKNOWN_SPEAKER: &str = "Unknown";

const HEADER_MARKER: &str = "WEBVTT";

// @const: Cue timing line, e.g. `00:01:02.500 --> 00:01:04.000 align:start`
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})(?:\s.*)?$").unwrap()
});

// @const: `Name: text` speaker prefix
static SPEAKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:\d][^:]{0,63}):(.*)$").unwrap()
});

// @const: WebVTT voice span `<v Name>` / `<v.loud Name>`
static VOICE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<v(?:\.[^\s>]*)?\s+([^>]+)>").unwrap()
});

// @const: Any cue markup tag
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]*>").unwrap()
});

/// One spoken cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// 1-based position in transcript order
    pub index: usize,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub speaker: String,
    pub raw_text: String,
    pub normalized_text: String,
}

/// Parser output
#[derive(Debug, Clone, Default)]
pub struct ParsedTranscript {
    pub utterances: Vec<Utterance>,
    /// Blocks dropped for lacking a usable timing line or text
    pub skipped_blocks: usize,
    /// Whether a `WEBVTT` header was present
    pub had_header: bool,
}

/// Transcript parser
pub struct TranscriptParser;

impl TranscriptParser {
    /// Parse transcript text into utterances.
    ///
    /// Output order is the order of the cue blocks in the source; nothing is
    /// re-sorted by time.
    pub fn parse(content: &str) -> Result<ParsedTranscript, ModerationError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        if content.trim().is_empty() {
            return Err(ModerationError::Parse("transcript is empty".to_string()));
        }

        if content.contains('\0') {
            return Err(ModerationError::Parse(
                "transcript contains binary data".to_string(),
            ));
        }

        let normalized_newlines = strip_control_chars(&content.replace("\r\n", "\n").replace('\r', "\n"));
        let blocks = split_blocks(&normalized_newlines);

        let had_header = blocks
            .first()
            .and_then(|block| block.first())
            .is_some_and(|line| line.trim_start().starts_with(HEADER_MARKER));

        if !had_header && !normalized_newlines.contains("-->") {
            return Err(ModerationError::Parse(
                "no WEBVTT header or cue timing lines found".to_string(),
            ));
        }

        let mut parsed = ParsedTranscript {
            had_header,
            ..Default::default()
        };

        for (block_number, block) in blocks.iter().enumerate() {
            let block: &[&str] = if block_number == 0 && had_header {
                // Header lines may run straight into the first cue
                match block.iter().position(|line| line.contains("-->")) {
                    Some(timing_at) => &block[timing_at..],
                    None => continue,
                }
            } else {
                block
            };
            if is_metadata_block(block) {
                continue;
            }

            match parse_block(block, parsed.utterances.len() + 1) {
                Ok(utterance) => parsed.utterances.push(utterance),
                Err(reason) => {
                    warn!("Skipping cue block {}: {}", block_number + 1, reason);
                    parsed.skipped_blocks += 1;
                }
            }
        }

        debug!(
            "Parsed {} utterances ({} blocks skipped)",
            parsed.utterances.len(),
            parsed.skipped_blocks
        );

        Ok(parsed)
    }

    /// Parse a `[HH:]MM:SS.mmm` (or `,mmm`) timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, String> {
        let timestamp = timestamp.trim();
        let (clock, millis) = timestamp
            .rsplit_once(['.', ','])
            .ok_or_else(|| format!("Invalid timestamp format: {}", timestamp))?;

        let millis: u64 = parse_component(millis, 3, timestamp)?;
        let parts: Vec<&str> = clock.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [h, m, s] => (h.parse::<u64>().map_err(|_| format!("Invalid hours in timestamp: {}", timestamp))?, *m, *s),
            [m, s] => (0, *m, *s),
            _ => return Err(format!("Invalid timestamp format: {}", timestamp)),
        };
        let minutes: u64 = parse_component(minutes, 2, timestamp)?;
        let seconds: u64 = parse_component(seconds, 2, timestamp)?;

        if minutes >= 60 || seconds >= 60 {
            return Err(format!("Invalid time components in timestamp: {}", timestamp));
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(|| format!("Timestamp out of range: {}", timestamp))
    }
}

fn parse_component(value: &str, max_digits: usize, timestamp: &str) -> Result<u64, String> {
    if value.is_empty() || value.len() > max_digits || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("Invalid timestamp format: {}", timestamp));
    }
    value
        .parse()
        .map_err(|_| format!("Invalid timestamp format: {}", timestamp))
}

/// Stray C0 control characters become spaces; line structure is kept
fn strip_control_chars(content: &str) -> String {
    let stray = content.chars().filter(|c| is_stray_control(*c)).count();
    if stray == 0 {
        return content.to_string();
    }
    debug!("Replaced {} control characters in transcript", stray);
    content
        .chars()
        .map(|c| if is_stray_control(c) { ' ' } else { c })
        .collect()
}

fn is_stray_control(c: char) -> bool {
    c < '\u{20}' && !matches!(c, '\n' | '\t')
}

/// Split into blocks separated by one or more blank lines
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// NOTE, STYLE and REGION blocks carry no speech
fn is_metadata_block(block: &[&str]) -> bool {
    let first = block.first().map(|l| l.trim()).unwrap_or_default();
    if first.contains("-->") {
        return false;
    }
    ["NOTE", "STYLE", "REGION"].iter().any(|keyword| {
        first == *keyword
            || first
                .strip_prefix(keyword)
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

fn parse_block(block: &[&str], index: usize) -> Result<Utterance, String> {
    // Timing is on the first line, or on the second after a cue identifier
    let timing_at = if block[0].contains("-->") {
        0
    } else if block.len() > 1 && block[1].contains("-->") {
        1
    } else {
        return Err("no timing line".to_string());
    };

    let timing_line = block[timing_at];
    let caps = TIMING_REGEX
        .captures(timing_line)
        .ok_or_else(|| format!("malformed timing line '{}'", timing_line.trim()))?;
    let start_timestamp = caps[1].to_string();
    let end_timestamp = caps[2].to_string();
    let start_ms = TranscriptParser::parse_timestamp(&start_timestamp)?;
    let end_ms = TranscriptParser::parse_timestamp(&end_timestamp)?;

    let (speaker, raw_text) = collect_text(&block[timing_at + 1..]);
    if raw_text.is_empty() {
        return Err("cue has no text".to_string());
    }

    Ok(Utterance {
        index,
        start_timestamp,
        end_timestamp,
        start_ms,
        end_ms,
        speaker: speaker.unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
        normalized_text: normalize_phrase(&raw_text),
        raw_text,
    })
}

/// Join the text lines of a cue and work out who is speaking
fn collect_text(lines: &[&str]) -> (Option<String>, String) {
    let mut speaker: Option<String> = None;
    let mut voice: Option<String> = None;
    let mut parts: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        if voice.is_none() {
            voice = VOICE_TAG_REGEX
                .captures(line)
                .map(|caps| caps[1].trim().to_string())
                .filter(|name| !name.is_empty());
        }

        let stripped = TAG_REGEX.replace_all(line, "");
        let stripped = stripped.trim();
        if stripped.is_empty() {
            continue;
        }

        let text = match split_speaker(stripped) {
            Some((name, rest)) if speaker.is_none() => {
                speaker = Some(name.to_string());
                rest
            }
            Some((name, rest)) if speaker.as_deref() == Some(name) => rest,
            _ => stripped,
        };

        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    (speaker.or(voice), parts.join(" "))
}

/// Split `Name: text` into its parts
fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let caps = SPEAKER_REGEX.captures(line)?;
    let name = caps.get(1)?.as_str().trim();
    let rest = caps.get(2)?.as_str();
    if name.is_empty() || rest.starts_with("//") {
        return None;
    }
    Some((name, rest.trim()))
}
